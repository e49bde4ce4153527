// TXDIR - Transmission direction inference
// Copyright (C) 2024  txdir developers
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

//! TXDIR - Transmission direction inference
//!
//! This library and program estimates how often simple mutation-frequency heuristics point in the
//! right direction of transmission between a source and a recipient population. No phylogeny is
//! reconstructed: every source/recipient genome pair is split into a shared branch and two
//! private branches, and each mutation is annotated with its sampled frequency in both
//! populations.
//!
//! Heuristics
//!
//! * Tier 1: segregating sites on the shared branch
//! * Tier 2: cross-population segregation on the private branches
//! * Clumpiness: diversity of binned allele frequencies along both lineages
//! * Combined: any of the above
//!
//! # Getting started
//!
//! Population files contain one genome per line as comma separated integer mutation ids.
//! An empty line is a genome identical to the reference.
//!
//! ```bash
//! txdir analyze source_pop.csv recipient_pop.csv --sample-size 50 --combination-size 1 -o results
//!
//! txdir analyze source_pop.csv recipient_pop.csv --sample-size 50 --combination-size 3 \
//!   --trials 10000 --repetitions 5 --seed 7 -t 8 -o results
//!
//! txdir frequencies source_pop.csv --sample-size 50 -o results
//! ```
//!

/// Sampling and detection over source/recipient populations
pub mod analysis;

/// Analysis parameters
pub mod args;

/// Branch statistics
pub mod detect;

#[doc(hidden)]
pub mod error;

/// Genomes as sets of mutations
pub mod genome;

#[doc(hidden)]
pub mod io;

/// Populations and their sampled SNP frequencies
pub mod population;

/// Shared and private branches of a genome pair
pub mod tree;

#[doc(hidden)]
pub mod utils;

#[cfg(feature = "clap")]
pub mod clap;
