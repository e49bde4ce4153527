use std::collections::BTreeMap;
use std::io::{self, BufRead};
use std::path::PathBuf;

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::TxError::EmptyPopulationError;
use crate::genome::{Genome, Mutation};
use crate::io::get_input;

/// Occurrences of a mutation in a sample
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Snp {
    pub count: usize,
    pub proportion: f64,
}

pub type SampleSnps = BTreeMap<Mutation, Snp>;

/// A population of genomes together with a sample drawn from it.
///
/// The SNP table always describes the current sample: every way of replacing the sample
/// recomputes it.
#[derive(Debug, Default, Clone)]
pub struct Population {
    population: Vec<Genome>,
    sample: Vec<Genome>,
    sample_snps: SampleSnps,
}

impl Population {
    /// Parse a population file and draw a sample of `sample_size` genomes from it
    pub fn from_csv_file<R: Rng + ?Sized>(
        path: PathBuf,
        sample_size: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let population = read_population_file(path)?;
        Self::from_genomes(population, sample_size, rng)
    }

    pub fn from_genomes<R: Rng + ?Sized>(
        population: Vec<Genome>,
        sample_size: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let sample = sample_population(&population, sample_size, rng)?;
        let sample_snps = get_sample_snps(&sample);
        Ok(Self {
            population,
            sample,
            sample_snps,
        })
    }

    /// Use the given genomes as both the population and the sample
    pub fn from_sample(sample: Vec<Genome>) -> Self {
        let sample_snps = get_sample_snps(&sample);
        Self {
            population: sample.clone(),
            sample,
            sample_snps,
        }
    }

    /// Replace the sample with a new draw from the population
    pub fn resample<R: Rng + ?Sized>(&mut self, sample_size: usize, rng: &mut R) -> Result<()> {
        self.sample = sample_population(&self.population, sample_size, rng)?;
        self.sample_snps = get_sample_snps(&self.sample);
        Ok(())
    }

    pub fn population(&self) -> &[Genome] {
        &self.population
    }

    pub fn sample(&self) -> &[Genome] {
        &self.sample
    }

    pub fn sample_snps(&self) -> &SampleSnps {
        &self.sample_snps
    }

    /// Sample frequency of a mutation, zero if the sample does not carry it
    pub fn proportion(&self, mutation: Mutation) -> f64 {
        self.sample_snps
            .get(&mutation)
            .map_or(0.0, |snp| snp.proportion)
    }
}

pub fn read_population_file(path: PathBuf) -> Result<Vec<Genome>> {
    let input = get_input(Some(path.clone()))?;
    let genomes = parse_population(io::BufReader::new(input))
        .wrap_err(eyre!("Failed to read population file {path:?}"))?;

    tracing::info!("Read {} genomes from {path:?}.", genomes.len());
    Ok(genomes)
}

/// One genome per line, an empty line is a genome without mutations
pub fn parse_population<R: BufRead>(reader: R) -> Result<Vec<Genome>> {
    reader
        .lines()
        .enumerate()
        .map(|(idx, line)| Genome::parse_line(&line?, idx + 1))
        .collect()
}

/// Draw `sample_size` genomes uniformly at random with replacement
pub fn sample_population<R: Rng + ?Sized>(
    population: &[Genome],
    sample_size: usize,
    rng: &mut R,
) -> Result<Vec<Genome>> {
    if sample_size == 0 {
        return Ok(vec![]);
    }

    (0..sample_size)
        .map(|_| {
            population
                .choose(rng)
                .cloned()
                .ok_or_else(|| eyre!(EmptyPopulationError))
        })
        .collect()
}

pub fn get_sample_snps(sample: &[Genome]) -> SampleSnps {
    let mut snps = SampleSnps::new();

    for mutation in sample.iter().flat_map(Genome::mutations) {
        snps.entry(*mutation).or_default().count += 1;
    }

    let sample_size = sample.len() as f64;
    for snp in snps.values_mut() {
        snp.proportion = snp.count as f64 / sample_size;
    }

    snps
}

/// Number of distinct genomes, each group of equal genomes is counted once
pub fn count_unique_genomes(genomes: &[Genome]) -> usize {
    genomes
        .iter()
        .enumerate()
        .filter(|(idx, genome)| !genomes[..*idx].contains(genome))
        .count()
}
