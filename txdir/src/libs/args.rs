use std::path::PathBuf;

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use serde::{Deserialize, Deserializer, Serialize};

use crate::io::get_input;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct AnalysisParams {
    /// Number of genomes sampled with replacement from each population
    #[serde(rename = "sample size")]
    #[cfg_attr(feature = "clap", arg(short = 's', long, default_value_t = 50))]
    pub sample_size: usize,

    /// Genomes drawn per population for each trial, 1 evaluates every sampled pair
    #[serde(rename = "combination size", alias = "combination number", default = "default_combination_size")]
    #[cfg_attr(feature = "clap", arg(short = 'c', long, default_value_t = 1))]
    pub combination_size: usize,

    /// Number of allele frequency bins for clumpiness, 0 disables binning
    #[serde(rename = "number clumpiness bins", alias = "number bins", default)]
    #[cfg_attr(feature = "clap", arg(short = 'b', long = "bins", default_value_t = 10))]
    pub num_bins: usize,

    #[serde(default)]
    #[cfg_attr(feature = "clap", arg(long, value_enum, default_value_t = Diversity::GiniPurity))]
    pub diversity: Diversity,

    #[serde(default)]
    #[cfg_attr(feature = "clap", arg(long, value_enum, default_value_t = Binning::Inclusive))]
    pub binning: Binning,

    /// Number of Monte Carlo trials when the combination size is larger than one
    #[serde(default = "default_trials")]
    #[cfg_attr(feature = "clap", arg(long, default_value_t = 10_000))]
    pub trials: usize,

    /// Report the number of unique genomes in the populations and samples
    #[serde(rename = "count populations", default, deserialize_with = "bool_or_int")]
    #[cfg_attr(feature = "clap", arg(long))]
    pub count_populations: bool,

    /// Resample the populations and repeat the analysis n times
    #[serde(alias = "analysis repetitions", default = "default_repetitions")]
    #[cfg_attr(feature = "clap", arg(short = 'r', long, default_value_t = 1))]
    pub repetitions: usize,

    /// Seed for the random number generator
    #[serde(default)]
    #[cfg_attr(feature = "clap", arg(long))]
    pub seed: Option<u64>,
}

fn default_combination_size() -> usize {
    1
}

fn default_trials() -> usize {
    10_000
}

fn default_repetitions() -> usize {
    1
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolOrInt {
    Bool(bool),
    Int(i64),
}

// Flags may also be written as 0/1
fn bool_or_int<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    match BoolOrInt::deserialize(deserializer)? {
        BoolOrInt::Bool(b) => Ok(b),
        BoolOrInt::Int(0) => Ok(false),
        BoolOrInt::Int(1) => Ok(true),
        BoolOrInt::Int(v) => Err(serde::de::Error::custom(format!(
            "expected a boolean or 0/1, found {v}"
        ))),
    }
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            sample_size: 50,
            combination_size: default_combination_size(),
            num_bins: 10,
            diversity: Diversity::default(),
            binning: Binning::default(),
            trials: default_trials(),
            count_populations: false,
            repetitions: default_repetitions(),
            seed: None,
        }
    }
}

impl AnalysisParams {
    /// Read parameters from a JSON file keyed like `{"sample size": 50, "combination size": 1}`
    pub fn from_json_file(path: PathBuf) -> Result<Self> {
        let input = get_input(Some(path.clone()))?;
        serde_json::from_reader(input).wrap_err(eyre!("Failed to parse analysis parameters {path:?}"))
    }
}

/// Diversity measure over binned allele frequencies
#[derive(Serialize, Deserialize, Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum Diversity {
    #[default]
    /// One minus the share of same-bin pairs
    GiniPurity,
    /// Shannon entropy of the bin distribution
    Shannon,
}

impl std::fmt::Display for Diversity {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Self::GiniPurity => write!(f, "Gini purity"),
            Self::Shannon => write!(f, "Shannon entropy"),
        }
    }
}

/// How an allele frequency is assigned to a bin over (0, 1]
#[derive(Serialize, Deserialize, Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum Binning {
    #[default]
    /// Frequency 0 belongs to the lowest bin
    Inclusive,
    /// ceil(p / width) - 1, frequency 0 falls outside every bin and is not counted
    Ceiling,
}

impl std::fmt::Display for Binning {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Self::Inclusive => write!(f, "Inclusive"),
            Self::Ceiling => write!(f, "Ceiling"),
        }
    }
}
