#![allow(dead_code)]
use std::path::PathBuf;

use txdir::{
    analysis::{Analysis, Results},
    args::AnalysisParams,
    genome::Genome,
    population::Population,
};

pub const SOURCE_POPULATION: &str = "tests/data/source_population.csv";
pub const RECIPIENT_POPULATION: &str = "tests/data/recipient_population.csv";
pub const INVALID_POPULATION: &str = "tests/data/invalid_population.csv";
pub const OUTDIR: &str = "tests/results";

pub fn outdir() -> PathBuf {
    let path = PathBuf::from(OUTDIR);
    std::fs::create_dir_all(&path).unwrap();
    path
}

/// Two sampled genomes per population with every tier firing on at least one pair
pub fn scenario_populations() -> (Population, Population) {
    let source = Population::from_sample(vec![
        Genome::new(vec![1, 2, 3, 4]),
        Genome::new(vec![1, 2, 5, 6]),
    ]);
    let recipient = Population::from_sample(vec![
        Genome::new(vec![1, 2, 3, 4, 5]),
        Genome::new(vec![1, 3, 5]),
    ]);
    (source, recipient)
}

pub fn scenario_params() -> AnalysisParams {
    AnalysisParams {
        sample_size: 2,
        combination_size: 1,
        num_bins: 10,
        ..Default::default()
    }
}

pub fn scenario_results() -> Results {
    let (source, recipient) = scenario_populations();
    let analysis = Analysis::new(source, recipient, scenario_params()).unwrap();
    analysis
        .perform_analysis(&mut txdir::utils::get_rng(Some(0)))
        .unwrap()
}

#[cfg(feature = "clap")]
pub fn silent_verbosity() -> txdir::clap::LogAndVerbosity {
    txdir::clap::LogAndVerbosity {
        verbosity: 1,
        log_file: None,
        silent: false,
    }
}
