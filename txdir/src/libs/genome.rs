use std::str::FromStr;

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use serde::{Deserialize, Serialize};

use crate::error::TxError::MutationParseError;

/// Integer id of a single mutation (SNP)
pub type Mutation = i64;

/// A sampled individual described by its mutations relative to the reference.
///
/// Mutations are kept sorted so that two genomes compare equal whenever they carry the same
/// mutations, regardless of the order in which those were listed. Duplicate ids are kept.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Mutation>", into = "Vec<Mutation>")]
pub struct Genome {
    mutations: Vec<Mutation>,
}

impl Genome {
    pub fn new(mut mutations: Vec<Mutation>) -> Self {
        mutations.sort_unstable();
        Self { mutations }
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn contains(&self, mutation: Mutation) -> bool {
        self.mutations.binary_search(&mutation).is_ok()
    }

    /// False if an equal genome is found in the population besides the genome itself
    pub fn is_unique_in_population(&self, population: &[Genome]) -> bool {
        population.iter().filter(|genome| *genome == self).count() <= 1
    }

    /// Parse one line of a population file, `line_n` is only used for error reporting
    pub fn parse_line(line: &str, line_n: usize) -> Result<Self> {
        let line = line.trim().trim_matches(',');

        if line.is_empty() {
            return Ok(Self::default());
        }

        let mutations = line
            .split(',')
            .map(|token| {
                let token = token.trim();
                token
                    .parse::<Mutation>()
                    .wrap_err(eyre!(MutationParseError((line_n, token.into()))))
            })
            .collect::<Result<Vec<Mutation>>>()?;

        Ok(Self::new(mutations))
    }
}

impl From<Vec<Mutation>> for Genome {
    fn from(mutations: Vec<Mutation>) -> Self {
        Self::new(mutations)
    }
}

impl From<Genome> for Vec<Mutation> {
    fn from(genome: Genome) -> Self {
        genome.mutations
    }
}

impl FromStr for Genome {
    type Err = color_eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_line(s, 1)
    }
}

impl std::fmt::Display for Genome {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let line = self
            .mutations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<String>>()
            .join(",");
        write!(f, "{line}")
    }
}
