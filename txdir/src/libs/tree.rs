use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::genome::{Genome, Mutation};
use crate::population::Population;

/// Which population's sample frequency to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Source,
    Recipient,
}

/// Sample frequencies of one mutation in both populations
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Proportions {
    pub source: f64,
    pub recipient: f64,
}

impl Proportions {
    pub fn new(source: f64, recipient: f64) -> Self {
        Self { source, recipient }
    }

    pub fn side(&self, side: Side) -> f64 {
        match side {
            Side::Source => self.source,
            Side::Recipient => self.recipient,
        }
    }
}

pub type Branch = BTreeMap<Mutation, Proportions>;

/// Mutations of a genome pair before the frequencies are attached
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Branches {
    pub shared: BTreeSet<Mutation>,
    pub source: BTreeSet<Mutation>,
    pub recipient: BTreeSet<Mutation>,
}

/// Three disjoint branches of a source/recipient genome pair: the mutations both genomes carry
/// and the mutations private to either one.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub shared: Branch,
    pub source: Branch,
    pub recipient: Branch,
}

impl Tree {
    pub fn new(
        source_genome: &Genome,
        recipient_genome: &Genome,
        source_population: &Population,
        recipient_population: &Population,
    ) -> Self {
        let branches = categorize_mutations(source_genome, recipient_genome);
        assign_proportions(&branches, source_population, recipient_population)
    }

    pub fn from_branches(shared: Branch, source: Branch, recipient: Branch) -> Self {
        Self {
            shared,
            source,
            recipient,
        }
    }

    /// Shared branch extended with the private mutations of the source genome
    pub fn ancestral_to_source(&self) -> Branch {
        union(&self.shared, &self.source)
    }

    /// Shared branch extended with the private mutations of the recipient genome
    pub fn ancestral_to_recipient(&self) -> Branch {
        union(&self.shared, &self.recipient)
    }

    pub fn n_mutations(&self) -> usize {
        self.shared.len() + self.source.len() + self.recipient.len()
    }

    /// True if any branch is too small to carry a signal
    pub fn is_degenerate(&self) -> bool {
        [&self.shared, &self.source, &self.recipient]
            .iter()
            .any(|branch| branch.len() <= 1)
    }
}

fn union(a: &Branch, b: &Branch) -> Branch {
    a.iter().chain(b.iter()).map(|(k, v)| (*k, *v)).collect()
}

pub fn categorize_mutations(source_genome: &Genome, recipient_genome: &Genome) -> Branches {
    let source = source_genome
        .mutations()
        .iter()
        .copied()
        .collect::<BTreeSet<Mutation>>();
    let recipient = recipient_genome
        .mutations()
        .iter()
        .copied()
        .collect::<BTreeSet<Mutation>>();

    Branches {
        shared: source.intersection(&recipient).copied().collect(),
        source: source.difference(&recipient).copied().collect(),
        recipient: recipient.difference(&source).copied().collect(),
    }
}

pub fn assign_proportions(
    branches: &Branches,
    source_population: &Population,
    recipient_population: &Population,
) -> Tree {
    let annotate = |mutations: &BTreeSet<Mutation>| -> Branch {
        mutations
            .iter()
            .map(|&mutation| {
                let proportions = Proportions::new(
                    source_population.proportion(mutation),
                    recipient_population.proportion(mutation),
                );
                (mutation, proportions)
            })
            .collect()
    };

    Tree {
        shared: annotate(&branches.shared),
        source: annotate(&branches.source),
        recipient: annotate(&branches.recipient),
    }
}

/// Number of mutations polymorphic in the given side's sample, i.e. 0 < p < 1
pub fn count_segregating_snps(side: Side, branch: &Branch) -> usize {
    branch
        .values()
        .map(|proportions| proportions.side(side))
        .filter(|&p| p > 0.0 && p < 1.0)
        .count()
}
