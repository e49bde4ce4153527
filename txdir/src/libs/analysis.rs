use std::path::PathBuf;

use color_eyre::eyre::{ensure, eyre};
use color_eyre::Result;
use itertools::iproduct;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::args::AnalysisParams;
use crate::detect::{
    check_tier_1, check_tier_2, clumpiness_magnitude, clumpiness_tally, Clumpiness,
    CompositeClumpiness, Detection, Segregation,
};
use crate::error::TxError::{
    CombinationSizeError, SampleSizeError, TreeCountError, ZeroCombinationError,
};
use crate::genome::Genome;
use crate::population::{count_unique_genomes, read_population_file, sample_population, Population};
use crate::tree::Tree;
use crate::utils::{mean, proportion};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Statistic {
    Tier1,
    Tier2,
    Clumpiness,
    ClumpinessTally,
    ClumpinessMagnitude,
    Combined,
}

impl Statistic {
    pub const ALL: [Statistic; 6] = [
        Statistic::Tier1,
        Statistic::Tier2,
        Statistic::Clumpiness,
        Statistic::ClumpinessTally,
        Statistic::ClumpinessMagnitude,
        Statistic::Combined,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Statistic::Tier1 => "tier 1",
            Statistic::Tier2 => "tier 2",
            Statistic::Clumpiness => "clumpiness",
            Statistic::ClumpinessTally => "clumpiness tally",
            Statistic::ClumpinessMagnitude => "clumpiness magnitude",
            Statistic::Combined => "combined",
        }
    }
}

impl std::fmt::Display for Statistic {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Calls of every statistic for one trial, i.e. one genome pair or one combination of pairs
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialOutcome {
    pub tier_1: Detection,
    pub tier_2: Detection,
    pub clumpiness: Detection,
    pub clumpiness_tally: Detection,
    pub clumpiness_magnitude: Detection,
    pub combined: Detection,
}

impl TrialOutcome {
    /// Segregation tiers compare the largest counts over all trees, clumpiness is called if any
    /// tree calls it.
    pub fn from_trees(trees: &[Tree], clumpiness: &Clumpiness) -> Self {
        let tier_1 = Segregation::max(trees.iter().map(check_tier_1)).detection();
        let tier_2 = Segregation::max(trees.iter().map(check_tier_2)).detection();

        let composites = trees
            .iter()
            .map(|tree| clumpiness.check_clumpiness_composite(tree))
            .collect::<Vec<CompositeClumpiness>>();

        let composite = Detection::any(composites.iter().map(CompositeClumpiness::detection));

        Self {
            tier_1,
            tier_2,
            clumpiness: composite,
            clumpiness_tally: clumpiness_tally(&composites),
            clumpiness_magnitude: clumpiness_magnitude(&composites),
            combined: tier_1.or(tier_2).or(composite),
        }
    }

    pub fn get(&self, statistic: Statistic) -> Detection {
        match statistic {
            Statistic::Tier1 => self.tier_1,
            Statistic::Tier2 => self.tier_2,
            Statistic::Clumpiness => self.clumpiness,
            Statistic::ClumpinessTally => self.clumpiness_tally,
            Statistic::ClumpinessMagnitude => self.clumpiness_magnitude,
            Statistic::Combined => self.combined,
        }
    }
}

/// Per trial outcomes of one analysis run
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Results {
    outcomes: Vec<TrialOutcome>,
    trees: usize,
}

impl Results {
    pub fn push(&mut self, outcome: TrialOutcome, n_trees: usize) {
        self.outcomes.push(outcome);
        self.trees += n_trees;
    }

    pub fn merge(mut self, other: Results) -> Self {
        self.outcomes.extend(other.outcomes);
        self.trees += other.trees;
        self
    }

    pub fn outcomes(&self) -> &[TrialOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn trees(&self) -> usize {
        self.trees
    }

    pub fn detections(&self, statistic: Statistic) -> Vec<Detection> {
        self.outcomes.iter().map(|o| o.get(statistic)).collect()
    }

    pub fn proportions(&self, statistic: Statistic) -> DetectionProportions {
        let n = self.outcomes.len();
        let detections = self.detections(statistic);
        let count = |f: fn(&Detection) -> bool| detections.iter().filter(|d| f(d)).count();

        DetectionProportions {
            correct: proportion(count(|d| d.correct), n),
            reverse: proportion(count(|d| d.reverse), n),
            ambiguous: proportion(count(Detection::is_ambiguous), n),
        }
    }

    pub fn output(&self) -> AnalysisOutput {
        AnalysisOutput {
            tier_1: self.proportions(Statistic::Tier1),
            tier_2: self.proportions(Statistic::Tier2),
            clumpiness: self.proportions(Statistic::Clumpiness),
            clumpiness_tally: self.proportions(Statistic::ClumpinessTally),
            clumpiness_magnitude: self.proportions(Statistic::ClumpinessMagnitude),
            combined: self.proportions(Statistic::Combined),
            analyses: 1,
            trees: self.trees,
            unique_genomes: None,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionProportions {
    #[serde(rename = "correct detection proportion")]
    pub correct: f64,
    #[serde(rename = "reverse detection proportion")]
    pub reverse: f64,
    #[serde(rename = "ambiguous detection proportion")]
    pub ambiguous: f64,
}

impl DetectionProportions {
    pub fn mean(values: &[DetectionProportions]) -> Self {
        let field = |f: fn(&DetectionProportions) -> f64| {
            mean(&values.iter().map(f).collect::<Vec<f64>>())
        };
        Self {
            correct: field(|p| p.correct),
            reverse: field(|p| p.reverse),
            ambiguous: field(|p| p.ambiguous),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueGenomes {
    #[serde(rename = "source population")]
    pub source_population: usize,
    #[serde(rename = "source sample")]
    pub source_sample: usize,
    #[serde(rename = "recipient population")]
    pub recipient_population: usize,
    #[serde(rename = "recipient sample")]
    pub recipient_sample: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutput {
    #[serde(rename = "tier 1")]
    pub tier_1: DetectionProportions,
    #[serde(rename = "tier 2")]
    pub tier_2: DetectionProportions,
    pub clumpiness: DetectionProportions,
    #[serde(rename = "clumpiness tally")]
    pub clumpiness_tally: DetectionProportions,
    #[serde(rename = "clumpiness magnitude")]
    pub clumpiness_magnitude: DetectionProportions,
    pub combined: DetectionProportions,
    pub analyses: usize,
    pub trees: usize,
    #[serde(rename = "unique genomes", skip_serializing_if = "Option::is_none", default)]
    pub unique_genomes: Option<UniqueGenomes>,
}

impl AnalysisOutput {
    pub fn get(&self, statistic: Statistic) -> DetectionProportions {
        match statistic {
            Statistic::Tier1 => self.tier_1,
            Statistic::Tier2 => self.tier_2,
            Statistic::Clumpiness => self.clumpiness,
            Statistic::ClumpinessTally => self.clumpiness_tally,
            Statistic::ClumpinessMagnitude => self.clumpiness_magnitude,
            Statistic::Combined => self.combined,
        }
    }

    /// Mean proportions over repeated analyses. Analyses and trees are summed, the unique genome
    /// counts are those of the first analysis.
    pub fn average(outputs: &[AnalysisOutput]) -> Result<Self> {
        ensure!(!outputs.is_empty(), "No analyses to average");

        let field = |statistic: Statistic| {
            DetectionProportions::mean(
                &outputs
                    .iter()
                    .map(|o| o.get(statistic))
                    .collect::<Vec<DetectionProportions>>(),
            )
        };

        Ok(Self {
            tier_1: field(Statistic::Tier1),
            tier_2: field(Statistic::Tier2),
            clumpiness: field(Statistic::Clumpiness),
            clumpiness_tally: field(Statistic::ClumpinessTally),
            clumpiness_magnitude: field(Statistic::ClumpinessMagnitude),
            combined: field(Statistic::Combined),
            analyses: outputs.iter().map(|o| o.analyses).sum(),
            trees: outputs.iter().map(|o| o.trees).sum(),
            unique_genomes: outputs[0].unique_genomes,
        })
    }
}

pub fn validate_sample_size(sample_size: usize, population_size: usize) -> Result<()> {
    if sample_size >= population_size {
        return Err(eyre!(SampleSizeError((sample_size, population_size))));
    }
    Ok(())
}

pub fn validate_combination_size(combination_size: usize, sample_size: usize) -> Result<()> {
    if combination_size == 0 {
        return Err(eyre!(ZeroCombinationError));
    }
    if combination_size >= sample_size {
        return Err(eyre!(CombinationSizeError((combination_size, sample_size))));
    }
    Ok(())
}

/// One analysis run over a sampled source and recipient population
#[derive(Debug, Clone)]
pub struct Analysis {
    source: Population,
    recipient: Population,
    params: AnalysisParams,
}

impl Analysis {
    /// Use already sampled populations, only the combination size is validated
    pub fn new(source: Population, recipient: Population, params: AnalysisParams) -> Result<Self> {
        validate_combination_size(params.combination_size, source.sample().len())?;
        validate_combination_size(params.combination_size, recipient.sample().len())?;

        Ok(Self {
            source,
            recipient,
            params,
        })
    }

    /// Validate the parameters against the population sizes, then sample both populations
    pub fn from_genomes<R: Rng + ?Sized>(
        source_genomes: Vec<Genome>,
        recipient_genomes: Vec<Genome>,
        params: AnalysisParams,
        rng: &mut R,
    ) -> Result<Self> {
        validate_sample_size(params.sample_size, source_genomes.len())?;
        validate_sample_size(params.sample_size, recipient_genomes.len())?;
        validate_combination_size(params.combination_size, params.sample_size)?;

        let source = Population::from_genomes(source_genomes, params.sample_size, rng)?;
        let recipient = Population::from_genomes(recipient_genomes, params.sample_size, rng)?;

        Self::new(source, recipient, params)
    }

    pub fn from_csv_files<R: Rng + ?Sized>(
        source_file: PathBuf,
        recipient_file: PathBuf,
        params: AnalysisParams,
        rng: &mut R,
    ) -> Result<Self> {
        let source_genomes = read_population_file(source_file)?;
        let recipient_genomes = read_population_file(recipient_file)?;
        Self::from_genomes(source_genomes, recipient_genomes, params, rng)
    }

    pub fn source(&self) -> &Population {
        &self.source
    }

    pub fn recipient(&self) -> &Population {
        &self.recipient
    }

    pub fn params(&self) -> &AnalysisParams {
        &self.params
    }

    fn clumpiness(&self) -> Clumpiness {
        Clumpiness::new(
            self.params.num_bins,
            self.params.binning,
            self.params.diversity,
        )
    }

    pub fn perform_analysis<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Results> {
        let results = if self.params.combination_size == 1 {
            self.perform_exhaustive()
        } else {
            self.perform_monte_carlo(rng)?
        };

        tracing::debug!(
            "Evaluated {} trees in {} trials.",
            results.trees(),
            results.len()
        );
        Ok(results)
    }

    /// One trial per source/recipient pair of the samples
    fn perform_exhaustive(&self) -> Results {
        let clumpiness = self.clumpiness();
        tracing::info!(
            "Evaluating all {} pairs of the sampled genomes.",
            self.source.sample().len() * self.recipient.sample().len()
        );

        let mut results = Results::default();
        for (source_genome, recipient_genome) in
            iproduct!(self.source.sample(), self.recipient.sample())
        {
            let tree = Tree::new(source_genome, recipient_genome, &self.source, &self.recipient);
            log_degenerate(&tree);
            results.push(TrialOutcome::from_trees(&[tree], &clumpiness), 1);
        }
        results
    }

    /// Every trial gets its own generator seeded from `rng`, so the outcome does not depend on
    /// the number of threads.
    fn perform_monte_carlo<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Results> {
        tracing::info!(
            "Running {} trials with combinations of {} genomes per population.",
            self.params.trials,
            self.params.combination_size
        );

        let seeds = (0..self.params.trials)
            .map(|_| rng.gen::<u64>())
            .collect::<Vec<u64>>();

        // Workers accumulate their own chunk, chunks are merged in trial order
        seeds
            .into_par_iter()
            .map(|seed| self.run_trial(&mut StdRng::seed_from_u64(seed)))
            .try_fold(Results::default, |mut results, trial| {
                let (outcome, n_trees) = trial?;
                results.push(outcome, n_trees);
                Ok::<Results, color_eyre::Report>(results)
            })
            .try_reduce(Results::default, |a, b| Ok(a.merge(b)))
    }

    fn run_trial<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<(TrialOutcome, usize)> {
        let k = self.params.combination_size;
        let source_genomes = sample_population(self.source.sample(), k, rng)?;
        let recipient_genomes = sample_population(self.recipient.sample(), k, rng)?;

        let trees = iproduct!(&source_genomes, &recipient_genomes)
            .map(|(s, r)| Tree::new(s, r, &self.source, &self.recipient))
            .inspect(log_degenerate)
            .collect::<Vec<Tree>>();

        check_tree_count(trees.len(), k)?;

        Ok((
            TrialOutcome::from_trees(&trees, &self.clumpiness()),
            trees.len(),
        ))
    }

    pub fn unique_genomes(&self) -> UniqueGenomes {
        UniqueGenomes {
            source_population: count_unique_genomes(self.source.population()),
            source_sample: count_unique_genomes(self.source.sample()),
            recipient_population: count_unique_genomes(self.recipient.population()),
            recipient_sample: count_unique_genomes(self.recipient.sample()),
        }
    }

    /// Perform the analysis and reduce it to proportions
    pub fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<(Results, AnalysisOutput)> {
        let results = self.perform_analysis(rng)?;
        let mut output = results.output();

        if self.params.count_populations {
            output.unique_genomes = Some(self.unique_genomes());
        }

        Ok((results, output))
    }
}

/// A trial over `k` genomes per population evaluates all `k * k` pairs
pub fn check_tree_count(collected: usize, combination_size: usize) -> Result<()> {
    let expected = combination_size * combination_size;
    if collected != expected {
        return Err(eyre!(TreeCountError((collected, expected))));
    }
    Ok(())
}

fn log_degenerate(tree: &Tree) {
    if tree.is_degenerate() {
        tracing::trace!(
            "Degenerate tree: {} shared, {} source and {} recipient mutations.",
            tree.shared.len(),
            tree.source.len(),
            tree.recipient.len()
        );
    }
}
