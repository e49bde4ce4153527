#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxError {
    MutationParseError((usize, String)),
    EmptyPopulationError,
    SampleSizeError((usize, usize)),
    ZeroCombinationError,
    CombinationSizeError((usize, usize)),
    TreeCountError((usize, usize)),
}

impl std::fmt::Display for TxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MutationParseError((line, token)) => write!(
                f,
                "Mutation {token:?} on line {line} is not an integer"
            ),
            Self::EmptyPopulationError => {
                write!(f, "Cannot sample genomes from an empty population.")
            }
            Self::SampleSizeError((sample_size, population_size)) => write!(
                f,
                "Sample size {sample_size} must be smaller than the population size {population_size}"
            ),
            Self::ZeroCombinationError => {
                write!(f, "Combination size needs to be atleast one")
            }
            Self::CombinationSizeError((combination_size, sample_size)) => write!(
                f,
                "Combination size {combination_size} must be smaller than the sample size {sample_size}"
            ),
            Self::TreeCountError((collected, expected)) => write!(
                f,
                "Collected {collected} trees for a trial but the combination size requires {expected}"
            ),
        }
    }
}

impl std::error::Error for TxError {}
