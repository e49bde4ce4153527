/// Infer the transmission direction between two population files
pub mod analyze;

/// Sample frequency table of a population file
pub mod frequencies;
