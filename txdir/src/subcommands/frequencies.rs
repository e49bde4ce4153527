use std::path::PathBuf;

use color_eyre::Result;

use crate::io::{open_csv_writer, push_to_output};
use crate::population::{Population, SampleSnps};
use crate::utils::get_rng;

#[doc(hidden)]
pub fn run(
    file: PathBuf,
    sample_size: usize,
    seed: Option<u64>,
    output: PathBuf,
    prefix: Option<String>,
) -> Result<()> {
    let mut rng = get_rng(seed);
    let population = Population::from_csv_file(file, sample_size, &mut rng)?;

    let mut csv_output = output;
    push_to_output(&prefix, &mut csv_output, "frequencies", "csv");
    let mut writer = open_csv_writer(csv_output)?;
    write_frequencies_to_csv(population.sample_snps(), &mut writer)?;

    tracing::info!(
        "Found {} distinct mutations in a sample of {} genomes.",
        population.sample_snps().len(),
        population.sample().len()
    );
    Ok(())
}

pub fn write_frequencies_to_csv<W: std::io::Write>(
    snps: &SampleSnps,
    writer: &mut csv::Writer<W>,
) -> Result<()> {
    writer.write_record(["mutation", "count", "proportion"])?;
    for (mutation, snp) in snps {
        writer.write_record([
            mutation.to_string(),
            snp.count.to_string(),
            snp.proportion.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
