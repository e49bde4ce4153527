use std::io;
use std::path::PathBuf;

use color_eyre::eyre::ensure;
use color_eyre::Result;
use rand::Rng;

use crate::analysis::{Analysis, AnalysisOutput, Results, Statistic};
use crate::args::AnalysisParams;
use crate::genome::Genome;
use crate::io::{get_csv_writer, get_output, open_csv_writer, push_to_output};
use crate::population::read_population_file;
use crate::utils::get_rng;

#[doc(hidden)]
pub fn run(
    source: PathBuf,
    recipient: PathBuf,
    params: AnalysisParams,
    output: Option<PathBuf>,
    prefix: Option<String>,
    trial_csv: bool,
) -> Result<()> {
    tracing::info!(
        "Sample size {}, combination size {}, {} bins, {} with {} binning.",
        params.sample_size,
        params.combination_size,
        params.num_bins,
        params.diversity,
        params.binning
    );

    let source_genomes = read_population_file(source)?;
    let recipient_genomes = read_population_file(recipient)?;

    let mut rng = get_rng(params.seed);
    let (first, averaged) = run_repetitions(&source_genomes, &recipient_genomes, &params, &mut rng)?;

    match output {
        Some(output) => {
            let mut json_output = output.clone();
            push_to_output(&prefix, &mut json_output, "transmission", "json");
            tracing::info!("Writing results to {json_output:?}.");
            write_output(&averaged, get_output(Some(json_output))?)?;

            if trial_csv {
                let mut csv_output = output;
                push_to_output(&prefix, &mut csv_output, "trials", "csv");
                let mut writer = open_csv_writer(csv_output)?;
                write_trials_to_csv(&first, &mut writer)?;
            }
        }
        None => {
            write_output(&averaged, io::stdout())?;
            if trial_csv {
                tracing::warn!("Per trial outcomes are only written to an output directory.");
            }
        }
    }

    Ok(())
}

/// Resample both populations and analyze them `params.repetitions` times.
///
/// Returns the per trial results of the first repetition and the mean proportions over all of
/// them.
pub fn run_repetitions<R: Rng + ?Sized>(
    source_genomes: &[Genome],
    recipient_genomes: &[Genome],
    params: &AnalysisParams,
    rng: &mut R,
) -> Result<(Results, AnalysisOutput)> {
    let repetitions = params.repetitions;
    ensure!(repetitions > 0, "The number of repetitions needs to be atleast one");

    let mut first = None;
    let mut outputs = Vec::with_capacity(repetitions);

    for repetition in 0..repetitions {
        tracing::debug!("Repetition {}/{}.", repetition + 1, repetitions);
        let analysis = Analysis::from_genomes(
            source_genomes.to_vec(),
            recipient_genomes.to_vec(),
            params.clone(),
            rng,
        )?;

        let (results, output) = analysis.run(rng)?;
        outputs.push(output);
        if first.is_none() {
            first = Some(results);
        }
    }

    let averaged = AnalysisOutput::average(&outputs)?;
    Ok((first.unwrap_or_default(), averaged))
}

pub fn write_output<W: io::Write>(output: &AnalysisOutput, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, output)?;
    writeln!(writer)?;
    Ok(())
}

/// One row per trial, a correct and a reverse 0/1 column per statistic
pub fn write_trials_to_csv<W: io::Write>(
    results: &Results,
    writer: &mut csv::Writer<W>,
) -> Result<()> {
    let mut header = vec![String::from("trial")];
    for statistic in Statistic::ALL {
        header.push(format!("{statistic} correct"));
        header.push(format!("{statistic} reverse"));
    }
    writer.write_record(&header)?;

    for (idx, outcome) in results.outcomes().iter().enumerate() {
        let mut record = vec![idx.to_string()];
        for statistic in Statistic::ALL {
            let detection = outcome.get(statistic);
            record.push(u8::from(detection.correct).to_string());
            record.push(u8::from(detection.reverse).to_string());
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Render the per trial table into a string
pub fn trials_to_string(results: &Results) -> Result<String> {
    let mut bytes = vec![];
    write_trials_to_csv(results, &mut get_csv_writer(&mut bytes))?;
    Ok(String::from_utf8(bytes)?)
}
