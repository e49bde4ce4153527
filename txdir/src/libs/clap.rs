use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::time::OffsetTime;

use crate::args::AnalysisParams;
use crate::subcommands::{analyze, frequencies};

#[derive(Parser, Debug)]
#[command(author, version, about, styles=get_styles())]
pub struct Arguments {
    #[command(subcommand)]
    cmd: SubCommand,
}

#[derive(Args, Debug, Clone)]
pub struct LogAndVerbosity {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, default_value_t = 3)]
    pub verbosity: u8,

    /// A file path to save logs to
    #[arg(short, long)]
    pub log_file: Option<PathBuf>,

    /// Silence all warning and info messages
    #[arg(long)]
    pub silent: bool,
}

#[derive(Subcommand, Debug)]
pub enum SubCommand {
    /// Infer the transmission direction between a source and a recipient population
    Analyze {
        /// Population file of the presumed source, one genome of comma separated mutations per line
        source: PathBuf,

        /// Population file of the presumed recipient
        recipient: PathBuf,

        #[command(flatten)]
        params: AnalysisParams,

        /// JSON file with the analysis parameters, overrides the flags above
        #[arg(long = "params")]
        params_file: Option<PathBuf>,

        /// Output directory
        #[arg(short = 'o', long, default_value = "./")]
        output: PathBuf,

        /// Output files will be prefixed with this
        #[arg(short = 'p', long)]
        prefix: Option<String>,

        /// Print the results to stdout instead of a file
        #[arg(long)]
        stdout: bool,

        /// Also write the per trial outcomes of the first repetition as csv
        #[arg(long)]
        trial_csv: bool,

        /// Number of threads
        #[arg(short = 't', long, default_value_t = 8)]
        threads: usize,

        #[command(flatten)]
        log_and_verbosity: LogAndVerbosity,
    },

    /// Sample a population and list the frequency of every mutation in the sample
    Frequencies {
        /// Population file
        file: PathBuf,

        /// Number of genomes sampled with replacement
        #[arg(short = 's', long, default_value_t = 50)]
        sample_size: usize,

        /// Seed for the random number generator
        #[arg(long)]
        seed: Option<u64>,

        /// Output directory
        #[arg(short = 'o', long, default_value = "./")]
        output: PathBuf,

        /// Output files will be prefixed with this
        #[arg(short = 'p', long)]
        prefix: Option<String>,

        #[command(flatten)]
        log_and_verbosity: LogAndVerbosity,
    },
}

impl SubCommand {
    pub fn threads(&self) -> usize {
        match self {
            SubCommand::Analyze { threads, .. } => *threads,
            _ => 1,
        }
    }

    pub fn log_and_verbosity(&self) -> (u8, &Option<PathBuf>, bool) {
        match self {
            SubCommand::Analyze { log_and_verbosity, .. }
            | SubCommand::Frequencies { log_and_verbosity, .. } => (
                log_and_verbosity.verbosity,
                &log_and_verbosity.log_file,
                log_and_verbosity.silent,
            ),
        }
    }

    pub fn output(&self) -> Option<PathBuf> {
        match self {
            SubCommand::Analyze { stdout: true, .. } => None,
            SubCommand::Analyze { output, .. } | SubCommand::Frequencies { output, .. } => {
                Some(output.clone())
            }
        }
    }
}

pub fn run_args(args: Arguments) -> Result<()> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(args.cmd.threads())
        .build_global()?;

    let (verbosity, log_file, is_silent) = args.cmd.log_and_verbosity();

    let (level, wrtr, _guard) = init_tracing(verbosity, log_file, is_silent)?;

    let timer = time::format_description::parse("[hour]:[minute]:[second].[subsecond digits:3]")?;
    let time_offset = time::UtcOffset::current_local_offset().unwrap_or(time::UtcOffset::UTC);
    let timer = OffsetTime::new(time_offset, timer);

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(wrtr)
        .with_timer(timer)
        .init();

    if let Some(output) = args.cmd.output() {
        if let Err(e) = std::fs::create_dir_all(output.clone()) {
            match e.kind() {
                std::io::ErrorKind::AlreadyExists => (),
                _ => return Err(eyre!("Error creating directory {output:?}")),
            }
        }
    }

    run_cmd(args.cmd)?;

    Ok(())
}

#[rustfmt::skip]
pub fn run_cmd(cmd: SubCommand) -> Result<()> {
    match cmd {
        SubCommand::Analyze {
            source, recipient, params, params_file, output, prefix, stdout, trial_csv, ..
        } => {
            let params = match params_file {
                Some(path) => AnalysisParams::from_json_file(path)?,
                None => params,
            };
            let output = (!stdout).then_some(output);
            analyze::run(source, recipient, params, output, prefix, trial_csv)?
        }

        SubCommand::Frequencies { file, sample_size, seed, output, prefix, .. }
            => frequencies::run(file, sample_size, seed, output, prefix)?,
    };
    Ok(())
}

pub fn init_tracing(
    verbosity: u8,
    log_file: &Option<PathBuf>,
    is_silent: bool,
) -> Result<(Level, NonBlocking, WorkerGuard)> {
    let level = if is_silent {
        Level::ERROR
    } else {
        match verbosity {
            0 | 1 => Level::ERROR,
            2 => Level::WARN,
            3 => Level::INFO,
            4 => Level::DEBUG,
            5..=u8::MAX => Level::TRACE,
        }
    };

    // Write logs to stderr or file
    let (wrtr, _guard) = match log_file {
        Some(path) => {
            let file = std::fs::File::options()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)?;
            tracing_appender::non_blocking(file)
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    Ok((level, wrtr, _guard))
}

pub fn get_styles() -> clap::builder::Styles {
    clap::builder::Styles::styled()
        .usage(
            anstyle::Style::new()
                .bold()
                .underline()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
        )
        .header(
            anstyle::Style::new()
                .bold()
                .underline()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
        )
        .literal(
            anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
        )
        .invalid(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
        )
        .error(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
        )
        .valid(
            anstyle::Style::new()
                .bold()
                .underline()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
        )
        .placeholder(
            anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))),
        )
}
