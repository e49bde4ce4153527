use std::io;
use std::path::PathBuf;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use csv::{Writer, WriterBuilder};

use crate::utils::strip_prefix;

pub fn get_csv_writer<W: io::Write>(output: W) -> Writer<W> {
    WriterBuilder::new()
        .delimiter(b',')
        .has_headers(true)
        .flexible(false)
        .from_writer(output)
}

pub fn get_input(filename: Option<PathBuf>) -> Result<Box<dyn io::Read>> {
    let input: Box<dyn io::Read> = match filename {
        Some(name) => match name.to_str() {
            Some("-") => Box::new(io::stdin()),
            Some(name) => {
                let r = match niffler::from_path(name) {
                    Ok(x) => x.0,
                    Err(err) => {
                        let msg = format!("failed to open \"{name}\": {err}");
                        return Err(eyre!(msg))?;
                    }
                };
                Box::new(r)
            }
            None => return Err(eyre!("Unknown I/O error")),
        },
        None => Box::new(io::stdin()),
    };
    Ok(input)
}

pub fn get_output(filename: Option<PathBuf>) -> Result<Box<dyn io::Write>> {
    let output: Box<dyn io::Write> = match filename {
        Some(name) => match name.to_str() {
            Some("-") => Box::new(io::stdout()),
            Some(name) => Box::new(
                match std::fs::File::options()
                    .create(true)
                    .write(true)
                    .truncate(true)
                    .open(name)
                {
                    Ok(x) => x,
                    Err(err) => return Err(eyre!("failed to open \"{name}\": {err}"))?,
                },
            ),
            None => return Err(eyre!("Unknown I/O error")),
        },
        None => Box::new(io::stdout()),
    };
    Ok(output)
}

pub fn open_csv_writer(name: PathBuf) -> Result<Writer<Box<dyn io::Write>>> {
    Ok(get_csv_writer(get_output(Some(name))?))
}

pub fn push_to_output(prefix: &Option<String>, output: &mut PathBuf, name: &str, suffix: &str) {
    match strip_prefix(prefix.clone()) {
        Some(prefix) => output.push(format!("{prefix}_{name}.{suffix}")),
        None => output.push(format!("{name}.{suffix}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_to_output() {
        let mut output = PathBuf::from("results");
        push_to_output(&None, &mut output, "transmission", "json");
        assert_eq!(output, PathBuf::from("results/transmission.json"));

        let mut output = PathBuf::from("results");
        push_to_output(&Some("run_1".into()), &mut output, "trials", "csv");
        assert_eq!(output, PathBuf::from("results/run_1_trials.csv"));

        let mut output = PathBuf::from("results");
        push_to_output(&Some(String::new()), &mut output, "trials", "csv");
        assert_eq!(output, PathBuf::from("results/trials.csv"));
    }

    #[test]
    fn test_get_input_missing_file() {
        let res = get_input(Some(PathBuf::from("does/not/exist.csv")));
        assert!(res.is_err());
    }
}
