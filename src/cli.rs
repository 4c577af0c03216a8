use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser};
use log::LevelFilter;

const STDOUT: &str = "-";

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// File containing the grammar
    pub file: PathBuf,

    /// Report destination, `-` for stdout (default: <FILE stem>.out)
    #[arg(value_name = "OUTPUT", conflicts_with = "output_flag")]
    pub output: Option<PathBuf>,

    /// Same as OUTPUT
    #[arg(short = 'o', long = "output", value_name = "OUTPUT")]
    pub output_flag: Option<PathBuf>,

    /// Repeat for more log output
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Leave the first-sets out of the report
    #[arg(long)]
    pub no_first_sets: bool
}

pub enum Output {
    Stdout,
    File(PathBuf),
}

fn default_output(file: &Path) -> PathBuf {
    let stem = file.file_stem().unwrap_or(file.as_os_str());
    PathBuf::from(stem).with_extension("out")
}

impl Cli {
    pub fn output(&self) -> Output {
        match self.output.as_ref().or(self.output_flag.as_ref()) {
            Some(path) if path.as_os_str() == STDOUT => Output::Stdout,
            Some(path) => Output::File(path.clone()),
            None => Output::File(default_output(&self.file)),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}
