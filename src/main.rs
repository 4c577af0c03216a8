mod analyzer;
mod cli;
mod error_handling;
mod grammar;
mod parser;
mod report;

use std::fs::File;
use std::io::{self, BufWriter};
use std::process::ExitCode;

use clap::Parser;

use cli::{Cli, Output};
use parser::CompileErrors;

fn print_errors(errors: &CompileErrors) {
    for error in errors {
        eprintln!("{}", error);
    }
}

fn write_output(cli: &Cli, grammar: &grammar::Grammar) -> io::Result<()> {
    let first_sets = !cli.no_first_sets;
    match cli.output() {
        Output::Stdout => report::write_report(&mut io::stdout().lock(), grammar, &cli.file, first_sets),
        Output::File(path) => {
            let mut out = BufWriter::new(File::create(path)?);
            report::write_report(&mut out, grammar, &cli.file, first_sets)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    let mut parsed = match parser::parse_file(&cli.file) {
        Ok(parsed) => parsed,
        Err(errors) => {
            print_errors(&errors);
            return ExitCode::from(1);
        }
    };
    print_errors(&parsed.errors);

    analyzer::analyze(&mut parsed.grammar);

    if let Err(e) = write_output(&cli, &parsed.grammar) {
        eprintln!("{} => Could not write the report: {}", cli.file.display(), e);
        return ExitCode::from(2);
    }

    if parsed.error_count() > 0 {
        eprintln!("{} errors in {}", parsed.error_count(), cli.file.display());
    }
    ExitCode::SUCCESS
}
