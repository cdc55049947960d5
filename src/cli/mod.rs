//! The command-line batch driver.
//!
//! Thin consumer of the core API: reads one name, a file of names, or stdin,
//! parses in parallel batches, and prints results in the selected format.
//! All hard errors (I/O, arguments) surface here, never inside the core.

use std::fs::File;
use std::io::{self, BufRead, BufReader, IsTerminal};
use std::path::Path;
use std::process;

use clap::{CommandFactory, Parser};
use miette::Diagnostic;
use thiserror::Error;

use crate::cli::args::ScinameArgs;
use crate::engine::{self, ParseOptions};
use crate::output::{Format, ParsedName};

pub mod args;

/// Lines per parallel batch; bounds memory while streaming large files.
const BATCH_SIZE: usize = 4096;

/// Hard errors of the driver layer.
#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("unknown output format '{name}'")]
    #[diagnostic(help("available formats: csv, compact, pretty, simple"))]
    UnknownFormat { name: String },

    #[error("cannot read {path}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot render output")]
    Render {
        #[source]
        source: serde_json::Error,
    },
}

/// The main entry point for the CLI. Exits with 1 on I/O or argument errors.
pub fn run() {
    let args = ScinameArgs::parse();
    if let Err(e) = execute(args) {
        eprintln!("{:?}", miette::Report::new(e));
        process::exit(1);
    }
}

fn execute(args: ScinameArgs) -> Result<(), CliError> {
    let format: Format = args
        .format
        .parse()
        .map_err(|name| CliError::UnknownFormat { name })?;
    let jobs = args.jobs.unwrap_or_else(engine::default_workers);
    let options = ParseOptions {
        format,
        remove_html: !args.nocleanup,
        workers_hint: jobs,
    };

    match args.input {
        Some(input) if Path::new(&input).is_file() => {
            let file = File::open(&input).map_err(|source| CliError::Io {
                path: input.clone(),
                source,
            })?;
            parse_lines(BufReader::new(file), &input, jobs, &options)
        }
        Some(input) => {
            print_header(format);
            let result = engine::parse(&input, &options);
            println!("{}", render(&result, format)?);
            Ok(())
        }
        None => {
            let stdin = io::stdin();
            if stdin.is_terminal() {
                // No piped input and no argument: show usage instead of
                // blocking on a silent read.
                let _ = ScinameArgs::command().print_help();
                return Ok(());
            }
            parse_lines(stdin.lock(), "<stdin>", jobs, &options)
        }
    }
}

fn parse_lines<R: BufRead>(
    reader: R,
    path: &str,
    jobs: usize,
    options: &ParseOptions,
) -> Result<(), CliError> {
    print_header(options.format);
    let mut batch: Vec<String> = Vec::with_capacity(BATCH_SIZE);
    for line in reader.lines() {
        let line = line.map_err(|source| CliError::Io {
            path: path.to_string(),
            source,
        })?;
        batch.push(line);
        if batch.len() == BATCH_SIZE {
            flush_batch(&batch, jobs, options)?;
            batch.clear();
        }
    }
    if !batch.is_empty() {
        flush_batch(&batch, jobs, options)?;
    }
    Ok(())
}

fn flush_batch(lines: &[String], jobs: usize, options: &ParseOptions) -> Result<(), CliError> {
    for result in engine::parse_stream(lines, jobs, options) {
        println!("{}", render(&result, options.format)?);
    }
    Ok(())
}

fn print_header(format: Format) {
    if format == Format::Csv {
        println!("{}", ParsedName::csv_header());
    }
}

fn render(result: &ParsedName, format: Format) -> Result<String, CliError> {
    match format {
        Format::Csv => Ok(result.to_csv()),
        Format::Simple => Ok(result.to_simple()),
        Format::Compact => result
            .to_json(false)
            .map_err(|source| CliError::Render { source }),
        Format::Pretty => result
            .to_json(true)
            .map_err(|source| CliError::Render { source }),
    }
}
