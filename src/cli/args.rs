//! Command-line arguments for the `sciname` binary.
//!
//! Uses the `clap` crate with its "derive" feature for a declarative,
//! type-safe argument structure.

use clap::Parser;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "sciname",
    version,
    about = "Parses scientific names into their semantic elements."
)]
pub struct ScinameArgs {
    /// A single name to parse, or a path to a file with one name per line.
    /// Reads stdin when omitted.
    pub input: Option<String>,

    /// Output format: csv, compact, pretty, or simple.
    #[arg(short, long, default_value = "csv")]
    pub format: String,

    /// Number of parallel parsing jobs. Defaults to the CPU thread count.
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Keep HTML tags and entities when parsing.
    #[arg(short = 'n', long)]
    pub nocleanup: bool,
}
