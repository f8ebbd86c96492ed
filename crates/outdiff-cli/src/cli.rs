use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "outdiff",
    about = "Compare two pipeline output directories, down to SQLite tables",
    version,
)]
pub struct Cli {
    /// Reference output directory
    pub left: String,

    /// Output directory to compare against the reference
    pub right: String,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Maximum number of comparisons running at once
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// List nested directories instead of the top level only
    #[arg(long)]
    pub recursive: bool,

    /// Compare SQLite table lists only, not table contents
    #[arg(long)]
    pub no_tables: bool,

    /// Skip row counts when comparing tables
    #[arg(long)]
    pub no_row_counts: bool,

    /// Give up on a single comparison after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    #[arg(short, long)]
    pub verbose: bool,

    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
