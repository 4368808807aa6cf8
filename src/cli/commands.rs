//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Incremental sync runner for JSON Lines sources
#[derive(Parser, Debug)]
#[command(name = "solidafy-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Source definition file (YAML)
    #[arg(short = 'S', long, global = true)]
    pub source: Option<PathBuf>,

    /// State file (JSON); checkpoints are written back to it
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Inline state JSON
    #[arg(long, global = true, conflicts_with = "state")]
    pub state_json: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Verify that every stream's data is reachable
    Check,

    /// Print the catalog of available streams
    Discover,

    /// Read data from streams
    Read {
        /// Configured catalog file (JSON); defaults to every stream,
        /// incremental where supported
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Streams to sync (comma-separated, empty = all)
        #[arg(long)]
        streams: Option<String>,

        /// Maximum records per slice
        #[arg(long)]
        max_records: Option<usize>,

        /// Emit a message for every slice read
        #[arg(long)]
        log_slices: bool,

        /// Keep reading the remaining streams after a stream fails
        #[arg(long)]
        continue_on_error: bool,

        /// Write the final state to this file
        #[arg(long)]
        state_out: Option<PathBuf>,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
