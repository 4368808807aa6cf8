//! CLI module
//!
//! Command-line interface for running sources.
//!
//! # Commands
//!
//! - `check` - Verify the source's data is reachable
//! - `discover` - Print the source catalog
//! - `read` - Read streams, interleaving records with state checkpoints

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
