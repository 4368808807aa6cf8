// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Solidafy Sync
//!
//! An incremental synchronization engine: reads streams of records from a
//! source and interleaves them with state checkpoints, so an interrupted sync
//! resumes where it stopped instead of starting over.
//!
//! ## Features
//!
//! - **Incremental Sync**: Cursor-based checkpoints per slice and every N records
//! - **Resumable Full Refresh**: Pagination state as a synthetic cursor
//! - **Legacy State**: Streams deriving state per record keep working
//! - **JSON Lines Source**: Files and directories described in YAML
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use solidafy_sync::config::ConfiguredCatalog;
//! use solidafy_sync::connector::{Source, SourceReader};
//! use solidafy_sync::engine::{DebugSliceLogger, SyncConfig};
//! use solidafy_sync::state::StateManager;
//! use solidafy_sync::{load_source, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let source = load_source("shop.yaml")?;
//!     let catalog = ConfiguredCatalog::from_catalog(&source.discover()?);
//!     let state = StateManager::from_file("state.json")?;
//!
//!     let mut messages = SourceReader::new(
//!         &source,
//!         &catalog,
//!         &state,
//!         &DebugSliceLogger,
//!         SyncConfig::default(),
//!     )
//!     .into_stream();
//!     while let Some(message) = messages.next().await {
//!         println!("{}", serde_json::to_string(&message?)?);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Source Interface                         │
//! │  check() → CheckResult   discover() → Catalog   streams()       │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────────┬───────────────┴───────────┬──────────────────────┐
//! │ SourceReader │ StreamReader              │ CheckpointReader     │
//! ├──────────────┼───────────────────────────┼──────────────────────┤
//! │ Stream order │ Records + checkpoints     │ Incremental (slices) │
//! │ Failures     │ Legacy state reconcile    │ Resumable full       │
//! │ Stats        │ Record limit              │ refresh (pages)      │
//! └──────────────┴───────────────────────────┴──────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)] // TODO: Add docs before 1.0 release

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// The stream capability contract
pub mod stream;

/// Partition routing
pub mod partition;

/// Checkpoint strategies
pub mod checkpoint;

/// State management and checkpointing
pub mod state;

/// Synchronization loop
pub mod engine;

/// Catalogs
pub mod config;

/// Source trait and multi-stream reader
pub mod connector;

/// Built-in JSON Lines source
pub mod connectors;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use connector::{Source, SourceReader};
pub use connectors::{load_source, load_source_from_str, JsonlSource};
pub use engine::{Message, StreamReader, SyncConfig};
pub use stream::{ExplicitState, Stream};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
