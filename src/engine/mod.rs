//! Execution engine module
//!
//! The per-stream read loop and the messages it produces.
//!
//! # Overview
//!
//! The engine module provides:
//! - `StreamReader` - Reads one stream, interleaving records and checkpoints
//! - `reconcile` - Resolves a stream's current state across both state contracts
//! - `SliceLogger` - Policy for tracing slices before they are read
//! - `SyncConfig` - Configuration for sync operations
//! - Message types for output (Record, State, Log, Slice, Trace)
//!
//! # Example
//!
//! ```ignore
//! let reader = StreamReader::new(
//!     &stream,
//!     &configured,
//!     StreamState::new(),
//!     &state_manager,
//!     &DebugSliceLogger,
//!     SyncConfig::default(),
//! );
//! let messages: Vec<Message> = reader.into_stream().try_collect().await?;
//! ```

mod reader;
mod reconcile;
mod slice_logger;
mod types;

pub use crate::types::LogLevel;
pub use reader::StreamReader;
pub use reconcile::{explicit_state, reconcile};
pub use slice_logger::{AlwaysLogSliceLogger, DebugSliceLogger, NeverLogSliceLogger, SliceLogger};
pub use types::{
    ErrorTrace, LogMessage, Message, RecordMessage, SliceMessage, StateMessage, SyncConfig,
    SyncStats,
};
