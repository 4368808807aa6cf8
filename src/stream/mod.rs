//! Stream module
//!
//! The capability contract every synchronizable resource implements.
//!
//! # Overview
//!
//! The stream module provides:
//! - `Stream` - Declared abilities plus the per-slice record reader
//! - `ExplicitState` - The stream-managed state capability
//! - `PrimaryKey` / `CursorField` - Key declarations, validated on load
//! - `StreamData` / `RecordStream` - What a record reader produces

mod base;
mod types;

pub use base::{ExplicitState, Stream};
pub use types::{CursorField, PrimaryKey, RecordStream, StreamData};
