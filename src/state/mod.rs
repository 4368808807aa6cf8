//! State management module
//!
//! Handles per-stream progress state and checkpoint messages.
//! State is persisted between sync runs so interrupted syncs can resume.
//!
//! # Overview
//!
//! The state module provides:
//! - `ConnectorState` - Per-stream state keyed by `StreamDescriptor`
//! - `StateManager` - Checkpoint collaborator with optional file persistence
//! - The full refresh sentinel marker

mod manager;
mod types;

pub use manager::StateManager;
pub use types::{
    is_sentinel_state, sentinel_state, ConnectorState, StreamDescriptor, StreamState,
    StreamStateEntry, FULL_REFRESH_SENTINEL_STATE_KEY,
};
