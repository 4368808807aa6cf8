//! Slice trace policy

use super::types::Message;
use crate::partition::StreamSlice;

/// Decides whether a trace message is emitted before each slice is read
pub trait SliceLogger: Send + Sync {
    /// Whether slices should be traced
    fn should_log_slice(&self) -> bool;

    /// Build the trace message for a slice
    fn create_slice_message(&self, stream: &str, slice: &StreamSlice) -> Message {
        Message::slice(stream, slice.clone())
    }
}

/// Traces slices when debug logging is enabled
#[derive(Debug, Default, Clone, Copy)]
pub struct DebugSliceLogger;

impl SliceLogger for DebugSliceLogger {
    fn should_log_slice(&self) -> bool {
        tracing::enabled!(tracing::Level::DEBUG)
    }
}

/// Always traces slices
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysLogSliceLogger;

impl SliceLogger for AlwaysLogSliceLogger {
    fn should_log_slice(&self) -> bool {
        true
    }
}

/// Never traces slices
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverLogSliceLogger;

impl SliceLogger for NeverLogSliceLogger {
    fn should_log_slice(&self) -> bool {
        false
    }
}
