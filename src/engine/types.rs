//! Engine types
//!
//! Message types and configuration for the sync engine.

use crate::partition::StreamSlice;
use crate::state::{StreamDescriptor, StreamState};
use crate::types::{JsonObject, LogLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message emitted during sync
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// A data record
    Record(RecordMessage),
    /// A state checkpoint
    State(StateMessage),
    /// Log message
    Log(LogMessage),
    /// Trace of a slice about to be read
    Slice(SliceMessage),
    /// Trace of a failed stream
    Trace(ErrorTrace),
}

/// A data record of one stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMessage {
    /// Stream name
    pub stream: String,
    /// Stream namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Record payload
    pub data: JsonObject,
    /// When the record was emitted
    pub emitted_at: DateTime<Utc>,
}

/// A persisted progress snapshot of one stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateMessage {
    /// Stream the state belongs to
    pub stream: StreamDescriptor,
    /// State data (cursor, pagination state, or the full refresh sentinel)
    pub data: StreamState,
}

/// Log message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogMessage {
    /// Log level
    pub level: LogLevel,
    /// Log message
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceMessage {
    /// Stream name
    pub stream: String,
    /// The slice being read
    pub slice: StreamSlice,
}

/// Trace describing a stream failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorTrace {
    /// Failed stream
    pub stream: StreamDescriptor,
    /// User-facing message
    pub message: String,
    /// Underlying error text
    pub internal_message: String,
    /// When the failure was traced
    pub emitted_at: DateTime<Utc>,
}

impl Message {
    /// Create a record message
    pub fn record(stream: impl Into<String>, namespace: Option<&str>, data: JsonObject) -> Self {
        Self::Record(RecordMessage {
            stream: stream.into(),
            namespace: namespace.map(ToString::to_string),
            data,
            emitted_at: Utc::now(),
        })
    }

    /// Create a state message
    pub fn state(stream: StreamDescriptor, data: StreamState) -> Self {
        Self::State(StateMessage { stream, data })
    }

    /// Create a log message
    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        Self::Log(LogMessage {
            level,
            message: message.into(),
        })
    }

    /// Create a warning log
    pub fn warn(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Warn, message)
    }

    /// Create an error log
    pub fn error(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Error, message)
    }

    /// Create a slice trace message
    pub fn slice(stream: impl Into<String>, slice: StreamSlice) -> Self {
        Self::Slice(SliceMessage {
            stream: stream.into(),
            slice,
        })
    }

    /// Create an error trace message
    pub fn trace(
        stream: StreamDescriptor,
        message: impl Into<String>,
        internal_message: impl Into<String>,
    ) -> Self {
        Self::Trace(ErrorTrace {
            stream,
            message: message.into(),
            internal_message: internal_message.into(),
            emitted_at: Utc::now(),
        })
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record(_))
    }

    /// Check if this is a state message
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State(_))
    }

    /// Check if this is a log message
    pub fn is_log(&self) -> bool {
        matches!(self, Self::Log(_))
    }

    /// Check if this is a slice trace message
    pub fn is_slice(&self) -> bool {
        matches!(self, Self::Slice(_))
    }

    /// Check if this is an error trace message
    pub fn is_trace(&self) -> bool {
        matches!(self, Self::Trace(_))
    }

    /// The state payload, if this is a state message
    pub fn as_state(&self) -> Option<&StreamState> {
        match self {
            Self::State(state) => Some(&state.data),
            _ => None,
        }
    }

    /// The record payload, if this is a record message
    pub fn as_record(&self) -> Option<&JsonObject> {
        match self {
            Self::Record(record) => Some(&record.data),
            _ => None,
        }
    }
}

/// Configuration for sync operation
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Maximum records to read per slice (`None` = unlimited)
    pub limit: Option<usize>,
    /// Whether to stop at the first failed stream
    pub fail_fast: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            limit: None,
            fail_fast: true,
        }
    }
}

impl SyncConfig {
    /// Create a new sync config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the record limit
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set fail fast mode
    #[must_use]
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Whether `count` records reach the configured limit
    pub fn is_limit_reached(&self, count: usize) -> bool {
        self.limit.is_some_and(|limit| count >= limit)
    }
}

/// Statistics from a sync operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Total records emitted
    pub records_synced: usize,
    /// Total slices read
    pub slices_read: usize,
    /// Total state checkpoints emitted
    pub checkpoints: usize,
    /// Total streams synced
    pub streams_synced: usize,
    /// Streams that failed
    pub errors: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record
    pub fn add_record(&mut self) {
        self.records_synced += 1;
    }

    /// Add a slice
    pub fn add_slice(&mut self) {
        self.slices_read += 1;
    }

    /// Add a checkpoint
    pub fn add_checkpoint(&mut self) {
        self.checkpoints += 1;
    }

    /// Add a stream
    pub fn add_stream(&mut self) {
        self.streams_synced += 1;
    }

    /// Add an error
    pub fn add_error(&mut self) {
        self.errors += 1;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }

    /// Fold another stream's stats into these
    pub fn merge(&mut self, other: &Self) {
        self.records_synced += other.records_synced;
        self.slices_read += other.slices_read;
        self.checkpoints += other.checkpoints;
        self.streams_synced += other.streams_synced;
        self.errors += other.errors;
    }
}
