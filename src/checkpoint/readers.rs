//! Checkpoint reader implementations
//!
//! Each reader tracks what remains to read and which state represents the
//! progress made so far.

use crate::error::Result;
use crate::partition::{SliceStream, StreamSlice};
use crate::state::StreamState;
use futures::StreamExt;

// ============================================================================
// Incremental (cursor-based)
// ============================================================================

/// Cursor-based checkpoint reader
///
/// Wraps the precomputed slice sequence. Slices do not adapt to observed
/// state; the state is only kept for the boundary checkpoint.
pub struct IncrementalCheckpointReader<'a> {
    slices: SliceStream<'a>,
    state: Option<StreamState>,
}

impl<'a> IncrementalCheckpointReader<'a> {
    /// Create a reader over a slice sequence
    pub fn new(slices: SliceStream<'a>) -> Self {
        Self {
            slices,
            state: None,
        }
    }

    /// Next slice, or `None` once the slice sequence is exhausted
    pub async fn next(&mut self) -> Result<Option<StreamSlice>> {
        self.slices.next().await.transpose()
    }

    /// Always true: exhaustion is detected by `next` returning `None`
    pub fn has_next(&self) -> bool {
        true
    }

    /// Record the latest state snapshot
    pub fn observe(&mut self, new_state: StreamState) {
        self.state = Some(new_state);
    }

    /// Latest observed state
    pub fn read_state(&self) -> Option<&StreamState> {
        self.state.as_ref()
    }
}

impl std::fmt::Debug for IncrementalCheckpointReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncrementalCheckpointReader")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Resumable Full Refresh (pagination-based)
// ============================================================================

/// Pagination-based checkpoint reader
///
/// The stored pagination state doubles as the slice to read next. The empty
/// mapping, reported by the stream after its last page, is the only terminal
/// state.
#[derive(Debug, Default)]
pub struct ResumableFullRefreshCheckpointReader {
    state: Option<StreamState>,
}

impl ResumableFullRefreshCheckpointReader {
    /// Create a reader with no observed state
    pub fn new() -> Self {
        Self::default()
    }

    /// The current pagination state as a slice; `None` once terminal
    pub fn next(&mut self) -> Option<StreamSlice> {
        self.has_next().then(|| StreamSlice::from(self.state.clone()))
    }

    /// False iff the stored state is the empty mapping
    pub fn has_next(&self) -> bool {
        !matches!(&self.state, Some(state) if state.is_empty())
    }

    /// Overwrite the stored pagination state
    pub fn observe(&mut self, new_state: StreamState) {
        self.state = Some(new_state);
    }

    /// Stored pagination state
    pub fn read_state(&self) -> Option<&StreamState> {
        self.state.as_ref()
    }
}

// ============================================================================
// Checkpoint Reader
// ============================================================================

/// The checkpoint strategy of one sync attempt
///
/// Chosen once when the read starts, from the stream's declared capability.
#[derive(Debug)]
pub enum CheckpointReader<'a> {
    /// Cursor-based incremental checkpointing
    Incremental(IncrementalCheckpointReader<'a>),
    /// Pagination-based resumable full refresh checkpointing
    ResumableFullRefresh(ResumableFullRefreshCheckpointReader),
}

impl<'a> CheckpointReader<'a> {
    /// Create a cursor-based reader over a slice sequence
    pub fn incremental(slices: SliceStream<'a>) -> Self {
        Self::Incremental(IncrementalCheckpointReader::new(slices))
    }

    /// Create a pagination-based reader
    pub fn resumable_full_refresh() -> Self {
        Self::ResumableFullRefresh(ResumableFullRefreshCheckpointReader::new())
    }

    /// Next unit of work, or `None` when nothing remains
    pub async fn next(&mut self) -> Result<Option<StreamSlice>> {
        match self {
            Self::Incremental(reader) => reader.next().await,
            Self::ResumableFullRefresh(reader) => Ok(reader.next()),
        }
    }

    /// Whether another unit of work may remain
    pub fn has_next(&self) -> bool {
        match self {
            Self::Incremental(reader) => reader.has_next(),
            Self::ResumableFullRefresh(reader) => reader.has_next(),
        }
    }

    /// Record the latest known progress state; `None` is ignored
    pub fn observe(&mut self, new_state: Option<StreamState>) {
        let Some(new_state) = new_state else {
            return;
        };
        match self {
            Self::Incremental(reader) => reader.observe(new_state),
            Self::ResumableFullRefresh(reader) => reader.observe(new_state),
        }
    }

    /// Current progress state, `None` until something was observed
    pub fn read_state(&self) -> Option<&StreamState> {
        match self {
            Self::Incremental(reader) => reader.read_state(),
            Self::ResumableFullRefresh(reader) => reader.read_state(),
        }
    }

    /// Whether this is the pagination-based strategy
    pub fn is_resumable_full_refresh(&self) -> bool {
        matches!(self, Self::ResumableFullRefresh(_))
    }
}
