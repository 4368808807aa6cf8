//! Checkpoint reader module
//!
//! The state machine behind a stream read: what is left to read, and what
//! state would represent the progress so far.
//!
//! # Strategies
//!
//! - `IncrementalCheckpointReader` - iterates precomputed slices, keeps the
//!   latest cursor state
//! - `ResumableFullRefreshCheckpointReader` - no slices; the pagination state
//!   is the next unit of work and `{}` means "fully read"

mod readers;

pub use readers::{
    CheckpointReader, IncrementalCheckpointReader, ResumableFullRefreshCheckpointReader,
};
