//! Partition module
//!
//! Supports: whole-stream and static list slicing
//!
//! # Overview
//!
//! A slice bounds one unit of fetch work. Slices are produced lazily and
//! consumed exactly once, in order, by the stream reader:
//! - `StreamSlice::whole()` when the stream has no slicing strategy
//! - Static list of values (e.g., regions, accounts)

mod routers;
mod types;

pub use routers::ListRouter;
pub use types::{PartitionRouter, SliceStream, StreamSlice};

#[cfg(test)]
mod tests;
