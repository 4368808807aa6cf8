//! Partition router implementations
//!
//! Each router handles a specific slicing strategy.

use super::types::{PartitionRouter, SliceStream, StreamSlice};
use futures::StreamExt;

// ============================================================================
// List Router
// ============================================================================

/// List-based partition router
///
/// Creates one slice per value of a static list.
#[derive(Debug, Clone)]
pub struct ListRouter {
    /// List of partition values
    values: Vec<String>,
    /// Field name for partition
    partition_field: String,
}

impl ListRouter {
    /// Create a new list router
    pub fn new(values: Vec<String>, partition_field: impl Into<String>) -> Self {
        Self {
            values,
            partition_field: partition_field.into(),
        }
    }

    /// Consume the router into its slice sequence
    pub fn into_slices(self) -> SliceStream<'static> {
        let field = self.partition_field;
        futures::stream::iter(
            self.values
                .into_iter()
                .map(move |value| Ok(StreamSlice::whole().with_string(field.clone(), value))),
        )
        .boxed()
    }
}

impl PartitionRouter for ListRouter {
    fn slices(&self) -> SliceStream<'_> {
        futures::stream::iter(self.values.iter().map(|value| {
            Ok(StreamSlice::whole().with_string(self.partition_field.clone(), value.clone()))
        }))
        .boxed()
    }

    fn partition_field(&self) -> &str {
        &self.partition_field
    }
}
