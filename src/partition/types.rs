//! Partition types and traits
//!
//! Defines the slice descriptor and the router abstraction.

use crate::error::Result;
use crate::types::{JsonObject, JsonValue};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// An opaque descriptor bounding one unit of fetch work
///
/// `StreamSlice::whole()` is the absence of a partition: the entire stream is
/// read as one unit. For resumable full refresh reads the slice carries the
/// pagination state to resume from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamSlice(Option<JsonObject>);

impl StreamSlice {
    /// The whole-stream slice
    pub fn whole() -> Self {
        Self(None)
    }

    /// Create a slice from a mapping
    pub fn new(values: JsonObject) -> Self {
        Self(Some(values))
    }

    /// Add a value to the slice
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.0
            .get_or_insert_with(JsonObject::new)
            .insert(key.into(), value.into());
        self
    }

    /// Add a string value
    #[must_use]
    pub fn with_string(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_value(key, JsonValue::String(value.into()))
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.as_ref()?.get(key)
    }

    /// Get a string value by key
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(JsonValue::as_str)
    }

    /// Whether this is the whole-stream slice
    pub fn is_whole(&self) -> bool {
        self.0.is_none()
    }

    /// Borrow the slice mapping
    pub fn as_object(&self) -> Option<&JsonObject> {
        self.0.as_ref()
    }

    /// Consume the slice, returning its mapping
    pub fn into_inner(self) -> Option<JsonObject> {
        self.0
    }
}

impl From<JsonObject> for StreamSlice {
    fn from(values: JsonObject) -> Self {
        Self::new(values)
    }
}

impl From<Option<JsonObject>> for StreamSlice {
    fn from(values: Option<JsonObject>) -> Self {
        Self(values)
    }
}

/// Lazily produced, single-pass sequence of slices
pub type SliceStream<'a> = BoxStream<'a, Result<StreamSlice>>;

/// Trait for partition routers
pub trait PartitionRouter: Send + Sync {
    /// Produce the slices in read order
    fn slices(&self) -> SliceStream<'_>;

    /// Get the partition field name
    fn partition_field(&self) -> &str;
}
