//! Stream key and record types
//!
//! Identity keys and cursor fields can be declared in YAML/JSON, so both
//! convert from a raw `JsonValue` and reject malformed declarations up front.

use crate::engine::Message;
use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

// ============================================================================
// Primary Key
// ============================================================================

/// Identity key of a stream
///
/// Accepted declarations:
/// - `"id"` - a single field
/// - `["id", "region"]` - a composite of top-level fields
/// - `[["data", "id"], "region"]` - a composite of (possibly nested) paths
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "JsonValue", into = "JsonValue")]
pub enum PrimaryKey {
    /// No identity key
    #[default]
    None,
    /// A single top-level field
    Single(String),
    /// A composite key; each component is a field path
    Composite(Vec<Vec<String>>),
}

impl PrimaryKey {
    /// Create a single-field key
    pub fn single(field: impl Into<String>) -> Self {
        Self::Single(field.into())
    }

    /// Create a composite key of top-level fields
    pub fn composite<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Self::Composite(fields.into_iter().map(|f| vec![f.into()]).collect())
    }

    /// Create a composite key of field paths
    pub fn nested(paths: Vec<Vec<String>>) -> Self {
        Self::Composite(paths)
    }

    /// Whether the stream declares no key
    pub fn is_none(&self) -> bool {
        match self {
            Self::None => true,
            Self::Single(field) => field.is_empty(),
            Self::Composite(paths) => paths.is_empty(),
        }
    }

    /// The key as a list of field paths, `None` when no key is declared
    pub fn wrapped(&self) -> Option<Vec<Vec<String>>> {
        if self.is_none() {
            return None;
        }
        match self {
            Self::None => None,
            Self::Single(field) => Some(vec![vec![field.clone()]]),
            Self::Composite(paths) => Some(paths.clone()),
        }
    }

    /// Reject composite components that are empty paths
    pub fn validate(&self) -> Result<()> {
        if let Self::Composite(paths) = self {
            let empty = paths
                .iter()
                .position(|p| p.is_empty() || p.iter().any(String::is_empty));
            if let Some(index) = empty {
                return Err(Error::invalid_primary_key(format!(
                    "component {index} is an empty field path"
                )));
            }
        }
        Ok(())
    }
}

impl TryFrom<JsonValue> for PrimaryKey {
    type Error = Error;

    fn try_from(value: JsonValue) -> Result<Self> {
        match value {
            JsonValue::Null => Ok(Self::None),
            JsonValue::String(field) if field.is_empty() => Ok(Self::None),
            JsonValue::String(field) => Ok(Self::Single(field)),
            JsonValue::Array(components) if components.is_empty() => Ok(Self::None),
            JsonValue::Array(components) => components
                .into_iter()
                .map(|component| match component {
                    JsonValue::String(field) => Ok(vec![field]),
                    JsonValue::Array(path) => path
                        .into_iter()
                        .map(|part| match part {
                            JsonValue::String(s) => Ok(s),
                            other => Err(Error::invalid_primary_key(format!(
                                "path element must be a string, got {other}"
                            ))),
                        })
                        .collect(),
                    other => Err(Error::invalid_primary_key(format!(
                        "element must be either list or string, got {other}"
                    ))),
                })
                .collect::<Result<Vec<_>>>()
                .map(Self::Composite),
            other => Err(Error::invalid_primary_key(format!(
                "must be a string, a list, or a list of lists, got {other}"
            ))),
        }
    }
}

impl From<PrimaryKey> for JsonValue {
    fn from(key: PrimaryKey) -> Self {
        match key {
            PrimaryKey::None => JsonValue::Null,
            PrimaryKey::Single(field) => JsonValue::String(field),
            PrimaryKey::Composite(paths) => JsonValue::from(paths),
        }
    }
}

// ============================================================================
// Cursor Field
// ============================================================================

/// Path to the field used for ordering and incremental bookmarking
///
/// Empty when the stream has no cursor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "JsonValue", into = "Vec<String>")]
pub struct CursorField(Vec<String>);

impl CursorField {
    /// Create a cursor field from a path
    pub fn new<S: Into<String>>(path: impl IntoIterator<Item = S>) -> Self {
        Self(path.into_iter().map(Into::into).collect())
    }

    /// Whether no cursor is declared
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The field path
    pub fn path(&self) -> &[String] {
        &self.0
    }

    /// The path joined with dots, e.g. `meta.updated_at`
    pub fn dotted(&self) -> String {
        self.0.join(".")
    }
}

impl From<&str> for CursorField {
    fn from(field: &str) -> Self {
        if field.is_empty() {
            Self::default()
        } else {
            Self(vec![field.to_string()])
        }
    }
}

impl From<Vec<String>> for CursorField {
    fn from(path: Vec<String>) -> Self {
        Self(path)
    }
}

impl From<CursorField> for Vec<String> {
    fn from(field: CursorField) -> Self {
        field.0
    }
}

impl TryFrom<JsonValue> for CursorField {
    type Error = Error;

    fn try_from(value: JsonValue) -> Result<Self> {
        match value {
            JsonValue::Null => Ok(Self::default()),
            JsonValue::String(field) => Ok(Self::from(field.as_str())),
            JsonValue::Array(path) => path
                .into_iter()
                .map(|part| match part {
                    JsonValue::String(s) => Ok(s),
                    other => Err(Error::invalid_cursor_field(format!(
                        "path element must be a string, got {other}"
                    ))),
                })
                .collect::<Result<Vec<_>>>()
                .map(Self),
            other => Err(Error::invalid_cursor_field(format!(
                "must be a string or a list of strings, got {other}"
            ))),
        }
    }
}

// ============================================================================
// Stream Data
// ============================================================================

/// One item produced by a stream's record reader
#[derive(Debug, Clone)]
pub enum StreamData {
    /// A bare record payload
    Data(JsonObject),
    /// A pre-formed message (record, log, ...)
    Message(Message),
}

impl StreamData {
    /// The record payload, if this item is a data record
    pub fn record_data(&self) -> Option<&JsonObject> {
        match self {
            Self::Data(data) => Some(data),
            Self::Message(Message::Record(record)) => Some(&record.data),
            Self::Message(_) => None,
        }
    }

    /// Whether this item is a data record
    pub fn is_record(&self) -> bool {
        self.record_data().is_some()
    }
}

impl From<JsonObject> for StreamData {
    fn from(data: JsonObject) -> Self {
        Self::Data(data)
    }
}

impl From<Message> for StreamData {
    fn from(message: Message) -> Self {
        Self::Message(message)
    }
}

/// Finite, lazy, single-pass sequence of records for one slice
pub type RecordStream<'a> = BoxStream<'a, Result<StreamData>>;
