//! State types for tracking sync progress
//!
//! These types are serialized to JSON and persisted between runs.

use crate::types::{JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Progress state for one stream: field name to bookmark value
pub type StreamState = JsonObject;

/// Reserved state key recording "full refresh completed, no real cursor"
///
/// Streams that only support full refresh have no cursor to persist, so this
/// marker is checkpointed instead. It is never handed back as resumable
/// progress.
pub const FULL_REFRESH_SENTINEL_STATE_KEY: &str = "__ab_full_refresh_state_message";

/// Build the full refresh sentinel state
pub fn sentinel_state() -> StreamState {
    let mut state = StreamState::new();
    state.insert(
        FULL_REFRESH_SENTINEL_STATE_KEY.to_string(),
        JsonValue::Bool(true),
    );
    state
}

/// Whether a state is the full refresh sentinel
pub fn is_sentinel_state(state: &StreamState) -> bool {
    state.contains_key(FULL_REFRESH_SENTINEL_STATE_KEY)
}

/// Identifies a stream within a sync
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Stream name
    pub name: String,

    /// Optional grouping label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl StreamDescriptor {
    /// Create a new descriptor
    pub fn new(name: impl Into<String>, namespace: Option<&str>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.map(ToString::to_string),
        }
    }
}

impl std::fmt::Display for StreamDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{namespace}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Complete state for a connector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<StreamStateEntry>", into = "Vec<StreamStateEntry>")]
pub struct ConnectorState {
    /// Per-stream state
    streams: BTreeMap<StreamDescriptor, StreamState>,
}

/// Serialized per-stream entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamStateEntry {
    /// Stream the state belongs to
    pub stream_descriptor: StreamDescriptor,
    /// The stream's state
    #[serde(default)]
    pub stream_state: StreamState,
}

impl From<Vec<StreamStateEntry>> for ConnectorState {
    fn from(entries: Vec<StreamStateEntry>) -> Self {
        Self {
            streams: entries
                .into_iter()
                .map(|entry| (entry.stream_descriptor, entry.stream_state))
                .collect(),
        }
    }
}

impl From<ConnectorState> for Vec<StreamStateEntry> {
    fn from(state: ConnectorState) -> Self {
        state
            .streams
            .into_iter()
            .map(|(stream_descriptor, stream_state)| StreamStateEntry {
                stream_descriptor,
                stream_state,
            })
            .collect()
    }
}

impl ConnectorState {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get state for a stream
    pub fn get_stream(&self, descriptor: &StreamDescriptor) -> Option<&StreamState> {
        self.streams.get(descriptor)
    }

    /// Replace state for a stream
    pub fn set_stream(&mut self, descriptor: StreamDescriptor, state: StreamState) {
        self.streams.insert(descriptor, state);
    }

    /// Iterate over all stream states
    pub fn iter(&self) -> impl Iterator<Item = (&StreamDescriptor, &StreamState)> {
        self.streams.iter()
    }

    /// Number of streams with state
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// Whether no stream has state
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sentinel_state() {
        let state = sentinel_state();
        assert!(is_sentinel_state(&state));
        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            json!({"__ab_full_refresh_state_message": true})
        );

        let cursor = json!({"updated_at": 20}).as_object().cloned().unwrap();
        assert!(!is_sentinel_state(&cursor));
    }

    #[test]
    fn test_descriptor_display() {
        assert_eq!(StreamDescriptor::new("users", None).to_string(), "users");
        assert_eq!(
            StreamDescriptor::new("users", Some("public")).to_string(),
            "public.users"
        );
    }

    #[test]
    fn test_connector_state_streams_are_keyed_by_namespace() {
        let mut state = ConnectorState::new();
        let plain = StreamDescriptor::new("users", None);
        let namespaced = StreamDescriptor::new("users", Some("crm"));

        state.set_stream(plain.clone(), json!({"a": 1}).as_object().cloned().unwrap());
        state.set_stream(namespaced.clone(), json!({"b": 2}).as_object().cloned().unwrap());

        assert_eq!(state.len(), 2);
        assert_eq!(state.get_stream(&plain).unwrap()["a"], json!(1));
        assert_eq!(state.get_stream(&namespaced).unwrap()["b"], json!(2));
        assert!(state
            .get_stream(&StreamDescriptor::new("orders", None))
            .is_none());
        assert!(!state.is_empty());
    }

    #[test]
    fn test_connector_state_serialization() {
        let json = json!([
            {
                "stream_descriptor": {"name": "users"},
                "stream_state": {"updated_at": 20}
            },
            {
                "stream_descriptor": {"name": "orders", "namespace": "shop"},
                "stream_state": {"__ab_full_refresh_state_message": true}
            }
        ]);

        let state: ConnectorState = serde_json::from_value(json).unwrap();
        assert_eq!(state.len(), 2);

        let users = state
            .get_stream(&StreamDescriptor::new("users", None))
            .unwrap();
        assert_eq!(users["updated_at"], json!(20));

        let orders = state
            .get_stream(&StreamDescriptor::new("orders", Some("shop")))
            .unwrap();
        assert!(is_sentinel_state(orders));

        let restored: ConnectorState =
            serde_json::from_str(&serde_json::to_string(&state).unwrap()).unwrap();
        assert_eq!(restored, state);
    }
}
