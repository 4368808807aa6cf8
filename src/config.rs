//! Catalog configuration types
//!
//! The discovered catalog describes what a source offers; the configured
//! catalog selects streams and sync modes for one sync.

use crate::stream::CursorField;
use crate::types::SyncMode;
use serde::{Deserialize, Serialize};

// ============================================================================
// Catalog Types
// ============================================================================

/// Discovered catalog (available streams)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    /// Available streams
    pub streams: Vec<CatalogStream>,
}

impl Catalog {
    /// Find a stream by name
    pub fn get(&self, name: &str) -> Option<&CatalogStream> {
        self.streams.iter().find(|s| s.name == name)
    }
}

/// Stream in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogStream {
    /// Stream name
    pub name: String,

    /// Stream namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// JSON schema for the stream
    #[serde(default)]
    pub json_schema: serde_json::Value,

    /// Supported sync modes
    #[serde(default)]
    pub supported_sync_modes: Vec<SyncMode>,

    /// Whether the cursor is fixed by the source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_defined_cursor: Option<bool>,

    /// Default cursor field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_cursor_field: Option<CursorField>,

    /// Source-defined primary key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_defined_primary_key: Option<Vec<Vec<String>>>,
}

impl CatalogStream {
    /// Whether the stream can be read incrementally
    pub fn supports(&self, mode: SyncMode) -> bool {
        self.supported_sync_modes.contains(&mode)
    }
}

/// Configured catalog (selected streams for sync)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfiguredCatalog {
    /// Selected streams
    pub streams: Vec<ConfiguredStream>,
}

impl ConfiguredCatalog {
    /// Configure every stream of a catalog, preferring incremental
    pub fn from_catalog(catalog: &Catalog) -> Self {
        Self {
            streams: catalog
                .streams
                .iter()
                .cloned()
                .map(|stream| {
                    let sync_mode = if stream.supports(SyncMode::Incremental) {
                        SyncMode::Incremental
                    } else {
                        SyncMode::FullRefresh
                    };
                    ConfiguredStream::new(stream, sync_mode)
                })
                .collect(),
        }
    }

    /// Keep only the named streams
    #[must_use]
    pub fn select(mut self, names: &[&str]) -> Self {
        self.streams.retain(|s| names.contains(&s.stream.name.as_str()));
        self
    }
}

/// Configured stream for sync
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfiguredStream {
    /// Stream reference
    pub stream: CatalogStream,

    /// Selected sync mode
    #[serde(default)]
    pub sync_mode: SyncMode,

    /// Cursor field override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor_field: Option<CursorField>,

    /// Primary key to use
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<Vec<Vec<String>>>,
}

impl ConfiguredStream {
    /// Configure a stream with a sync mode
    pub fn new(stream: CatalogStream, sync_mode: SyncMode) -> Self {
        Self {
            stream,
            sync_mode,
            cursor_field: None,
            primary_key: None,
        }
    }

    /// Override the cursor field
    #[must_use]
    pub fn with_cursor_field(mut self, cursor_field: impl Into<CursorField>) -> Self {
        self.cursor_field = Some(cursor_field.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog_stream(name: &str, modes: Vec<SyncMode>) -> CatalogStream {
        CatalogStream {
            name: name.to_string(),
            namespace: None,
            json_schema: json!({}),
            supported_sync_modes: modes,
            source_defined_cursor: None,
            default_cursor_field: None,
            source_defined_primary_key: None,
        }
    }

    #[test]
    fn test_configured_catalog_prefers_incremental() {
        let catalog = Catalog {
            streams: vec![
                catalog_stream(
                    "customers",
                    vec![SyncMode::FullRefresh, SyncMode::Incremental],
                ),
                catalog_stream("orders", vec![SyncMode::FullRefresh]),
            ],
        };

        let configured = ConfiguredCatalog::from_catalog(&catalog);
        assert_eq!(configured.streams.len(), 2);
        assert_eq!(configured.streams[0].sync_mode, SyncMode::Incremental);
        assert_eq!(configured.streams[1].sync_mode, SyncMode::FullRefresh);

        let selected = configured.select(&["orders"]);
        assert_eq!(selected.streams.len(), 1);
        assert_eq!(selected.streams[0].stream.name, "orders");
    }

    #[test]
    fn test_parse_configured_catalog() {
        let json = json!({
            "streams": [{
                "stream": {
                    "name": "users",
                    "json_schema": {},
                    "supported_sync_modes": ["full_refresh", "incremental"],
                    "default_cursor_field": ["updated_at"],
                    "source_defined_primary_key": [["id"]]
                },
                "sync_mode": "incremental",
                "cursor_field": "modified"
            }]
        });

        let catalog: ConfiguredCatalog = serde_json::from_value(json).unwrap();
        let stream = &catalog.streams[0];
        assert_eq!(stream.sync_mode, SyncMode::Incremental);
        assert_eq!(stream.cursor_field, Some(CursorField::from("modified")));
        assert_eq!(
            stream.stream.default_cursor_field,
            Some(CursorField::from("updated_at"))
        );
        assert!(stream.stream.supports(SyncMode::Incremental));
    }

    #[test]
    fn test_catalog_get() {
        let catalog = Catalog {
            streams: vec![catalog_stream("users", vec![SyncMode::FullRefresh])],
        };
        assert!(catalog.get("users").is_some());
        assert!(catalog.get("missing").is_none());
    }
}
