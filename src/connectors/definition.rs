//! YAML definition of a JSON Lines source

use crate::error::{Error, Result};
use crate::stream::{CursorField, PrimaryKey};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// A source definition file
///
/// ```yaml
/// name: shop
/// streams:
///   - name: orders
///     path: data/orders
///     primary_key: id
///     cursor_field: updated_at
///     checkpoint_interval: 1000
///   - name: products
///     path: data/products.jsonl
///     page_size: 500
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDefinition {
    /// Source name
    pub name: String,

    /// Stream definitions
    #[serde(default)]
    pub streams: Vec<StreamDefinition>,
}

/// One stream of a source definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamDefinition {
    /// Stream name
    pub name: String,

    /// A `.jsonl` file, or a directory of them
    pub path: PathBuf,

    /// Optional namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Identity key: a field, a list of fields, or a list of field paths
    #[serde(default)]
    pub primary_key: PrimaryKey,

    /// Field ordering the records, enables incremental reads
    #[serde(default)]
    pub cursor_field: CursorField,

    /// Checkpoint every N records during incremental reads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_interval: Option<usize>,

    /// Read full refreshes in resumable pages of this many records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
}

impl SourceDefinition {
    /// Parse a definition from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let definition: Self = serde_yaml::from_str(yaml)?;
        definition.validate()?;
        Ok(definition)
    }

    /// Check the definition for configuration errors
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::missing_field("name"));
        }

        let mut seen = HashSet::new();
        for stream in &self.streams {
            stream.validate()?;
            if !seen.insert((stream.namespace.as_deref(), stream.name.as_str())) {
                return Err(Error::config(format!(
                    "Duplicate stream '{}' in source '{}'",
                    stream.name, self.name
                )));
            }
        }
        Ok(())
    }

    /// Resolve relative stream paths against `base`
    #[must_use]
    pub fn relative_to(mut self, base: &Path) -> Self {
        for stream in &mut self.streams {
            if stream.path.is_relative() {
                stream.path = base.join(&stream.path);
            }
        }
        self
    }
}

impl StreamDefinition {
    /// Check the stream definition for configuration errors
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::missing_field("streams[].name"));
        }
        self.primary_key.validate()?;

        match self.page_size {
            Some(0) => Err(Error::config(format!(
                "Stream '{}': page_size must be positive",
                self.name
            ))),
            Some(_) if !self.cursor_field.is_empty() => Err(Error::config(format!(
                "Stream '{}': page_size and cursor_field cannot be combined",
                self.name
            ))),
            _ => Ok(()),
        }
    }
}
