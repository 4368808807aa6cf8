//! Built-in sources
//!
//! # Overview
//!
//! The connectors module provides:
//! - `JsonlSource` / `JsonlStream` - Streams over JSON Lines files
//! - `SourceDefinition` - The YAML definition they are loaded from
//! - `load_source` - Load a source definition file

mod definition;
mod jsonl;

pub use definition::{SourceDefinition, StreamDefinition};
pub use jsonl::{JsonlSource, JsonlStream};

use crate::error::{Error, Result};
use std::path::Path;

/// Load a source from a YAML file
///
/// Relative stream paths are resolved against the file's directory.
pub fn load_source<P: AsRef<Path>>(path: P) -> Result<JsonlSource> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Error::Io(e)
        }
    })?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let definition = SourceDefinition::from_yaml(&content)?.relative_to(base);
    JsonlSource::new(definition)
}

/// Load a source from a YAML string
pub fn load_source_from_str(yaml: &str) -> Result<JsonlSource> {
    JsonlSource::new(SourceDefinition::from_yaml(yaml)?)
}
