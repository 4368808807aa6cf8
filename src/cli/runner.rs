//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::ConfiguredCatalog;
use crate::connector::{Source, SourceReader};
use crate::connectors::{load_source, JsonlSource};
use crate::engine::{AlwaysLogSliceLogger, DebugSliceLogger, SliceLogger, SyncConfig};
use crate::error::{Error, Result, ResultExt};
use crate::state::StateManager;
use serde::Serialize;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Options of the `read` command
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    pub catalog: Option<PathBuf>,
    pub streams: Option<String>,
    pub max_records: Option<usize>,
    pub log_slices: bool,
    pub continue_on_error: bool,
    pub state_out: Option<PathBuf>,
}

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Check => self.check().await,
            Commands::Discover => self.discover(),
            Commands::Read {
                catalog,
                streams,
                max_records,
                log_slices,
                continue_on_error,
                state_out,
            } => {
                let options = ReadOptions {
                    catalog: catalog.clone(),
                    streams: streams.clone(),
                    max_records: *max_records,
                    log_slices: *log_slices,
                    continue_on_error: *continue_on_error,
                    state_out: state_out.clone(),
                };
                self.read(&options).await
            }
        }
    }

    /// Load the source definition
    fn load_source(&self) -> Result<JsonlSource> {
        let path = self
            .cli
            .source
            .as_ref()
            .ok_or_else(|| Error::config("Source file not specified (use -S flag)"))?;
        load_source(path)
    }

    /// Load state
    fn load_state(&self) -> Result<StateManager> {
        // Inline state takes precedence
        if let Some(state_json) = &self.cli.state_json {
            StateManager::from_json(state_json)
        } else if let Some(path) = &self.cli.state {
            StateManager::from_file(path)
        } else {
            Ok(StateManager::in_memory())
        }
    }

    /// Check that the source's data is reachable
    async fn check(&self) -> Result<()> {
        let source = self.load_source()?;
        tracing::info!(source = source.name(), "Checking source");

        let result = source.check().await?;
        self.output_message(&json!({
            "type": "CONNECTION_STATUS",
            "connectionStatus": {
                "status": if result.success { "SUCCEEDED" } else { "FAILED" },
                "message": result.message
            }
        }))
    }

    /// Print the source catalog
    fn discover(&self) -> Result<()> {
        let source = self.load_source()?;
        let catalog = source.discover()?;
        self.output_message(&json!({
            "type": "CATALOG",
            "catalog": catalog
        }))
    }

    /// Read the configured streams
    async fn read(&self, options: &ReadOptions) -> Result<()> {
        let sync_start = Instant::now();
        let source = self.load_source()?;
        let state = self.load_state()?;
        let catalog = configured_catalog(
            &source,
            options.catalog.as_deref(),
            options.streams.as_deref(),
        )?;

        let mut config = SyncConfig::new().with_fail_fast(!options.continue_on_error);
        if let Some(max) = options.max_records {
            config = config.with_limit(max);
        }
        let slice_logger: Box<dyn SliceLogger> = if options.log_slices {
            Box::new(AlwaysLogSliceLogger)
        } else {
            Box::new(DebugSliceLogger)
        };

        let mut reader =
            SourceReader::new(&source, &catalog, &state, slice_logger.as_ref(), config);
        let mut failure = None;
        while let Some(result) = reader.next_message().await {
            match result {
                Ok(message) => self.output_message(&message)?,
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        // Persist whatever was checkpointed, even after a failure
        if let Some(path) = &options.state_out {
            state
                .save_to_file(path)
                .await
                .with_context(|| format!("Failed to write state to {}", path.display()))?;
        }

        let stats = reader.stats();
        self.output_message(&json!({
            "type": "SYNC_SUMMARY",
            "summary": {
                "status": if failure.is_none() { "SUCCEEDED" } else { "FAILED" },
                "source": source.name(),
                "total_records": stats.records_synced,
                "total_streams": stats.streams_synced,
                "slices_read": stats.slices_read,
                "checkpoints": stats.checkpoints,
                "failed_streams": stats.errors,
                "duration_ms": sync_start.elapsed().as_millis() as u64,
                "state_file": options
                    .state_out
                    .as_ref()
                    .or(self.cli.state.as_ref())
                    .map(|p| p.display().to_string())
            }
        }))?;

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Output a message
    fn output_message<T: Serialize>(&self, msg: &T) -> Result<()> {
        let line = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(msg)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(msg)?,
        };
        println!("{line}");
        Ok(())
    }
}

/// The catalog a read runs with
///
/// Loaded from `catalog` when given, otherwise built from the source's own
/// catalog. `streams` narrows either to the named streams.
pub fn configured_catalog(
    source: &dyn Source,
    catalog: Option<&Path>,
    streams: Option<&str>,
) -> Result<ConfiguredCatalog> {
    let configured = match catalog {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(|e| {
                Error::config(format!(
                    "Failed to read catalog file {}: {e}",
                    path.display()
                ))
            })?;
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid catalog file {}", path.display()))?
        }
        None => ConfiguredCatalog::from_catalog(&source.discover()?),
    };

    let Some(streams) = streams.filter(|s| !s.trim().is_empty()) else {
        return Ok(configured);
    };
    let names: Vec<&str> = streams.split(',').map(str::trim).collect();
    for name in &names {
        if !configured.streams.iter().any(|s| s.stream.name == *name) {
            tracing::warn!(stream = *name, "Requested stream is not in the catalog");
        }
    }
    Ok(configured.select(&names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::load_source_from_str;
    use crate::types::SyncMode;
    use pretty_assertions::assert_eq;

    fn source() -> JsonlSource {
        load_source_from_str(
            r"
name: shop
streams:
  - name: orders
    path: orders
    cursor_field: updated_at
  - name: events
    path: events.jsonl
",
        )
        .unwrap()
    }

    fn names(catalog: &ConfiguredCatalog) -> Vec<(&str, SyncMode)> {
        catalog
            .streams
            .iter()
            .map(|s| (s.stream.name.as_str(), s.sync_mode))
            .collect()
    }

    #[test]
    fn test_default_catalog_prefers_incremental() {
        let catalog = configured_catalog(&source(), None, None).unwrap();
        assert_eq!(
            names(&catalog),
            vec![
                ("orders", SyncMode::Incremental),
                ("events", SyncMode::FullRefresh)
            ]
        );
    }

    #[test]
    fn test_stream_filter() {
        let catalog = configured_catalog(&source(), None, Some("events, missing")).unwrap();
        assert_eq!(names(&catalog), vec![("events", SyncMode::FullRefresh)]);

        let catalog = configured_catalog(&source(), None, Some("")).unwrap();
        assert_eq!(catalog.streams.len(), 2);
    }

    #[test]
    fn test_catalog_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let mut catalog = ConfiguredCatalog::from_catalog(&source().discover().unwrap());
        catalog.streams[0].sync_mode = SyncMode::FullRefresh;
        fs::write(&path, serde_json::to_string(&catalog).unwrap()).unwrap();

        let loaded = configured_catalog(&source(), Some(&path), Some("orders")).unwrap();
        assert_eq!(names(&loaded), vec![("orders", SyncMode::FullRefresh)]);
    }

    #[test]
    fn test_missing_catalog_file() {
        let err = configured_catalog(&source(), Some(Path::new("/no/catalog.json")), None)
            .err()
            .unwrap();
        assert!(err.is_config_error());
    }
}
