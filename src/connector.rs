//! Source trait and multi-stream read orchestration
//!
//! A `Source` owns a set of streams. `SourceReader` reads the streams a
//! configured catalog selects, one after another, threading the persisted
//! state into each stream and turning stream failures into trace messages.

use crate::config::{Catalog, ConfiguredCatalog, ConfiguredStream};
use crate::engine::{Message, SliceLogger, StreamReader, SyncConfig, SyncStats};
use crate::error::{Error, Result};
use crate::state::{StateManager, StreamDescriptor};
use crate::stream::Stream;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

// ============================================================================
// Check Result
// ============================================================================

/// Result of a connection check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Whether the check succeeded
    pub success: bool,

    /// Error message if failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckResult {
    /// Create a successful check result
    pub fn success() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    /// Create a failed check result
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

// ============================================================================
// Source Trait
// ============================================================================

/// Type alias for the message stream returned by a read
pub type MessageStream<'a> = BoxStream<'a, Result<Message>>;

/// A set of streams read together
#[async_trait]
pub trait Source: Send + Sync {
    /// Source name
    fn name(&self) -> &str;

    /// Tests whether the source can be read
    async fn check(&self) -> Result<CheckResult>;

    /// The streams this source offers
    fn streams(&self) -> Vec<&dyn Stream>;

    /// Lists available streams
    ///
    /// Fails if any stream declares a malformed primary key.
    fn discover(&self) -> Result<Catalog> {
        let streams = self
            .streams()
            .into_iter()
            .map(|stream| stream.as_catalog_stream())
            .collect::<Result<Vec<_>>>()?;
        Ok(Catalog { streams })
    }
}

// ============================================================================
// Source Reader
// ============================================================================

struct CurrentStream<'a> {
    configured: &'a ConfiguredStream,
    stream: &'a dyn Stream,
    reader: StreamReader<'a>,
}

/// Reads the configured streams of a source in catalog order
pub struct SourceReader<'a> {
    streams: Vec<&'a dyn Stream>,
    catalog: &'a ConfiguredCatalog,
    state_manager: &'a StateManager,
    slice_logger: &'a dyn SliceLogger,
    config: SyncConfig,
    position: usize,
    current: Option<CurrentStream<'a>>,
    pending_error: Option<Error>,
    failed: Vec<String>,
    stats: SyncStats,
    done: bool,
}

impl<'a> SourceReader<'a> {
    /// Create a reader over the streams `catalog` selects from `source`
    pub fn new(
        source: &'a dyn Source,
        catalog: &'a ConfiguredCatalog,
        state_manager: &'a StateManager,
        slice_logger: &'a dyn SliceLogger,
        config: SyncConfig,
    ) -> Self {
        Self {
            streams: source.streams(),
            catalog,
            state_manager,
            slice_logger,
            config,
            position: 0,
            current: None,
            pending_error: None,
            failed: Vec::new(),
            stats: SyncStats::new(),
            done: false,
        }
    }

    /// Statistics of the finished streams
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Next message across all streams, `None` when the read is over
    pub async fn next_message(&mut self) -> Option<Result<Message>> {
        loop {
            if let Some(error) = self.pending_error.take() {
                self.done = true;
                return Some(Err(error));
            }
            if self.done {
                return None;
            }

            if let Some(current) = self.current.as_mut() {
                match current.reader.next_message().await {
                    Some(Ok(message)) => return Some(Ok(message)),
                    Some(Err(error)) => return Some(Ok(self.fail_current(error))),
                    None => self.finish_current(),
                }
                continue;
            }

            let catalog = self.catalog;
            let Some(configured) = catalog.streams.get(self.position) else {
                self.done = true;
                if self.failed.is_empty() {
                    return None;
                }
                return Some(Err(Error::StreamsFailed {
                    streams: std::mem::take(&mut self.failed),
                }));
            };
            self.position += 1;
            if let Some(skipped) = self.start(configured).await {
                return Some(Ok(skipped));
            }
        }
    }

    /// Turn the reader into a message stream
    pub fn into_stream(self) -> MessageStream<'a> {
        futures::stream::unfold(self, |mut reader| async move {
            reader.next_message().await.map(|message| (message, reader))
        })
        .boxed()
    }

    /// Set up the reader for `configured`, or a warning when the source lacks it
    async fn start(&mut self, configured: &'a ConfiguredStream) -> Option<Message> {
        let name = configured.stream.name.as_str();
        let namespace = configured.stream.namespace.as_deref();

        let Some(stream) = self
            .streams
            .iter()
            .copied()
            .find(|s| s.name() == name && s.namespace() == namespace)
        else {
            let error = Error::stream_not_found(name);
            tracing::warn!(error = %error, "Skipping stream missing from the source");
            return Some(Message::warn(format!("Skipping stream: {error}")));
        };

        let stream_state = self.state_manager.get_stream_state(name, namespace).await;
        if let Some(accessor) = stream.explicit_state() {
            accessor.set_state(stream_state.clone());
        }

        tracing::info!(stream = name, sync_mode = %configured.sync_mode, "Syncing stream");
        let reader = StreamReader::new(
            stream,
            configured,
            stream_state,
            self.state_manager,
            self.slice_logger,
            self.config.clone(),
        );
        self.current = Some(CurrentStream {
            configured,
            stream,
            reader,
        });
        None
    }

    fn finish_current(&mut self) {
        if let Some(current) = self.current.take() {
            let stats = current.reader.stats();
            tracing::info!(
                stream = current.configured.stream.name.as_str(),
                records = stats.records_synced,
                checkpoints = stats.checkpoints,
                "Finished syncing stream"
            );
            self.stats.merge(stats);
        }
    }

    fn fail_current(&mut self, error: Error) -> Message {
        let Some(current) = self.current.take() else {
            return Message::error(error.to_string());
        };
        let stream = current.stream;
        self.stats.merge(current.reader.stats());
        self.stats.add_error();
        self.failed.push(stream.name().to_string());

        let internal_message = error.to_string();
        let message = stream
            .error_display_message(&error)
            .unwrap_or_else(|| internal_message.clone());
        let trace = Message::trace(
            StreamDescriptor::new(stream.name(), stream.namespace()),
            message,
            internal_message,
        );

        if self.config.fail_fast {
            self.failed.clear();
            self.pending_error = Some(error);
        }
        trace
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::NeverLogSliceLogger;
    use crate::partition::StreamSlice;
    use crate::state::StreamState;
    use crate::stream::{CursorField, ExplicitState, PrimaryKey, RecordStream, StreamData};
    use crate::types::{JsonObject, LogLevel, SyncMode};
    use serde_json::json;
    use std::sync::Mutex;

    struct Numbers {
        name: &'static str,
        count: u64,
        fail: bool,
        state: Mutex<Option<StreamState>>,
    }

    impl Numbers {
        fn new(name: &'static str, count: u64) -> Self {
            Self {
                name,
                count,
                fail: false,
                state: Mutex::new(None),
            }
        }

        fn failing(name: &'static str) -> Self {
            Self {
                fail: true,
                ..Self::new(name, 1)
            }
        }
    }

    impl ExplicitState for Numbers {
        fn current_state(&self) -> Option<StreamState> {
            self.state.lock().unwrap().clone()
        }

        fn set_state(&self, state: StreamState) {
            *self.state.lock().unwrap() = Some(state);
        }
    }

    impl Stream for Numbers {
        fn name(&self) -> &str {
            self.name
        }

        fn primary_key(&self) -> PrimaryKey {
            PrimaryKey::single("n")
        }

        fn cursor_field(&self) -> CursorField {
            CursorField::from("n")
        }

        fn read_records(
            &self,
            _sync_mode: SyncMode,
            _cursor_field: Option<CursorField>,
            _slice: StreamSlice,
            stream_state: StreamState,
        ) -> RecordStream<'_> {
            if self.fail {
                return futures::stream::iter([Err(Error::read(self.name, "boom"))]).boxed();
            }
            let start = stream_state.get("n").and_then(|v| v.as_u64()).unwrap_or(0);
            let records: Vec<Result<StreamData>> = (start + 1..=start + self.count)
                .map(|n| Ok(json!({"n": n}).as_object().cloned().unwrap_or_default().into()))
                .collect();
            *self.state.lock().unwrap() = Some(
                json!({"n": start + self.count})
                    .as_object()
                    .cloned()
                    .unwrap_or_default(),
            );
            futures::stream::iter(records).boxed()
        }

        fn explicit_state(&self) -> Option<&dyn ExplicitState> {
            Some(self)
        }

        fn error_display_message(&self, _error: &Error) -> Option<String> {
            self.fail.then(|| format!("{} is unavailable", self.name))
        }
    }

    struct TestSource {
        streams: Vec<Numbers>,
    }

    #[async_trait]
    impl Source for TestSource {
        fn name(&self) -> &str {
            "test"
        }

        async fn check(&self) -> Result<CheckResult> {
            Ok(CheckResult::success())
        }

        fn streams(&self) -> Vec<&dyn Stream> {
            self.streams.iter().map(|s| s as &dyn Stream).collect()
        }
    }

    async fn read_all(
        source: &TestSource,
        catalog: &ConfiguredCatalog,
        manager: &StateManager,
        config: SyncConfig,
    ) -> Vec<Result<Message>> {
        SourceReader::new(source, catalog, manager, &NeverLogSliceLogger, config)
            .into_stream()
            .collect()
            .await
    }

    fn record_streams(messages: &[Result<Message>]) -> Vec<String> {
        messages
            .iter()
            .filter_map(|m| match m {
                Ok(Message::Record(record)) => Some(record.stream.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_check_result_success() {
        let result = CheckResult::success();
        assert!(result.success);
        assert!(result.message.is_none());
    }

    #[test]
    fn test_check_result_failure() {
        let result = CheckResult::failure("Connection failed");
        assert!(!result.success);
        assert_eq!(result.message, Some("Connection failed".to_string()));
    }

    #[test]
    fn test_discover_builds_catalog_from_streams() {
        let source = TestSource {
            streams: vec![Numbers::new("a", 1), Numbers::new("b", 1)],
        };
        let catalog = source.discover().unwrap();
        assert_eq!(catalog.streams.len(), 2);
        assert!(catalog.get("a").unwrap().supports(SyncMode::Incremental));
    }

    #[tokio::test]
    async fn test_reads_streams_in_catalog_order() {
        let source = TestSource {
            streams: vec![Numbers::new("a", 2), Numbers::new("b", 1)],
        };
        let mut catalog = ConfiguredCatalog::from_catalog(&source.discover().unwrap());
        catalog.streams.reverse();

        let manager = StateManager::in_memory();
        let messages = read_all(&source, &catalog, &manager, SyncConfig::default()).await;
        assert_eq!(record_streams(&messages), vec!["b", "a", "a"]);
        assert!(messages.iter().all(Result::is_ok));
    }

    #[tokio::test]
    async fn test_incoming_state_reaches_explicit_accessor() {
        let source = TestSource {
            streams: vec![Numbers::new("a", 2)],
        };
        let catalog = ConfiguredCatalog::from_catalog(&source.discover().unwrap());
        let manager = StateManager::from_json(
            r#"[{"stream_descriptor": {"name": "a"}, "stream_state": {"n": 5}}]"#,
        )
        .unwrap();

        let messages = read_all(&source, &catalog, &manager, SyncConfig::default()).await;
        let first: Vec<&JsonObject> = messages
            .iter()
            .filter_map(|m| m.as_ref().ok()?.as_record())
            .collect();
        assert_eq!(first[0].get("n"), Some(&json!(6)));
        assert_eq!(
            manager.get_stream_state("a", None).await.get("n"),
            Some(&json!(7))
        );
    }

    #[tokio::test]
    async fn test_missing_stream_is_skipped() {
        let source = TestSource {
            streams: vec![Numbers::new("a", 1)],
        };
        let mut catalog = ConfiguredCatalog::from_catalog(&source.discover().unwrap());
        let mut ghost = catalog.streams[0].clone();
        ghost.stream.name = "ghost".to_string();
        catalog.streams.insert(0, ghost);

        let manager = StateManager::in_memory();
        let messages = read_all(&source, &catalog, &manager, SyncConfig::default()).await;
        assert_eq!(record_streams(&messages), vec!["a"]);
        assert!(messages.iter().all(Result::is_ok));
        match &messages[0] {
            Ok(Message::Log(log)) => {
                assert_eq!(log.level, LogLevel::Warn);
                assert!(log.message.contains("ghost"));
            }
            other => panic!("expected a warning first, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failure_with_fail_fast_stops_read() {
        let source = TestSource {
            streams: vec![Numbers::failing("a"), Numbers::new("b", 1)],
        };
        let catalog = ConfiguredCatalog::from_catalog(&source.discover().unwrap());

        let manager = StateManager::in_memory();
        let messages = read_all(&source, &catalog, &manager, SyncConfig::default()).await;
        assert_eq!(messages.len(), 2);
        match &messages[0] {
            Ok(Message::Trace(trace)) => {
                assert_eq!(trace.stream.name, "a");
                assert_eq!(trace.message, "a is unavailable");
                assert!(trace.internal_message.contains("boom"));
            }
            other => panic!("expected trace, got {other:?}"),
        }
        assert!(matches!(messages[1], Err(Error::Read { .. })));
    }

    #[tokio::test]
    async fn test_failure_without_fail_fast_reads_remaining_streams() {
        let source = TestSource {
            streams: vec![Numbers::failing("a"), Numbers::new("b", 1)],
        };
        let catalog = ConfiguredCatalog::from_catalog(&source.discover().unwrap());
        let config = SyncConfig::new().with_fail_fast(false);

        let manager = StateManager::in_memory();
        let messages = read_all(&source, &catalog, &manager, config).await;
        assert_eq!(record_streams(&messages), vec!["b"]);
        match messages.last() {
            Some(Err(Error::StreamsFailed { streams })) => {
                assert_eq!(streams, &vec!["a".to_string()]);
            }
            other => panic!("expected StreamsFailed, got {other:?}"),
        }
    }
}
