//! JSON Lines file source
//!
//! Every stream reads one `.jsonl` file or a directory of them. Depending on
//! its definition a stream is read in one of three ways:
//!
//! - with a cursor field: one slice per file, incremental reads skip records
//!   at or below the incoming cursor and the stream reports the highest
//!   cursor seen
//! - with a page size: resumable full refresh, `{"offset": n}` is the
//!   pagination state, advanced with every record
//! - otherwise: plain full refresh, one slice per file

use super::definition::{SourceDefinition, StreamDefinition};
use crate::connector::{CheckResult, Source};
use crate::error::{Error, Result};
use crate::partition::{ListRouter, SliceStream, StreamSlice};
use crate::state::StreamState;
use crate::stream::{CursorField, ExplicitState, PrimaryKey, RecordStream, Stream, StreamData};
use crate::types::{get_path, JsonObject, JsonValue, SyncMode};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tokio::io::{AsyncBufReadExt, BufReader, Lines};

const FILE_PARTITION_FIELD: &str = "file";
const OFFSET_KEY: &str = "offset";

// ============================================================================
// Source
// ============================================================================

/// A source reading JSON Lines files
pub struct JsonlSource {
    name: String,
    streams: Vec<JsonlStream>,
}

impl JsonlSource {
    /// Build a source from a validated definition
    pub fn new(definition: SourceDefinition) -> Result<Self> {
        definition.validate()?;
        Ok(Self {
            name: definition.name,
            streams: definition.streams.into_iter().map(JsonlStream::new).collect(),
        })
    }

    /// Find a stream by name
    pub fn stream(&self, name: &str) -> Option<&JsonlStream> {
        self.streams.iter().find(|s| s.definition.name == name)
    }
}

#[async_trait]
impl Source for JsonlSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> Result<CheckResult> {
        let missing: Vec<String> = self
            .streams
            .iter()
            .filter(|s| !s.definition.path.exists())
            .map(|s| format!("{} ({})", s.definition.name, s.definition.path.display()))
            .collect();

        if missing.is_empty() {
            Ok(CheckResult::success())
        } else {
            Ok(CheckResult::failure(format!(
                "Paths not found: {}",
                missing.join(", ")
            )))
        }
    }

    fn streams(&self) -> Vec<&dyn Stream> {
        self.streams.iter().map(|s| s as &dyn Stream).collect()
    }
}

// ============================================================================
// Stream
// ============================================================================

/// One stream of a JSON Lines source
pub struct JsonlStream {
    definition: StreamDefinition,
    state: Mutex<Option<StreamState>>,
}

impl JsonlStream {
    /// Create a stream from its definition
    pub fn new(definition: StreamDefinition) -> Self {
        Self {
            definition,
            state: Mutex::new(None),
        }
    }

    fn is_resumable(&self) -> bool {
        self.definition.page_size.is_some() && self.definition.cursor_field.is_empty()
    }

    fn has_cursor(&self) -> bool {
        !self.definition.cursor_field.is_empty()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, Option<StreamState>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Files of the stream, sorted by name
    fn files(&self) -> Result<Vec<PathBuf>> {
        let path = &self.definition.path;
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        if !path.is_dir() {
            return Ok(vec![path.clone()]);
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let file = entry?.path();
            if file.is_file() && file.extension().is_some_and(|ext| ext == "jsonl") {
                files.push(file);
            }
        }
        files.sort();
        Ok(files)
    }

    fn resolve(&self, file: &str) -> PathBuf {
        if self.definition.path.is_dir() {
            self.definition.path.join(file)
        } else {
            self.definition.path.clone()
        }
    }

    /// Raise the reported cursor if `record` is past it
    fn observe_cursor(&self, record: &JsonObject) {
        let cursor = &self.definition.cursor_field;
        let Some(value) = get_path(record, cursor.path()) else {
            return;
        };

        let key = cursor.dotted();
        let mut state = self.lock_state();
        let state = state.get_or_insert_with(StreamState::new);
        let advanced = match state.get(&key) {
            Some(seen) => compare_cursor(value, seen) == Some(Ordering::Greater),
            None => true,
        };
        if advanced {
            state.insert(key, value.clone());
        }
    }

    fn report(&self, state: StreamState) {
        *self.lock_state() = Some(state);
    }

    fn read_file_slice(
        &self,
        sync_mode: SyncMode,
        slice: &StreamSlice,
        stream_state: &StreamState,
    ) -> RecordStream<'_> {
        let Some(file) = slice.get_str(FILE_PARTITION_FIELD) else {
            let error = Error::read(&self.definition.name, "slice does not name a file");
            return futures::stream::iter([Err(error)]).boxed();
        };
        let records = file_records(self.resolve(file));

        if !self.has_cursor() {
            return records.map_ok(StreamData::from).boxed();
        }

        let cursor = &self.definition.cursor_field;
        let threshold = if sync_mode.is_incremental() {
            stream_state.get(&cursor.dotted()).cloned()
        } else {
            None
        };

        records
            .try_filter(move |record| {
                let keep = match (&threshold, get_path(record, cursor.path())) {
                    (Some(threshold), Some(value)) => !matches!(
                        compare_cursor(value, threshold),
                        Some(Ordering::Less | Ordering::Equal)
                    ),
                    _ => true,
                };
                futures::future::ready(keep)
            })
            .inspect_ok(move |record| self.observe_cursor(record))
            .map_ok(StreamData::from)
            .boxed()
    }

    fn read_page(&self, slice: &StreamSlice, page_size: usize) -> RecordStream<'_> {
        let offset = slice
            .get(OFFSET_KEY)
            .and_then(JsonValue::as_u64)
            .unwrap_or(0) as usize;
        let files = match self.files() {
            Ok(files) => files,
            Err(error) => return futures::stream::iter([Err(error)]).boxed(),
        };

        let mut skipped = 0;
        let records = futures::stream::iter(files)
            .map(file_records)
            .flatten()
            .try_skip_while(move |_| {
                skipped += 1;
                futures::future::ready(Ok(skipped <= offset))
            })
            .boxed();

        futures::stream::try_unfold((records, 0), move |(mut records, emitted)| async move {
            match records.try_next().await? {
                Some(record) if emitted < page_size => {
                    // A read cut short mid-page resumes after the last record handed out
                    self.report(offset_state(offset + emitted + 1));
                    Ok(Some((StreamData::from(record), (records, emitted + 1))))
                }
                Some(_) => {
                    self.report(offset_state(offset + page_size));
                    Ok(None)
                }
                None => {
                    self.report(StreamState::new());
                    Ok(None)
                }
            }
        })
        .boxed()
    }
}

impl ExplicitState for JsonlStream {
    fn current_state(&self) -> Option<StreamState> {
        self.lock_state().clone()
    }

    fn set_state(&self, state: StreamState) {
        self.report(state);
    }
}

impl Stream for JsonlStream {
    fn name(&self) -> &str {
        &self.definition.name
    }

    fn namespace(&self) -> Option<&str> {
        self.definition.namespace.as_deref()
    }

    fn primary_key(&self) -> PrimaryKey {
        self.definition.primary_key.clone()
    }

    fn cursor_field(&self) -> CursorField {
        self.definition.cursor_field.clone()
    }

    fn supports_resumable_full_refresh(&self) -> bool {
        self.is_resumable()
    }

    fn state_checkpoint_interval(&self) -> Option<usize> {
        self.definition.checkpoint_interval
    }

    fn stream_slices(
        &self,
        _sync_mode: SyncMode,
        _cursor_field: Option<&CursorField>,
        _stream_state: &StreamState,
    ) -> Result<SliceStream<'_>> {
        let names = self
            .files()?
            .iter()
            .filter_map(|file| file.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect();
        Ok(ListRouter::new(names, FILE_PARTITION_FIELD).into_slices())
    }

    fn read_records(
        &self,
        sync_mode: SyncMode,
        _cursor_field: Option<CursorField>,
        slice: StreamSlice,
        stream_state: StreamState,
    ) -> RecordStream<'_> {
        match self.definition.page_size.filter(|_| self.is_resumable()) {
            Some(page_size) => self.read_page(&slice, page_size),
            None => self.read_file_slice(sync_mode, &slice, &stream_state),
        }
    }

    fn explicit_state(&self) -> Option<&dyn ExplicitState> {
        (self.has_cursor() || self.is_resumable()).then_some(self as &dyn ExplicitState)
    }

    fn error_display_message(&self, error: &Error) -> Option<String> {
        match error {
            Error::Decode { .. } => Some(format!(
                "Stream '{}' contains a line that is not a JSON object",
                self.definition.name
            )),
            Error::FileNotFound { path } => Some(format!(
                "Stream '{}' has no data at {path}",
                self.definition.name
            )),
            _ => None,
        }
    }
}

// ============================================================================
// Line Decoding
// ============================================================================

fn offset_state(offset: usize) -> StreamState {
    let mut state = StreamState::new();
    state.insert(OFFSET_KEY.to_string(), JsonValue::from(offset));
    state
}

/// Order of two cursor values; `None` when they are not comparable
fn compare_cursor(a: &JsonValue, b: &JsonValue) -> Option<Ordering> {
    match (a, b) {
        (JsonValue::Number(a), JsonValue::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (JsonValue::String(a), JsonValue::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

struct LineReader {
    path: PathBuf,
    lines: Option<Lines<BufReader<tokio::fs::File>>>,
    line_number: usize,
}

impl LineReader {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            lines: None,
            line_number: 0,
        }
    }

    async fn next_record(&mut self) -> Result<Option<JsonObject>> {
        if self.lines.is_none() {
            self.lines = Some(open_lines(&self.path).await?);
        }
        let Some(lines) = self.lines.as_mut() else {
            return Ok(None);
        };

        while let Some(line) = lines.next_line().await? {
            self.line_number += 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            return match serde_json::from_str(line) {
                Ok(JsonValue::Object(record)) => Ok(Some(record)),
                Ok(other) => Err(self.decode_error(format!("expected a JSON object, got {other}"))),
                Err(e) => Err(self.decode_error(e)),
            };
        }
        Ok(None)
    }

    fn decode_error(&self, message: impl std::fmt::Display) -> Error {
        Error::decode(format!(
            "{}:{}: {message}",
            self.path.display(),
            self.line_number
        ))
    }
}

async fn open_lines(path: &Path) -> Result<Lines<BufReader<tokio::fs::File>>> {
    let file = tokio::fs::File::open(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Error::Io(e)
        }
    })?;
    Ok(BufReader::new(file).lines())
}

/// Lazily decoded records of one file
fn file_records(path: PathBuf) -> BoxStream<'static, Result<JsonObject>> {
    futures::stream::try_unfold(LineReader::new(path), |mut reader| async move {
        let record = reader.next_record().await?;
        Ok(record.map(|record| (record, reader)))
    })
    .boxed()
}
