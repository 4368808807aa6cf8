//! The per-stream synchronization loop

use super::reconcile::{explicit_state, reconcile};
use super::slice_logger::SliceLogger;
use super::types::{Message, SyncConfig, SyncStats};
use crate::checkpoint::CheckpointReader;
use crate::config::ConfiguredStream;
use crate::error::Result;
use crate::state::{sentinel_state, StateManager, StreamState};
use crate::stream::{CursorField, RecordStream, Stream, StreamData};
use crate::types::{JsonObject, SyncMode};
use futures::stream::BoxStream;
use futures::StreamExt;
use std::time::Instant;

enum Phase<'a> {
    /// Pull the next slice from the checkpoint reader
    NextSlice,
    /// Emit the records of the current slice
    Records(RecordStream<'a>),
    /// Checkpoint the completed slice
    Boundary,
    /// Post-loop checkpoint
    Final,
    Done,
}

/// Reads one stream, interleaving its records with state checkpoints
///
/// Pull-based: nothing is read until [`next_message`](Self::next_message) is
/// awaited, and at most one record is held at a time. Bookkeeping for a
/// record (state derivation, interval checkpoints, the record limit) happens
/// on the pull after the record was handed out.
pub struct StreamReader<'a> {
    stream: &'a dyn Stream,
    sync_mode: SyncMode,
    cursor_field: Option<CursorField>,
    state_manager: &'a StateManager,
    slice_logger: &'a dyn SliceLogger,
    config: SyncConfig,
    /// State the read started from; every slice is read against it
    incoming_state: StreamState,
    /// Running snapshot, advanced by legacy state derivation
    stream_state: StreamState,
    reader: CheckpointReader<'a>,
    phase: Phase<'a>,
    pending_record: Option<JsonObject>,
    derives_cursor_state: bool,
    checkpoint_interval: Option<usize>,
    has_slices: bool,
    limit_reached: bool,
    record_counter: usize,
    stats: SyncStats,
    started: Instant,
}

impl<'a> StreamReader<'a> {
    /// Prepare a read of `stream` as configured
    ///
    /// The checkpoint strategy is fixed here for the whole read.
    pub fn new(
        stream: &'a dyn Stream,
        configured: &ConfiguredStream,
        stream_state: StreamState,
        state_manager: &'a StateManager,
        slice_logger: &'a dyn SliceLogger,
        config: SyncConfig,
    ) -> Self {
        let sync_mode = configured.sync_mode;
        let cursor_field = effective_cursor_field(stream, configured.cursor_field.as_ref());
        let resumable = stream.supports_resumable_full_refresh();

        let reader = if resumable {
            let mut reader = CheckpointReader::resumable_full_refresh();
            // Resume from whatever the stream was handed before the read
            reader.observe(explicit_state(stream).filter(|state| !state.is_empty()));
            reader
        } else {
            tracing::debug!(
                stream = stream.name(),
                sync_mode = %sync_mode,
                "Processing stream slices"
            );
            let slices = stream
                .stream_slices(sync_mode, cursor_field.as_ref(), &stream_state)
                .unwrap_or_else(|e| futures::stream::once(async move { Err(e) }).boxed());
            CheckpointReader::incremental(slices)
        };

        Self {
            stream,
            sync_mode,
            cursor_field,
            state_manager,
            slice_logger,
            config,
            incoming_state: stream_state.clone(),
            stream_state,
            reader,
            phase: Phase::NextSlice,
            pending_record: None,
            derives_cursor_state: stream.supports_incremental() && !resumable,
            checkpoint_interval: stream.state_checkpoint_interval().filter(|n| *n > 0),
            has_slices: false,
            limit_reached: false,
            record_counter: 0,
            stats: SyncStats::new(),
            started: Instant::now(),
        }
    }

    /// Statistics of the read so far
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// The running state snapshot
    pub fn stream_state(&self) -> &StreamState {
        &self.stream_state
    }

    /// Next message of the read, `None` once the stream is complete
    ///
    /// After an error nothing more is produced.
    pub async fn next_message(&mut self) -> Option<Result<Message>> {
        match self.advance().await {
            Ok(Some(message)) => Some(Ok(message)),
            Ok(None) => None,
            Err(e) => {
                tracing::error!(stream = self.stream.name(), error = %e, "Stream read failed");
                self.phase = Phase::Done;
                self.pending_record = None;
                Some(Err(e))
            }
        }
    }

    /// Turn the reader into a message stream
    pub fn into_stream(self) -> BoxStream<'a, Result<Message>> {
        futures::stream::unfold(self, |mut reader| async move {
            reader.next_message().await.map(|message| (message, reader))
        })
        .boxed()
    }

    async fn advance(&mut self) -> Result<Option<Message>> {
        loop {
            match std::mem::replace(&mut self.phase, Phase::Done) {
                Phase::NextSlice => {
                    let Some(slice) = self.reader.next().await? else {
                        self.phase = Phase::Final;
                        continue;
                    };

                    self.has_slices = true;
                    self.stats.add_slice();
                    tracing::debug!(stream = self.stream.name(), slice = ?slice, "Reading slice");

                    let trace = if self.slice_logger.should_log_slice() {
                        Some(self.slice_logger.create_slice_message(self.stream.name(), &slice))
                    } else {
                        None
                    };

                    let records = self.stream.read_records(
                        self.sync_mode,
                        self.cursor_field.clone(),
                        slice,
                        self.incoming_state.clone(),
                    );
                    self.phase = Phase::Records(records);

                    if let Some(message) = trace {
                        return Ok(Some(message));
                    }
                }
                Phase::Records(mut records) => {
                    if let Some(record) = self.pending_record.take() {
                        let checkpoint = self.after_record(&record).await?;
                        self.phase = if self.config.is_limit_reached(self.record_counter) {
                            tracing::debug!(
                                stream = self.stream.name(),
                                records = self.record_counter,
                                "Record limit reached, ending slice"
                            );
                            self.limit_reached = true;
                            Phase::Boundary
                        } else {
                            Phase::Records(records)
                        };
                        if let Some(message) = checkpoint {
                            return Ok(Some(message));
                        }
                        continue;
                    }

                    match records.next().await {
                        Some(Ok(item)) => {
                            self.phase = Phase::Records(records);
                            return Ok(Some(self.emit(item)));
                        }
                        Some(Err(e)) => return Err(e),
                        None => self.phase = Phase::Boundary,
                    }
                }
                Phase::Boundary => {
                    let message = self.slice_checkpoint().await?;
                    // A truncated page would be handed out again, so pagination stops here
                    let truncated_page =
                        self.limit_reached && self.reader.is_resumable_full_refresh();
                    self.phase = if self.reader.has_next() && !truncated_page {
                        Phase::NextSlice
                    } else {
                        Phase::Final
                    };
                    return Ok(Some(message));
                }
                Phase::Final => {
                    self.stats.add_stream();
                    self.stats.set_duration(self.started.elapsed().as_millis() as u64);
                    if let Some(message) = self.final_checkpoint().await? {
                        return Ok(Some(message));
                    }
                }
                Phase::Done => return Ok(None),
            }
        }
    }

    fn emit(&mut self, item: StreamData) -> Message {
        if let Some(data) = item.record_data() {
            self.pending_record = Some(data.clone());
        }
        match item {
            StreamData::Data(data) => {
                Message::record(self.stream.name(), self.stream.namespace(), data)
            }
            StreamData::Message(message) => message,
        }
    }

    /// Bookkeeping for a record the consumer has already seen
    async fn after_record(&mut self, record: &JsonObject) -> Result<Option<Message>> {
        if self.derives_cursor_state {
            #[allow(deprecated)]
            let derived = self.stream.get_updated_state(&self.stream_state, record);
            self.stream_state = derived;
            self.reader.observe(reconcile(self.stream, Some(&self.stream_state)));
        }

        self.record_counter += 1;
        self.stats.add_record();

        // Interval checkpoints only apply to incremental reads
        if !self.sync_mode.is_incremental() {
            return Ok(None);
        }
        match self.checkpoint_interval {
            Some(interval) if self.record_counter % interval == 0 => {
                let state = reconcile(self.stream, Some(&self.stream_state)).unwrap_or_default();
                self.checkpoint(state).await.map(Some)
            }
            _ => Ok(None),
        }
    }

    async fn slice_checkpoint(&mut self) -> Result<Message> {
        self.reader.observe(explicit_state(self.stream));
        let state = self
            .reader
            .read_state()
            .cloned()
            .unwrap_or_else(|| self.stream_state.clone());
        self.checkpoint(state).await
    }

    /// Streams without slices and full refresh reads always end on a checkpoint
    async fn final_checkpoint(&mut self) -> Result<Option<Message>> {
        if self.has_slices && self.sync_mode.is_incremental() {
            return Ok(None);
        }

        let state = reconcile(self.stream, Some(&self.stream_state)).unwrap_or_default();
        let state = if state.is_empty()
            && !self.sync_mode.is_incremental()
            && !self.reader.is_resumable_full_refresh()
        {
            sentinel_state()
        } else {
            state
        };
        self.checkpoint(state).await.map(Some)
    }

    async fn checkpoint(&mut self, state: StreamState) -> Result<Message> {
        tracing::debug!(stream = self.stream.name(), state = ?state, "Checkpointing state");
        let message = self
            .state_manager
            .checkpoint(self.stream.name(), self.stream.namespace(), state)
            .await?;
        self.stats.add_checkpoint();
        Ok(message)
    }
}

/// The cursor a read uses: the configured override unless the source fixes it
fn effective_cursor_field(
    stream: &dyn Stream,
    configured: Option<&CursorField>,
) -> Option<CursorField> {
    let configured = configured.filter(|field| !field.is_empty());
    let cursor_field = match configured {
        Some(field) if stream.source_defined_cursor() => {
            if *field != stream.cursor_field() {
                tracing::warn!(
                    stream = stream.name(),
                    configured = %field.dotted(),
                    "Ignoring configured cursor field, the cursor is defined by the source"
                );
            }
            stream.cursor_field()
        }
        Some(field) => field.clone(),
        None => stream.cursor_field(),
    };
    (!cursor_field.is_empty()).then_some(cursor_field)
}
