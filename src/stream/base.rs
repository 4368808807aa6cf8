//! The stream capability contract
//!
//! A `Stream` is one synchronizable resource (a table, an endpoint, a set of
//! files). The stream reader asks it which checkpoint strategy applies, pulls
//! slices from it and delegates record fetching to it.

use super::types::{CursorField, PrimaryKey, RecordStream};
use crate::config::CatalogStream;
use crate::error::{Error, Result};
use crate::partition::{SliceStream, StreamSlice};
use crate::state::StreamState;
use crate::types::{JsonObject, JsonValue, SyncMode};
use futures::StreamExt;

/// Modern state contract: the stream manages its own progress state
///
/// Implemented with interior mutability, since records are read through a
/// shared borrow of the stream.
pub trait ExplicitState: Send + Sync {
    /// Current progress state, or `None` if not available right now
    fn current_state(&self) -> Option<StreamState>;

    /// Assign incoming state before a read
    fn set_state(&self, state: StreamState);
}

/// A synchronizable resource
pub trait Stream: Send + Sync {
    /// Stream name, unique within a source
    fn name(&self) -> &str;

    /// Optional grouping label (e.g. a database schema)
    fn namespace(&self) -> Option<&str> {
        None
    }

    /// Identity key of the stream's records
    fn primary_key(&self) -> PrimaryKey;

    /// Default cursor field; empty when the stream has none
    fn cursor_field(&self) -> CursorField {
        CursorField::default()
    }

    /// True iff a cursor field is declared
    fn supports_incremental(&self) -> bool {
        !self.cursor_field().is_empty()
    }

    /// Opt in to resumable full refresh (pagination state as a synthetic cursor)
    fn supports_resumable_full_refresh(&self) -> bool {
        false
    }

    /// Whether the cursor is fixed by the source; if so, configuration
    /// cannot override it
    fn source_defined_cursor(&self) -> bool {
        true
    }

    /// Record count after which state is checkpointed mid-slice
    ///
    /// `None` for sources that do not return records in cursor order: state
    /// is then only checkpointed at slice boundaries and at the end.
    fn state_checkpoint_interval(&self) -> Option<usize> {
        None
    }

    /// JSON schema of the stream's records
    fn json_schema(&self) -> JsonValue {
        JsonValue::Object(JsonObject::new())
    }

    /// Slices to read, in order. Defaults to a single whole-stream slice.
    fn stream_slices(
        &self,
        _sync_mode: SyncMode,
        _cursor_field: Option<&CursorField>,
        _stream_state: &StreamState,
    ) -> Result<SliceStream<'_>> {
        Ok(futures::stream::iter([Ok(StreamSlice::whole())]).boxed())
    }

    /// Read the records of one slice
    ///
    /// Must produce an empty stream rather than fail when there are no records.
    fn read_records(
        &self,
        sync_mode: SyncMode,
        cursor_field: Option<CursorField>,
        slice: StreamSlice,
        stream_state: StreamState,
    ) -> RecordStream<'_>;

    /// The explicit state capability, if the stream implements it
    fn explicit_state(&self) -> Option<&dyn ExplicitState> {
        None
    }

    /// Legacy state contract: derive updated state from the latest record
    ///
    /// Only takes effect when the explicit state accessor does not answer.
    /// Defaults to leaving the state unchanged.
    #[deprecated(note = "implement `ExplicitState` instead")]
    fn get_updated_state(
        &self,
        current_stream_state: &StreamState,
        _latest_record: &JsonObject,
    ) -> StreamState {
        current_stream_state.clone()
    }

    /// User-facing message for an error raised while reading this stream
    fn error_display_message(&self, _error: &Error) -> Option<String> {
        None
    }

    /// Materialize the stream's catalog descriptor
    ///
    /// Fails on a malformed primary key declaration.
    fn as_catalog_stream(&self) -> Result<CatalogStream> {
        let primary_key = self.primary_key();
        primary_key.validate()?;

        let mut supported_sync_modes = vec![SyncMode::FullRefresh];
        let mut source_defined_cursor = None;
        let mut default_cursor_field = None;

        // Resumable full refresh streams only advertise full refresh
        if !self.supports_resumable_full_refresh() && self.supports_incremental() {
            supported_sync_modes.push(SyncMode::Incremental);
            source_defined_cursor = Some(self.source_defined_cursor());
            default_cursor_field = Some(self.cursor_field());
        }

        Ok(CatalogStream {
            name: self.name().to_string(),
            namespace: self.namespace().map(ToString::to_string),
            json_schema: self.json_schema(),
            supported_sync_modes,
            source_defined_cursor,
            default_cursor_field,
            source_defined_primary_key: primary_key.wrapped(),
        })
    }
}
