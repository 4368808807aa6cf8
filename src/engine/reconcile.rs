//! Legacy state reconciliation
//!
//! Streams either manage their own state through [`ExplicitState`] or derive
//! it record by record through the deprecated `get_updated_state`. The engine
//! always prefers the former and falls back to whatever snapshot it tracks.
//!
//! [`ExplicitState`]: crate::stream::ExplicitState

use crate::state::StreamState;
use crate::stream::Stream;

/// The stream's explicit state when it answers, else `fallback`
///
/// Queried fresh on every call: a stream may start answering partway through
/// a read.
pub fn reconcile(stream: &dyn Stream, fallback: Option<&StreamState>) -> Option<StreamState> {
    stream
        .explicit_state()
        .and_then(|accessor| accessor.current_state())
        .or_else(|| fallback.cloned())
}

/// The stream's explicit state, without fallback
pub fn explicit_state(stream: &dyn Stream) -> Option<StreamState> {
    reconcile(stream, None)
}
