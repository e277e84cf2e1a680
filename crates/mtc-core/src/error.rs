// ── Core error types ──
//
// Typed failures returned by probe, current, and sample cycles. None of
// these are ambient: every one is handed back to the caller of the
// operation that produced it. Transport failures arrive wrapped from
// `mtc_api::Error`.

use thiserror::Error;

use crate::session::SessionState;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Probe errors (session stays Unprobed) ────────────────────────
    #[error("Malformed probe response: {reason}")]
    MalformedProbeResponse { reason: String },

    #[error("Duplicate data item id '{id}' in probe response")]
    DuplicateDataItemId { id: String },

    // ── Stream errors (cursor untouched) ─────────────────────────────
    #[error("Malformed stream response: {reason}")]
    MalformedStreamResponse { reason: String },

    #[error("Invalid timestamp '{value}' on data item '{data_item_id}'")]
    MalformedTimestamp { data_item_id: String, value: String },

    #[error("Agent reported {code}: {message}")]
    AgentError { code: String, message: String },

    // ── Apply errors (cursor advanced, batch partially applied) ──────
    /// A stream update referenced an id the probe never produced.
    ///
    /// Updates ordered before the offending one were applied and the
    /// cursor was advanced to `last_sequence`.
    #[error("Unknown data item id '{id}' ({applied} update(s) applied before it)")]
    UnknownDataItemId {
        id: String,
        applied: usize,
        last_sequence: u64,
    },

    // ── Caller errors (no state change) ──────────────────────────────
    #[error("Agent has not been probed yet")]
    NotProbed,

    #[error("No data item with id '{id}'")]
    DataItemNotFound { id: String },

    #[error("Buffer size for data item '{id}' must be at least 1")]
    InvalidBufferSize { id: String },

    #[error("Cannot {operation} while session is {state}")]
    InvalidTransition {
        state: SessionState,
        operation: &'static str,
    },

    // ── Transport ────────────────────────────────────────────────────
    #[error("Fetch failed: {0}")]
    Fetch(#[from] mtc_api::Error),

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub(crate) fn malformed_probe(reason: impl Into<String>) -> Self {
        Self::MalformedProbeResponse {
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed_stream(reason: impl Into<String>) -> Self {
        Self::MalformedStreamResponse {
            reason: reason.into(),
        }
    }

    /// Returns `true` if the failure is confined to one cycle and the
    /// polling schedule should keep running.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MalformedStreamResponse { .. }
                | Self::MalformedTimestamp { .. }
                | Self::AgentError { .. }
                | Self::UnknownDataItemId { .. }
                | Self::Fetch(_)
        )
    }

    /// Returns `true` if the cursor moved despite the error.
    pub fn cursor_advanced(&self) -> bool {
        matches!(self, Self::UnknownDataItemId { .. })
    }
}
