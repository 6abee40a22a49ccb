//! Session-local error taxonomy.

use thiserror::Error;

/// Why a session loop ended.
///
/// Every variant is session-local: it terminates the owning session and
/// nothing else. Cleanup is identical for all of them; they are only
/// distinguished in diagnostics and metrics.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The peer closed the connection cleanly. Expected; logged, never
    /// escalated.
    #[error("peer disconnected")]
    Disconnected,

    /// Abrupt close or protocol violation on send or receive.
    #[error("transport error: {0}")]
    Transport(#[from] axum::Error),

    /// A producer sent something that is not a JSON text frame. Fatal
    /// for the session; bad input is never silently skipped.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

impl SessionError {
    /// Stable label for the `ws_session_errors_total` metric.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Transport(_) => "transport",
            Self::MalformedPayload(_) => "malformed_payload",
        }
    }

    /// Whether this is an expected clean close rather than a failure.
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Disconnected)
    }
}
