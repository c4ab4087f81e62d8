//! Protocol error types

use thiserror::Error;

/// Errors that can occur while decoding realtime frames
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Frame is not valid JSON or lacks an event name
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// Event name is not part of the namespace vocabulary
    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    /// Event payload does not match the expected shape
    #[error("Invalid payload for '{event}': {reason}")]
    InvalidPayload { event: String, reason: String },

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
