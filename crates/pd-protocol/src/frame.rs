//! Realtime frame format
//!
//! Every message on the realtime transport, in either direction, is a single
//! JSON text frame of the shape `{"event": "<name>", "data": <payload>}`.
//! `data` may be omitted by clients, in which case it decodes as `null`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;

/// Event sent once to a client whose connection attempt was refused
pub const CONNECT_ERROR_EVENT: &str = "connect_error";

/// Event sent when an inbound frame cannot be handled
pub const ERROR_EVENT: &str = "error";

/// One realtime frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Event name
    pub event: String,
    /// Event payload
    #[serde(default)]
    pub data: Value,
}

/// Payload of a `connect_error` frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectErrorPayload {
    /// Machine-readable rejection reason (`MISSING`, `EXPIRED`, ...)
    pub reason: String,
    /// Human-readable message
    pub message: String,
}

impl Frame {
    /// Create a frame from an event name and a JSON payload
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Create a frame by serializing an arbitrary payload
    pub fn with_payload<T: Serialize>(
        event: impl Into<String>,
        payload: &T,
    ) -> Result<Self, ProtocolError> {
        Ok(Self::new(event, serde_json::to_value(payload)?))
    }

    /// Create a generic `error` frame
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(
            ERROR_EVENT,
            serde_json::json!({ "message": message.into() }),
        )
    }

    /// Create a `connect_error` frame for a refused connection
    pub fn connect_error(reason: impl Into<String>, message: impl Into<String>) -> Self {
        let payload = ConnectErrorPayload {
            reason: reason.into(),
            message: message.into(),
        };
        Self::new(
            CONNECT_ERROR_EVENT,
            serde_json::to_value(payload).unwrap_or(Value::Null),
        )
    }

    /// Decode a frame from JSON text
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let frame: Frame = serde_json::from_str(text)
            .map_err(|e| ProtocolError::MalformedFrame(e.to_string()))?;
        if frame.event.is_empty() {
            return Err(ProtocolError::MalformedFrame("empty event name".into()));
        }
        Ok(frame)
    }

    /// Encode the frame as JSON text
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Whether this frame carries the given event name
    pub fn is(&self, event: &str) -> bool {
        self.event == event
    }
}
