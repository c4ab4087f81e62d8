//! Event vocabulary of the `/system` namespace
//!
//! Client → server: `ping`, `start-monitoring`, `stop-monitoring`,
//! `kill-process {pid, signal?}`.
//!
//! Server → client: `pong`, `stats`, `disk`, `network`, `process-killed`,
//! `process-error`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;
use crate::frame::Frame;
use crate::telemetry::{DiskSnapshot, NetworkSnapshot, StatsSnapshot};

/// Namespace the system monitor plugin registers by default
pub const SYSTEM_NAMESPACE: &str = "/system";

/// Request sent by a client on the `/system` namespace
#[derive(Debug, Clone, PartialEq)]
pub enum SystemRequest {
    /// Liveness check
    Ping,
    /// Begin (or restart) periodic telemetry push
    StartMonitoring,
    /// Stop periodic telemetry push
    StopMonitoring,
    /// Signal a process
    KillProcess(KillRequest),
}

/// Body of a `kill-process` request.
///
/// `pid` is kept as raw JSON so that invalid values can be reported back to
/// the client instead of failing frame decoding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KillRequest {
    #[serde(default)]
    pub pid: Value,
    #[serde(default)]
    pub signal: Option<String>,
}

impl KillRequest {
    /// Build a request for a numeric PID
    pub fn new(pid: u32, signal: Option<&str>) -> Self {
        Self {
            pid: Value::from(pid),
            signal: signal.map(str::to_string),
        }
    }

    /// Parse the PID as a positive integer that fits a `u32`.
    ///
    /// Accepts JSON integers and strings of ASCII digits.
    pub fn parse_pid(&self) -> Option<u32> {
        let pid = match &self.pid {
            Value::Number(n) => n.as_u64()?,
            Value::String(s) => {
                if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                s.parse::<u64>().ok()?
            }
            _ => return None,
        };
        match u32::try_from(pid) {
            Ok(pid) if pid > 0 => Some(pid),
            _ => None,
        }
    }
}

impl SystemRequest {
    /// Decode a request from an inbound frame
    pub fn from_frame(frame: &Frame) -> Result<Self, ProtocolError> {
        match frame.event.as_str() {
            "ping" => Ok(Self::Ping),
            "start-monitoring" => Ok(Self::StartMonitoring),
            "stop-monitoring" => Ok(Self::StopMonitoring),
            "kill-process" => {
                let request = match &frame.data {
                    Value::Null => KillRequest::default(),
                    // A bare PID is accepted as shorthand for `{pid}`
                    Value::Number(_) | Value::String(_) => KillRequest {
                        pid: frame.data.clone(),
                        signal: None,
                    },
                    other => serde_json::from_value(other.clone()).map_err(|e| {
                        ProtocolError::InvalidPayload {
                            event: frame.event.clone(),
                            reason: e.to_string(),
                        }
                    })?,
                };
                Ok(Self::KillProcess(request))
            }
            other => Err(ProtocolError::UnknownEvent(other.to_string())),
        }
    }

    /// Encode this request as a frame (used by clients and tests)
    pub fn to_frame(&self) -> Frame {
        match self {
            Self::Ping => Frame::new("ping", Value::Null),
            Self::StartMonitoring => Frame::new("start-monitoring", Value::Null),
            Self::StopMonitoring => Frame::new("stop-monitoring", Value::Null),
            Self::KillProcess(request) => Frame::new(
                "kill-process",
                serde_json::to_value(request).unwrap_or(Value::Null),
            ),
        }
    }
}

/// Event pushed by the server on the `/system` namespace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum SystemEvent {
    /// Liveness acknowledgment
    Pong { message: String, time: u64 },
    /// CPU, memory, processes and uptime
    Stats(StatsSnapshot),
    /// Disk layout, partitions and I/O
    Disk(DiskSnapshot),
    /// Network interfaces and traffic
    Network(NetworkSnapshot),
    /// A termination signal was issued without OS-level error
    ProcessKilled { pid: u32, success: bool },
    /// A termination request was rejected or failed
    ProcessError { message: String, pid: Option<u32> },
}

impl SystemEvent {
    /// Wire name of this event
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pong { .. } => "pong",
            Self::Stats(_) => "stats",
            Self::Disk(_) => "disk",
            Self::Network(_) => "network",
            Self::ProcessKilled { .. } => "process-killed",
            Self::ProcessError { .. } => "process-error",
        }
    }

    /// Encode this event as a frame
    pub fn to_frame(&self) -> Result<Frame, ProtocolError> {
        let value = serde_json::to_value(self)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Decode an event from a frame
    pub fn from_frame(frame: &Frame) -> Result<Self, ProtocolError> {
        let value = serde_json::to_value(frame)?;
        Ok(serde_json::from_value(value)?)
    }
}
