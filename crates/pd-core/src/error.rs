//! Core error types for plugdesk

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Reasons a session token is refused
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthError {
    /// No token was presented
    #[error("Session token missing")]
    Missing,

    /// The session existed but its lifetime is over
    #[error("Session expired")]
    Expired,

    /// The token does not name a live session
    #[error("Invalid session token")]
    Invalid,
}

impl AuthError {
    /// Wire code of this failure (`MISSING`, `EXPIRED`, `INVALID`)
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Missing => "MISSING",
            AuthError::Expired => "EXPIRED",
            AuthError::Invalid => "INVALID",
        }
    }
}

/// Session invalidation errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidateError {
    /// No live session carries this token
    #[error("Session not found")]
    NotFound,
}

/// Telemetry gathering errors (per metric group, transient)
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The platform does not expose this metric group
    #[error("Telemetry unavailable: {0}")]
    Unavailable(String),

    /// The blocking collection task failed
    #[error("Telemetry task failed: {0}")]
    Task(String),
}

/// Process control errors
#[derive(Error, Debug)]
pub enum ProcessControlError {
    /// Signal name is not in the supported set
    #[error("Unsupported signal: {0}")]
    UnsupportedSignal(String),

    /// The external termination command could not be started
    #[error("Failed to run termination command: {0}")]
    Spawn(#[from] std::io::Error),

    /// The external termination command reported failure
    #[error("Failed to signal process {pid}: {status}")]
    Failed { pid: u32, status: String },
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
