//! Server configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::serde_utils::duration_secs;
use crate::session::DEFAULT_SESSION_TTL;

/// Configuration for the desktop server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the HTTP/realtime server to
    pub bind_address: String,

    /// Directory whose immediate subdirectories are plugins
    pub plugin_root: PathBuf,

    /// Session lifetime in seconds
    #[serde(with = "duration_secs")]
    pub session_ttl: Duration,

    /// Unlock settings
    pub auth: AuthConfig,

    /// Realtime transport settings
    pub realtime: RealtimeConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:7420".to_string(),
            plugin_root: PathBuf::from("plugins"),
            session_ttl: DEFAULT_SESSION_TTL,
            auth: AuthConfig::default(),
            realtime: RealtimeConfig::default(),
        }
    }
}

/// Unlock configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Hex SHA-256 digest of the unlock password.
    /// When unset every unlock attempt is rejected.
    pub password_sha256: Option<String>,
}

/// Realtime transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    /// Capacity of each connection's outbound frame queue
    pub outbound_buffer: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            outbound_buffer: 256,
        }
    }
}
