//! Command implementations

pub mod auth;
pub mod hash;
pub mod plugins;
pub mod serve;

use std::path::Path;

use anyhow::{Context, Result};
use pd_core::config::{self, ServerConfig};

/// Load the server configuration.
///
/// An explicit path must exist. Without one the default location is used
/// when present, and built-in defaults otherwise.
pub fn load_server_config(path: Option<&Path>) -> Result<ServerConfig> {
    match path {
        Some(path) => config::load_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => {
            let default = config::default_config_path();
            if default.exists() {
                config::load_config(&default)
                    .with_context(|| format!("Failed to load config from {}", default.display()))
            } else {
                tracing::debug!("No config at {}, using defaults", default.display());
                Ok(ServerConfig::default())
            }
        }
    }
}
