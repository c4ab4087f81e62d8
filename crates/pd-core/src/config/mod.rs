//! Configuration management for plugdesk

mod server;
pub mod serde_utils;

pub use server::{AuthConfig, RealtimeConfig, ServerConfig};

use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// `<config dir>/plugdesk`, or `./plugdesk` when the platform has none
pub fn default_config_dir() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("plugdesk")
}

/// Where `serve` looks for its config when `--config` is not given
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// Read and parse a TOML config file
pub fn load_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        Err(e) => {
            return Err(ConfigError::Invalid(format!(
                "cannot read {}: {}",
                path.display(),
                e
            )));
        }
    };
    Ok(toml::from_str(&text)?)
}

/// Write a config as pretty TOML, creating missing parent directories
pub fn save_config<T: serde::Serialize>(path: &Path, config: &T) -> Result<(), ConfigError> {
    let text = toml::to_string_pretty(config)?;
    let io_err = |what: &str, e: std::io::Error| {
        ConfigError::Invalid(format!("cannot {} {}: {}", what, path.display(), e))
    };

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| io_err("create parent of", e))?;
    }
    std::fs::write(path, text).map_err(|e| io_err("write", e))
}
