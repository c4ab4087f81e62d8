//! Plugin discovery and realtime binding
//!
//! A plugin is an immediate subdirectory of the plugin root. Plugins that
//! ship `api/socket.toml` name a registration entry point from the
//! [`HandlerCatalog`]; the binder calls it once with the plugin's context,
//! the realtime server and the host capabilities.

mod binder;
mod fs;

use std::collections::BTreeMap;
use std::io;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::capabilities::Capabilities;
use crate::gateway::RealtimeServer;

pub use binder::{
    BindReport, BindStatus, DiscoveryError, EntryPoint, PluginBinder, PluginOutcome,
    PluginRegistration, SocketDescriptor, SOCKET_DESCRIPTOR,
};
pub use fs::PluginFs;

/// Signature of a realtime registration entry point
pub type RegisterFn = fn(&PluginContext, &RealtimeServer, &Capabilities) -> Result<(), PluginError>;

/// Errors raised by plugin registration code
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Invalid plugin settings: {0}")]
    Settings(String),

    #[error("Path escapes the plugin directory: {0}")]
    PathEscape(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Other(String),
}

/// Per-plugin context passed to the registration entry point
#[derive(Debug, Clone)]
pub struct PluginContext {
    /// Directory name of the plugin
    pub name: String,
    /// Namespace the plugin is expected to serve
    pub namespace: String,
    /// The `[settings]` table of the socket descriptor
    pub settings: toml::Table,
    /// File access scoped to the plugin directory
    pub fs: PluginFs,
}

impl PluginContext {
    /// Deserialize the settings table into a typed structure
    pub fn settings<T: DeserializeOwned>(&self) -> Result<T, PluginError> {
        toml::Value::Table(self.settings.clone())
            .try_into()
            .map_err(|e: toml::de::Error| PluginError::Settings(e.message().to_string()))
    }
}

/// Registration entry points known to the host, by name
#[derive(Clone, Default)]
pub struct HandlerCatalog {
    entries: BTreeMap<String, RegisterFn>,
}

impl std::fmt::Debug for HandlerCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}

impl HandlerCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`HandlerCatalog::register`]
    pub fn with(mut self, name: impl Into<String>, register: RegisterFn) -> Self {
        self.register(name, register);
        self
    }

    pub fn register(&mut self, name: impl Into<String>, register: RegisterFn) {
        let name = name.into();
        if self.entries.insert(name.clone(), register).is_some() {
            tracing::warn!("Entry point '{}' registered twice, keeping the last", name);
        }
    }

    pub fn get(&self, name: &str) -> Option<RegisterFn> {
        self.entries.get(name).copied()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn noop(_: &PluginContext, _: &RealtimeServer, _: &Capabilities) -> Result<(), PluginError> {
        Ok(())
    }

    #[test]
    fn test_catalog() {
        let catalog = HandlerCatalog::new().with("system", noop).with("echo", noop);
        assert_eq!(catalog.names(), vec!["echo", "system"]);
        assert!(catalog.get("system").is_some());
        assert!(catalog.get("missing").is_none());
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Settings {
        interval_ms: u64,
        label: Option<String>,
    }

    fn context(settings: &str) -> PluginContext {
        PluginContext {
            name: "demo".into(),
            namespace: "/demo".into(),
            settings: toml::from_str(settings).unwrap(),
            fs: PluginFs::new("/tmp/demo"),
        }
    }

    #[test]
    fn test_typed_settings() {
        let settings: Settings = context("interval_ms = 500").settings().unwrap();
        assert_eq!(settings.interval_ms, 500);
        assert!(settings.label.is_none());

        let settings: Settings = context("").settings().unwrap();
        assert_eq!(settings.interval_ms, 0);
    }

    #[test]
    fn test_invalid_settings() {
        let err = context("interval_ms = \"fast\"").settings::<Settings>().unwrap_err();
        assert!(matches!(err, PluginError::Settings(_)));
    }
}
