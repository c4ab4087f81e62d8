//! Plugin discovery and binding

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use super::{HandlerCatalog, PluginContext, PluginError, PluginFs, RegisterFn};
use crate::capabilities::Capabilities;
use crate::gateway::{normalize_namespace, RealtimeServer};

/// Location of the realtime descriptor inside a plugin directory
pub const SOCKET_DESCRIPTOR: &str = "api/socket.toml";

/// Contents of `api/socket.toml`
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SocketDescriptor {
    /// Name of the registration entry point in the handler catalog
    pub handler: String,
    /// Namespace to serve; defaults to `/<plugin directory name>`
    #[serde(default)]
    pub namespace: Option<String>,
    /// Free-form settings passed to the plugin
    #[serde(default)]
    pub settings: toml::Table,
}

/// Failures while discovering or binding one plugin
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("Invalid socket descriptor {path}: {reason}")]
    Descriptor { path: PathBuf, reason: String },

    #[error("No registration entry point named '{0}'")]
    EntryPointMissing(String),

    #[error("Namespace {0} is already bound by another plugin")]
    NamespaceTaken(String),

    #[error("Registration failed: {0}")]
    Registration(#[from] PluginError),

    #[error("Registration panicked: {0}")]
    Panicked(String),
}

/// A resolved realtime entry point
#[derive(Clone)]
pub struct EntryPoint {
    pub handler: String,
    pub namespace: String,
    pub settings: toml::Table,
    pub register: RegisterFn,
}

impl std::fmt::Debug for EntryPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryPoint")
            .field("handler", &self.handler)
            .field("namespace", &self.namespace)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// One discovered plugin; `entry` is `None` when it has no realtime part
#[derive(Debug, Clone)]
pub struct PluginRegistration {
    pub name: String,
    pub dir: PathBuf,
    pub entry: Option<EntryPoint>,
}

/// What happened to one plugin during binding
#[derive(Debug)]
pub enum BindStatus {
    Bound { namespace: String },
    Skipped,
    Failed(DiscoveryError),
}

#[derive(Debug)]
pub struct PluginOutcome {
    pub name: String,
    pub status: BindStatus,
}

/// Per-plugin results of a binding pass
#[derive(Debug, Default)]
pub struct BindReport {
    pub outcomes: Vec<PluginOutcome>,
}

impl BindReport {
    /// Number of plugins whose entry point registered successfully
    pub fn loaded_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, BindStatus::Bound { .. }))
            .count()
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &DiscoveryError)> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            BindStatus::Failed(e) => Some((o.name.as_str(), e)),
            _ => None,
        })
    }

    pub fn get(&self, name: &str) -> Option<&BindStatus> {
        self.outcomes
            .iter()
            .find(|o| o.name == name)
            .map(|o| &o.status)
    }
}

/// Scans the plugin root and binds realtime entry points
pub struct PluginBinder {
    root: PathBuf,
    catalog: HandlerCatalog,
}

impl PluginBinder {
    pub fn new(root: impl Into<PathBuf>, catalog: HandlerCatalog) -> Self {
        Self {
            root: root.into(),
            catalog,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Immediate subdirectories of the plugin root, sorted by name.
    /// Hidden directories are ignored.
    pub async fn plugin_dirs(&self) -> io::Result<Vec<(String, PathBuf)>> {
        let mut dirs = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            dirs.push((name, entry.path()));
        }
        dirs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(dirs)
    }

    /// Read a plugin's socket descriptor and resolve its entry point
    pub async fn resolve(&self, name: &str, dir: &Path) -> Result<PluginRegistration, DiscoveryError> {
        let path = dir.join(SOCKET_DESCRIPTOR);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(PluginRegistration {
                    name: name.to_string(),
                    dir: dir.to_path_buf(),
                    entry: None,
                });
            }
            Err(source) => return Err(DiscoveryError::Read { path, source }),
        };

        let descriptor: SocketDescriptor =
            toml::from_str(&text).map_err(|e| DiscoveryError::Descriptor {
                path: path.clone(),
                reason: e.message().to_string(),
            })?;

        let namespace = match descriptor.namespace.as_deref() {
            Some(ns) if ns.trim().trim_start_matches('/').is_empty() => {
                return Err(DiscoveryError::Descriptor {
                    path,
                    reason: "namespace must not be empty".to_string(),
                });
            }
            Some(ns) => normalize_namespace(ns),
            None => normalize_namespace(name),
        };

        let register = self
            .catalog
            .get(&descriptor.handler)
            .ok_or_else(|| DiscoveryError::EntryPointMissing(descriptor.handler.clone()))?;

        Ok(PluginRegistration {
            name: name.to_string(),
            dir: dir.to_path_buf(),
            entry: Some(EntryPoint {
                handler: descriptor.handler,
                namespace,
                settings: descriptor.settings,
                register,
            }),
        })
    }

    /// Discover every plugin and invoke each realtime entry point once.
    ///
    /// A failing plugin is recorded in the report and never prevents the
    /// others from binding.
    pub async fn bind_all(&self, server: &RealtimeServer, caps: &Capabilities) -> BindReport {
        let mut report = BindReport::default();

        let dirs = match self.plugin_dirs().await {
            Ok(dirs) => dirs,
            Err(e) => {
                tracing::warn!(
                    "Cannot read plugin root {}: {}",
                    self.root.display(),
                    e
                );
                return report;
            }
        };

        for (name, dir) in dirs {
            let status = match self.resolve(&name, &dir).await {
                Ok(PluginRegistration { entry: None, .. }) => {
                    tracing::debug!("Plugin '{}' has no realtime entry point", name);
                    BindStatus::Skipped
                }
                Ok(PluginRegistration {
                    entry: Some(entry), ..
                }) => bind(&name, &dir, entry, server, caps),
                Err(e) => BindStatus::Failed(e),
            };

            match &status {
                BindStatus::Bound { namespace } => {
                    tracing::info!("Plugin '{}' bound to {}", name, namespace)
                }
                BindStatus::Failed(e) => {
                    tracing::error!("Plugin '{}' failed to bind: {}", name, e)
                }
                BindStatus::Skipped => {}
            }
            report.outcomes.push(PluginOutcome { name, status });
        }

        tracing::info!("Loaded {} socket plugin(s)", report.loaded_count());
        report
    }
}

fn bind(
    name: &str,
    dir: &Path,
    entry: EntryPoint,
    server: &RealtimeServer,
    caps: &Capabilities,
) -> BindStatus {
    if server.contains(&entry.namespace) {
        return BindStatus::Failed(DiscoveryError::NamespaceTaken(entry.namespace));
    }

    let ctx = PluginContext {
        name: name.to_string(),
        namespace: entry.namespace.clone(),
        settings: entry.settings,
        fs: PluginFs::new(dir),
    };

    let result = panic::catch_unwind(AssertUnwindSafe(|| (entry.register)(&ctx, server, caps)));
    let error = match result {
        Ok(Ok(())) => {
            return BindStatus::Bound {
                namespace: entry.namespace,
            }
        }
        Ok(Err(e)) => DiscoveryError::Registration(e),
        Err(payload) => DiscoveryError::Panicked(panic_message(payload.as_ref())),
    };

    // Registration may have created the namespace before failing
    server.remove_namespace(&entry.namespace);
    BindStatus::Failed(error)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::capabilities;
    use pd_core::SessionAuthority;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn register_echo(
        ctx: &PluginContext,
        server: &RealtimeServer,
        _: &Capabilities,
    ) -> Result<(), PluginError> {
        server.namespace(&ctx.namespace);
        Ok(())
    }

    fn register_failing(
        ctx: &PluginContext,
        server: &RealtimeServer,
        _: &Capabilities,
    ) -> Result<(), PluginError> {
        server.namespace(&ctx.namespace);
        Err(PluginError::Other("backend unavailable".into()))
    }

    fn register_panicking(
        _: &PluginContext,
        _: &RealtimeServer,
        _: &Capabilities,
    ) -> Result<(), PluginError> {
        panic!("boom");
    }

    fn catalog() -> HandlerCatalog {
        HandlerCatalog::new()
            .with("echo", register_echo)
            .with("failing", register_failing)
            .with("panicking", register_panicking)
    }

    fn write_plugin(root: &Path, name: &str, descriptor: Option<&str>) {
        let dir = root.join(name);
        std::fs::create_dir_all(dir.join("api")).unwrap();
        if let Some(descriptor) = descriptor {
            std::fs::write(dir.join(SOCKET_DESCRIPTOR), descriptor).unwrap();
        }
    }

    fn server() -> RealtimeServer {
        RealtimeServer::new(Arc::new(SessionAuthority::new()))
    }

    #[tokio::test]
    async fn test_failing_plugin_does_not_block_siblings() {
        let temp = TempDir::new().unwrap();
        write_plugin(temp.path(), "alpha", Some("handler = \"failing\""));
        write_plugin(temp.path(), "beta", Some("handler = \"echo\""));
        write_plugin(temp.path(), "gamma", Some("handler = \"panicking\""));

        let server = server();
        let binder = PluginBinder::new(temp.path(), catalog());
        let report = binder.bind_all(&server, &capabilities()).await;

        assert_eq!(report.loaded_count(), 1);
        assert!(matches!(
            report.get("beta"),
            Some(BindStatus::Bound { namespace }) if namespace == "/beta"
        ));
        assert!(matches!(
            report.get("alpha"),
            Some(BindStatus::Failed(DiscoveryError::Registration(_)))
        ));
        assert!(matches!(
            report.get("gamma"),
            Some(BindStatus::Failed(DiscoveryError::Panicked(msg))) if msg == "boom"
        ));

        // The failed plugin's half-built namespace is gone
        assert_eq!(server.namespace_names(), vec!["/beta"]);
        assert_eq!(report.failed().count(), 2);
    }

    #[tokio::test]
    async fn test_plugins_without_descriptor_are_skipped() {
        let temp = TempDir::new().unwrap();
        write_plugin(temp.path(), "static-only", None);
        std::fs::write(temp.path().join("README.md"), "not a plugin").unwrap();
        std::fs::create_dir_all(temp.path().join(".cache")).unwrap();

        let binder = PluginBinder::new(temp.path(), catalog());
        let report = binder.bind_all(&server(), &capabilities()).await;

        assert_eq!(report.outcomes.len(), 1);
        assert!(matches!(report.get("static-only"), Some(BindStatus::Skipped)));
        assert_eq!(report.loaded_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_entry_point_and_bad_descriptor() {
        let temp = TempDir::new().unwrap();
        write_plugin(temp.path(), "ghost", Some("handler = \"nope\""));
        write_plugin(temp.path(), "broken", Some("handler = ["));
        write_plugin(temp.path(), "empty-ns", Some("handler = \"echo\"\nnamespace = \"/\""));

        let binder = PluginBinder::new(temp.path(), catalog());
        let report = binder.bind_all(&server(), &capabilities()).await;

        assert!(matches!(
            report.get("ghost"),
            Some(BindStatus::Failed(DiscoveryError::EntryPointMissing(h))) if h == "nope"
        ));
        assert!(matches!(
            report.get("broken"),
            Some(BindStatus::Failed(DiscoveryError::Descriptor { .. }))
        ));
        assert!(matches!(
            report.get("empty-ns"),
            Some(BindStatus::Failed(DiscoveryError::Descriptor { .. }))
        ));
    }

    #[tokio::test]
    async fn test_namespace_conflict() {
        let temp = TempDir::new().unwrap();
        write_plugin(temp.path(), "a", Some("handler = \"echo\"\nnamespace = \"shared\""));
        write_plugin(temp.path(), "b", Some("handler = \"echo\"\nnamespace = \"/shared\""));

        let binder = PluginBinder::new(temp.path(), catalog());
        let report = binder.bind_all(&server(), &capabilities()).await;

        assert_eq!(report.loaded_count(), 1);
        assert!(matches!(
            report.get("b"),
            Some(BindStatus::Failed(DiscoveryError::NamespaceTaken(ns))) if ns == "/shared"
        ));
    }

    #[tokio::test]
    async fn test_resolve_descriptor_settings() {
        let temp = TempDir::new().unwrap();
        write_plugin(
            temp.path(),
            "monitor",
            Some("handler = \"echo\"\nnamespace = \"/system\"\n\n[settings]\ninterval_ms = 1000\n"),
        );

        let binder = PluginBinder::new(temp.path(), catalog());
        let reg = binder
            .resolve("monitor", &temp.path().join("monitor"))
            .await
            .unwrap();
        let entry = reg.entry.unwrap();
        assert_eq!(entry.namespace, "/system");
        assert_eq!(entry.handler, "echo");
        assert_eq!(entry.settings["interval_ms"].as_integer(), Some(1000));
    }

    #[tokio::test]
    async fn test_missing_root_yields_empty_report() {
        let temp = TempDir::new().unwrap();
        let binder = PluginBinder::new(temp.path().join("absent"), catalog());
        let report = binder.bind_all(&server(), &capabilities()).await;
        assert!(report.outcomes.is_empty());
    }
}
