//! `plugins`: show what the host would bind, without starting it

use std::path::Path;

use anyhow::{Context, Result};
use pd_server::plugins::{HandlerCatalog, PluginBinder};

use crate::output::{format_plugins, PluginRow};

/// Entry points compiled into this binary
pub fn builtin_catalog() -> HandlerCatalog {
    pd_system::install(HandlerCatalog::new())
}

/// Resolve every plugin under `root` against the built-in entry points
pub async fn discover(root: &Path) -> Result<Vec<PluginRow>> {
    let binder = PluginBinder::new(root, builtin_catalog());
    let dirs = binder
        .plugin_dirs()
        .await
        .with_context(|| format!("Failed to read plugin root {}", root.display()))?;

    let mut rows = Vec::with_capacity(dirs.len());
    for (name, dir) in dirs {
        let row = match binder.resolve(&name, &dir).await {
            Ok(registration) => PluginRow {
                name,
                handler: registration.entry.as_ref().map(|e| e.handler.clone()),
                namespace: registration.entry.map(|e| e.namespace),
                problem: None,
            },
            Err(e) => PluginRow {
                name,
                handler: None,
                namespace: None,
                problem: Some(e.to_string()),
            },
        };
        rows.push(row);
    }
    Ok(rows)
}

pub async fn run(root: &Path) -> Result<()> {
    let rows = discover(root).await?;
    println!("{}", format_plugins(&rows));
    Ok(())
}
