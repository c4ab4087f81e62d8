//! pd-system: the `/system` realtime plugin
//!
//! Streams CPU, memory, process, disk and network telemetry to authenticated
//! clients and lets them signal processes. The host binds it through the
//! `system` entry point named in a plugin's `api/socket.toml`:
//!
//! ```toml
//! handler = "system"
//! namespace = "/system"
//!
//! [settings]
//! interval_ms = 2000
//! process_limit = 100
//! ```

mod health;
mod monitor;
pub mod session;
pub mod settings;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use pd_server::{Capabilities, HandlerCatalog, PluginContext, PluginError, RealtimeServer};

pub use health::{MetricGroup, BACKOFF_AFTER, RETRY_EVERY};
pub use session::{MonitorSession, MonitorState, SystemHandler};
pub use settings::MonitorSettings;

/// Entry point name used in `api/socket.toml`
pub const HANDLER_NAME: &str = "system";

/// Registration entry point: attach the monitor handler to the plugin's
/// namespace
pub fn register(
    ctx: &PluginContext,
    server: &RealtimeServer,
    caps: &Capabilities,
) -> Result<(), PluginError> {
    let settings = ctx.settings::<MonitorSettings>()?.sanitized();
    tracing::debug!(
        "Registering {} on {} ({}ms, top {} processes)",
        ctx.name,
        ctx.namespace,
        settings.interval.as_millis(),
        settings.process_limit
    );

    server
        .namespace(&ctx.namespace)
        .on_connection(Arc::new(SystemHandler::new(caps, settings)));
    Ok(())
}

/// Add this plugin's entry point to a catalog
pub fn install(catalog: HandlerCatalog) -> HandlerCatalog {
    catalog.with(HANDLER_NAME, register)
}
