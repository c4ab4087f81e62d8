//! Server bootstrap and run loop

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use pd_core::config::ServerConfig;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::capabilities::{Capabilities, HostServices};
use crate::http;
use crate::plugins::{BindReport, HandlerCatalog, PluginBinder};
use crate::state::ServerState;

/// The assembled desktop host: sessions, realtime gateway and bound plugins
pub struct DesktopServer {
    state: Arc<ServerState>,
    report: BindReport,
    cancel: CancellationToken,
}

impl DesktopServer {
    /// Build shared state and bind every discoverable plugin
    pub async fn bootstrap(
        config: ServerConfig,
        catalog: HandlerCatalog,
        host: HostServices,
    ) -> Self {
        if config.auth.password_sha256.is_none() {
            tracing::warn!("No unlock password configured; every unlock will be rejected");
        }

        let state = Arc::new(ServerState::new(config));
        let caps = Capabilities::new(host, state.sessions.clone());

        let binder = PluginBinder::new(state.config.plugin_root.clone(), catalog);
        let report = binder.bind_all(&state.realtime, &caps).await;

        Self {
            state,
            report,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop serving when `cancel` fires
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn state(&self) -> &Arc<ServerState> {
        &self.state
    }

    pub fn bind_report(&self) -> &BindReport {
        &self.report
    }

    pub fn router(&self) -> Router {
        http::router(Arc::clone(&self.state))
    }

    /// Bind the configured address and serve until cancelled
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config.bind_address.clone();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener until cancelled
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr()?;
        tracing::info!("plugdesk listening on {}", local_addr);

        let router = self.router();
        let realtime = Arc::clone(&self.state.realtime);
        let cancel = self.cancel.clone();

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                cancel.cancelled().await;
                tracing::info!("Shutting down");
                realtime.shutdown();
            })
            .await
            .context("Server error")?;

        tracing::info!("Server stopped");
        Ok(())
    }
}
