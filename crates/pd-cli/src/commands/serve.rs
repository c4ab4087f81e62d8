//! `serve`: run the host until Ctrl-C or SIGTERM

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use pd_core::config::ServerConfig;
use pd_core::PlatformInfo;
use pd_server::plugins::BindStatus;
use pd_server::{DesktopServer, HostServices};
use pd_telemetry::{SignalCommand, SysinfoTelemetry};
use tokio_util::sync::CancellationToken;

use super::plugins::builtin_catalog;
use crate::output::{print_info, print_success, print_warning};

/// Command-line overrides for the loaded configuration
#[derive(Debug, Default)]
pub struct ServeOverrides {
    pub bind: Option<String>,
    pub plugins: Option<PathBuf>,
}

impl ServeOverrides {
    pub fn apply(self, mut config: ServerConfig) -> ServerConfig {
        if let Some(bind) = self.bind {
            config.bind_address = bind;
        }
        if let Some(plugins) = self.plugins {
            config.plugin_root = plugins;
        }
        config
    }
}

/// Host services backed by the real operating system
pub fn native_host() -> HostServices {
    let platform = PlatformInfo::detect();
    HostServices {
        telemetry: Arc::new(SysinfoTelemetry::new()),
        process: Arc::new(SignalCommand::new(&platform)),
        platform,
    }
}

pub async fn run(config: ServerConfig, quiet: bool) -> Result<()> {
    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());

    let plugin_root = config.plugin_root.clone();
    let server = DesktopServer::bootstrap(config, builtin_catalog(), native_host())
        .await
        .with_cancel(cancel);

    if !quiet {
        let report = server.bind_report();
        for outcome in &report.outcomes {
            match &outcome.status {
                BindStatus::Bound { namespace } => {
                    print_success(&format!("{} -> {}", outcome.name, namespace))
                }
                BindStatus::Failed(e) => print_warning(&format!("{}: {}", outcome.name, e)),
                BindStatus::Skipped => {}
            }
        }
        print_info(&format!(
            "{} realtime plugin(s) bound from {}",
            report.loaded_count(),
            plugin_root.display()
        ));
        print_info(&format!(
            "Listening on {}",
            server.state().config.bind_address
        ));
    }

    server.run().await
}

fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    tracing::error!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => tracing::info!("Received Ctrl+C, initiating shutdown..."),
            _ = terminate => tracing::info!("Received SIGTERM, initiating shutdown..."),
        }

        cancel.cancel();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        let config = ServeOverrides {
            bind: Some("0.0.0.0:8000".into()),
            plugins: None,
        }
        .apply(ServerConfig::default());
        assert_eq!(config.bind_address, "0.0.0.0:8000");
        assert_eq!(config.plugin_root, PathBuf::from("plugins"));

        let config = ServeOverrides::default().apply(ServerConfig::default());
        assert_eq!(config.bind_address, "127.0.0.1:7420");
    }
}
