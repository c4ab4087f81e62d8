//! plugdesk CLI
//!
//! Runs the plugin host and manages sessions on a running one.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use plugdesk::client::DEFAULT_SERVER;
use plugdesk::commands::{self, serve::ServeOverrides};
use plugdesk::output::print_error;

#[derive(Parser)]
#[command(name = "plugdesk")]
#[command(author, version, about = "Plugin host with authenticated realtime telemetry")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Address of a running host
    #[arg(long, global = true, env = "PLUGDESK_SERVER", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the host: HTTP unlock API plus realtime plugin namespaces
    #[command(alias = "start")]
    Serve {
        /// Bind address (overrides config)
        #[arg(short, long)]
        bind: Option<String>,
        /// Plugin root directory (overrides config)
        #[arg(short, long)]
        plugins: Option<PathBuf>,
    },

    /// Print the SHA-256 digest to put in `auth.password_sha256`
    HashPassword {
        /// Password to hash (read from stdin when omitted)
        password: Option<String>,
    },

    /// Unlock a running host and print the session token
    Unlock {
        #[arg(long, env = "PLUGDESK_PASSWORD", hide_env_values = true)]
        password: String,
        /// Client identifier recorded as the session's user
        #[arg(long)]
        client_id: Option<String>,
    },

    /// Show the state of a session
    Status {
        #[arg(long, env = "PLUGDESK_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// End a session
    Lock {
        #[arg(long, env = "PLUGDESK_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// List discovered plugins and their realtime entry points
    Plugins {
        /// Plugin root directory (defaults to the configured one)
        #[arg(short, long)]
        root: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(e) = run(cli).await {
        print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve { bind, plugins } => {
            let config = commands::load_server_config(cli.config.as_deref())?;
            let config = ServeOverrides { bind, plugins }.apply(config);
            commands::serve::run(config, cli.quiet).await
        }
        Commands::HashPassword { password } => commands::hash::run(password),
        Commands::Unlock {
            password,
            client_id,
        } => {
            commands::auth::unlock(&cli.server, &password, client_id.as_deref(), cli.quiet).await
        }
        Commands::Status { token } => commands::auth::status(&cli.server, &token).await,
        Commands::Lock { token } => commands::auth::lock(&cli.server, &token, cli.quiet).await,
        Commands::Plugins { root } => {
            let root = match root {
                Some(root) => root,
                None => {
                    commands::load_server_config(cli.config.as_deref())
                        .context("Cannot determine plugin root")?
                        .plugin_root
                }
            };
            commands::plugins::run(&root).await
        }
    }
}
