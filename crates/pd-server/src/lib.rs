//! pd-server: the plugdesk host
//!
//! Hosts the realtime gateway (namespaced WebSocket connections gated by
//! session tokens), binds plugins found under the plugin root, and serves
//! the unlock/lock/status HTTP API that manages sessions.

pub mod app;
pub mod capabilities;
pub mod gateway;
pub mod http;
pub mod plugins;
pub mod state;

pub use app::DesktopServer;
pub use capabilities::{Capabilities, HostServices};
pub use gateway::{
    ConnectError, ConnectionHandler, ConnectionSession, Handshake, RealtimeServer, Socket,
};
pub use plugins::{BindReport, HandlerCatalog, PluginContext, PluginError};
pub use state::ServerState;
