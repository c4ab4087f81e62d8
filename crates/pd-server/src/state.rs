//! Shared server state

use std::sync::Arc;

use pd_core::config::ServerConfig;
use pd_core::SessionAuthority;

use crate::gateway::RealtimeServer;

/// State shared by the HTTP routes and the realtime gateway
pub struct ServerState {
    /// Configuration
    pub config: ServerConfig,
    /// Live sessions
    pub sessions: Arc<SessionAuthority>,
    /// Namespaced realtime server
    pub realtime: Arc<RealtimeServer>,
}

impl ServerState {
    /// Build the session authority and realtime server from configuration
    pub fn new(config: ServerConfig) -> Self {
        let sessions = Arc::new(SessionAuthority::with_ttl(config.session_ttl));
        let realtime = RealtimeServer::new(sessions.clone())
            .with_outbound_buffer(config.realtime.outbound_buffer);
        Self {
            config,
            sessions,
            realtime: Arc::new(realtime),
        }
    }

    pub fn session_authority(&self) -> &Arc<SessionAuthority> {
        &self.sessions
    }

    pub fn realtime(&self) -> &Arc<RealtimeServer> {
        &self.realtime
    }
}
