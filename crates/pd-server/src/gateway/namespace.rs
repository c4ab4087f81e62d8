//! Namespaces: independent channels on one realtime endpoint

use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use pd_protocol::ConnectionId;

use super::gate::ConnectGate;
use super::handler::ConnectionHandler;
use super::socket::Socket;

/// Shared handle to a namespace
pub type NamespaceHandle = Arc<Namespace>;

/// A named channel with its own admission gate and connection handler
pub struct Namespace {
    name: String,
    gate: RwLock<Arc<dyn ConnectGate>>,
    handler: RwLock<Option<Arc<dyn ConnectionHandler>>>,
    sockets: DashMap<ConnectionId, Socket>,
}

impl Namespace {
    pub(crate) fn new(name: String, gate: Arc<dyn ConnectGate>) -> Self {
        Self {
            name,
            gate: RwLock::new(gate),
            handler: RwLock::new(None),
            sockets: DashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replace the admission gate for future connections
    pub fn use_gate(&self, gate: Arc<dyn ConnectGate>) {
        *self.gate.write().unwrap_or_else(|e| e.into_inner()) = gate;
    }

    /// Attach the connection handler, replacing any previous one
    pub fn on_connection(&self, handler: Arc<dyn ConnectionHandler>) {
        let mut slot = self.handler.write().unwrap_or_else(|e| e.into_inner());
        if slot.is_some() {
            tracing::warn!("Replacing connection handler on {}", self.name);
        }
        *slot = Some(handler);
    }

    pub fn has_handler(&self) -> bool {
        self.handler
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Number of currently open connections
    pub fn connection_count(&self) -> usize {
        self.sockets.len()
    }

    /// Sockets of all open connections
    pub fn sockets(&self) -> Vec<Socket> {
        self.sockets.iter().map(|r| r.value().clone()).collect()
    }

    pub(crate) fn gate(&self) -> Arc<dyn ConnectGate> {
        Arc::clone(&self.gate.read().unwrap_or_else(|e| e.into_inner()))
    }

    pub(crate) fn handler(&self) -> Option<Arc<dyn ConnectionHandler>> {
        self.handler
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub(crate) fn track(&self, socket: Socket) {
        self.sockets.insert(socket.id(), socket);
    }

    pub(crate) fn untrack(&self, id: &ConnectionId) {
        self.sockets.remove(id);
    }
}

impl std::fmt::Debug for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Namespace")
            .field("name", &self.name)
            .field("connections", &self.sockets.len())
            .field("has_handler", &self.has_handler())
            .finish()
    }
}

/// Canonical namespace form: trimmed, with exactly one leading `/`
pub fn normalize_namespace(name: &str) -> String {
    format!("/{}", name.trim().trim_start_matches('/'))
}
