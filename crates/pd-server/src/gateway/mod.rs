//! Realtime gateway
//!
//! A single [`RealtimeServer`] multiplexes named namespaces over one
//! WebSocket endpoint. Each namespace has an admission gate (by default the
//! session gate) and at most one connection handler, which is attached by
//! the plugin that owns the namespace.

mod connection;
mod error;
mod gate;
mod handler;
mod namespace;
mod socket;
pub mod transport;

use std::sync::Arc;

use dashmap::DashMap;
use pd_core::traits::SessionValidator;
use pd_protocol::Frame;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub use connection::Connection;
pub use error::{ConnectError, CLOSE_UNAUTHORIZED, CLOSE_UNKNOWN_NAMESPACE};
pub use gate::{ConnectGate, Handshake, SessionGate};
pub use handler::{ConnectionHandler, ConnectionSession};
pub use namespace::{normalize_namespace, Namespace, NamespaceHandle};
pub use socket::Socket;

/// Default capacity of each connection's outbound queue
pub const DEFAULT_OUTBOUND_BUFFER: usize = 256;

/// Namespaced realtime server
pub struct RealtimeServer {
    namespaces: DashMap<String, NamespaceHandle>,
    default_gate: Arc<dyn ConnectGate>,
    outbound_buffer: usize,
    shutdown: CancellationToken,
}

impl RealtimeServer {
    /// Create a server whose namespaces admit connections through the
    /// session gate backed by `validator`
    pub fn new(validator: Arc<dyn SessionValidator>) -> Self {
        Self {
            namespaces: DashMap::new(),
            default_gate: Arc::new(SessionGate::new(validator)),
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_outbound_buffer(mut self, capacity: usize) -> Self {
        self.outbound_buffer = capacity.max(1);
        self
    }

    /// Get a namespace, creating it if it does not exist yet
    pub fn namespace(&self, name: &str) -> NamespaceHandle {
        let name = normalize_namespace(name);
        self.namespaces
            .entry(name.clone())
            .or_insert_with(|| {
                tracing::debug!("Created namespace {}", name);
                Arc::new(Namespace::new(name.clone(), Arc::clone(&self.default_gate)))
            })
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<NamespaceHandle> {
        self.namespaces
            .get(&normalize_namespace(name))
            .map(|r| Arc::clone(&r))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.namespaces.contains_key(&normalize_namespace(name))
    }

    /// Remove a namespace; open connections keep running until they close
    pub fn remove_namespace(&self, name: &str) -> Option<NamespaceHandle> {
        self.namespaces
            .remove(&normalize_namespace(name))
            .map(|(_, ns)| ns)
    }

    pub fn namespace_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.namespaces.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    /// Admit a connection to a namespace.
    ///
    /// On success the handler has already created its per-connection
    /// session; the returned receiver carries the frames it emits.
    pub async fn connect(
        &self,
        namespace: &str,
        handshake: &Handshake,
    ) -> Result<(Connection, mpsc::Receiver<Frame>), ConnectError> {
        let name = normalize_namespace(namespace);
        let ns = self
            .get(&name)
            .ok_or_else(|| ConnectError::UnknownNamespace(name.clone()))?;

        let session = ns.gate().check(handshake)?;
        let handler = ns
            .handler()
            .ok_or_else(|| ConnectError::Unavailable(name.clone()))?;

        let (tx, rx) = mpsc::channel(self.outbound_buffer);
        let socket = Socket::new(name.clone(), session, tx);
        ns.track(socket.clone());

        tracing::info!(
            "Connection {} admitted on {} for user {}",
            socket.id(),
            name,
            socket.session().user_id
        );

        let session = handler.on_connect(socket.clone()).await;
        Ok((Connection::new(socket, session, ns), rx))
    }

    /// Total open connections across all namespaces
    pub fn connection_count(&self) -> usize {
        self.namespaces
            .iter()
            .map(|r| r.value().connection_count())
            .sum()
    }

    /// Token cancelled when the server shuts down
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Ask every open connection to close
    pub fn shutdown(&self) {
        tracing::info!(
            "Closing {} realtime connection(s)",
            self.connection_count()
        );
        self.shutdown.cancel();
    }
}
