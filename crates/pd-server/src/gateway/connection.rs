//! Inbound half of a realtime connection

use pd_protocol::{ConnectionId, Frame};

use super::handler::ConnectionSession;
use super::namespace::NamespaceHandle;
use super::socket::Socket;

/// An admitted connection, owned by the transport driver
///
/// Dropping a connection without calling [`Connection::close`] still
/// removes it from its namespace and drops the handler session.
pub struct Connection {
    socket: Socket,
    session: Option<Box<dyn ConnectionSession>>,
    namespace: NamespaceHandle,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("socket", &self.socket)
            .field("has_session", &self.session.is_some())
            .finish()
    }
}

impl Connection {
    pub(crate) fn new(
        socket: Socket,
        session: Box<dyn ConnectionSession>,
        namespace: NamespaceHandle,
    ) -> Self {
        Self {
            socket,
            session: Some(session),
            namespace,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.socket.id()
    }

    pub fn socket(&self) -> &Socket {
        &self.socket
    }

    /// Deliver one inbound frame to the handler session
    pub async fn dispatch(&mut self, frame: Frame) {
        if let Some(session) = self.session.as_mut() {
            session.on_event(frame).await;
        }
    }

    /// Decode and deliver one text message; malformed input is answered
    /// with an `error` frame
    pub async fn dispatch_text(&mut self, text: &str) {
        match Frame::decode(text) {
            Ok(frame) => self.dispatch(frame).await,
            Err(e) => {
                tracing::debug!("Malformed frame on {}: {}", self.socket.id(), e);
                self.socket.emit(Frame::error(e.to_string()));
            }
        }
    }

    /// Run the disconnect path and leave the namespace
    pub async fn close(mut self) {
        if let Some(mut session) = self.session.take() {
            session.on_disconnect().await;
        }
        self.namespace.untrack(&self.socket.id());
        tracing::info!(
            "Connection {} closed on {}",
            self.socket.id(),
            self.namespace.name()
        );
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.namespace.untrack(&self.socket.id());
    }
}
