//! Outbound half of a realtime connection

use pd_core::Session;
use pd_protocol::{ConnectionId, Frame};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Handle used to emit frames to one client
///
/// Cloning is cheap; all clones feed the same bounded queue. The queue is
/// drained by the transport driver, so emitting never blocks the caller.
#[derive(Clone)]
pub struct Socket {
    id: ConnectionId,
    namespace: String,
    session: Session,
    tx: mpsc::Sender<Frame>,
}

impl Socket {
    pub(crate) fn new(
        namespace: impl Into<String>,
        session: Session,
        tx: mpsc::Sender<Frame>,
    ) -> Self {
        Self {
            id: ConnectionId::new(),
            namespace: namespace.into(),
            session,
            tx,
        }
    }

    /// A socket not attached to any transport; frames go to the returned
    /// receiver. Useful for driving connection sessions directly.
    pub fn detached(
        namespace: impl Into<String>,
        session: Session,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(namespace, session, tx), rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The session that admitted this connection
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Queue a frame for this client.
    ///
    /// Returns `false` if the frame was dropped because the client is gone
    /// or its queue is full.
    pub fn emit(&self, frame: Frame) -> bool {
        match self.tx.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(frame)) => {
                tracing::warn!(
                    "Outbound queue full for {}, dropping '{}' frame",
                    self.id,
                    frame.event
                );
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl std::fmt::Debug for Socket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Socket")
            .field("id", &self.id)
            .field("namespace", &self.namespace)
            .field("user_id", &self.session.user_id)
            .finish()
    }
}
