//! Seams between the gateway and namespace owners

use async_trait::async_trait;
use pd_protocol::Frame;

use super::socket::Socket;

/// Attached to a namespace; creates per-connection state for every
/// admitted socket
#[async_trait]
pub trait ConnectionHandler: Send + Sync {
    async fn on_connect(&self, socket: Socket) -> Box<dyn ConnectionSession>;
}

/// Per-connection state owned by the transport driver
///
/// Events are delivered one at a time, in arrival order. `on_disconnect` is
/// called exactly once, after the last event.
#[async_trait]
pub trait ConnectionSession: Send {
    async fn on_event(&mut self, frame: Frame);

    async fn on_disconnect(&mut self);
}
