//! pd-protocol: Realtime wire protocol for plugdesk
//!
//! This crate defines the JSON frames exchanged between browser clients and
//! plugin namespaces on the shared realtime transport, plus the typed event
//! vocabulary and telemetry payloads of the `/system` namespace.

pub mod connection;
pub mod error;
pub mod frame;
pub mod system;
pub mod telemetry;

pub use connection::ConnectionId;
pub use error::ProtocolError;
pub use frame::{ConnectErrorPayload, Frame, CONNECT_ERROR_EVENT, ERROR_EVENT};
pub use system::{KillRequest, SystemEvent, SystemRequest, SYSTEM_NAMESPACE};
