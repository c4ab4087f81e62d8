//! pd-core: Core abstractions and configuration for plugdesk
//!
//! This crate provides the Session Authority, the error taxonomy, the
//! configuration structures, and the capability traits that the host hands
//! to realtime plugins.

pub mod config;
pub mod error;
pub mod session;
pub mod time;
pub mod token;
pub mod traits;
pub mod types;

pub use error::{AuthError, InvalidateError, ProcessControlError, TelemetryError};
pub use session::{LockReceipt, Session, SessionAuthority, DEFAULT_SESSION_TTL};
pub use token::SESSION_HEADER;
pub use types::{PlatformInfo, Signal};
