//! Capability traits handed to realtime plugins

mod process;
mod session;
mod telemetry;

pub use process::ProcessControl;
pub use session::SessionValidator;
pub use telemetry::TelemetrySource;
