//! pd-telemetry: host services backed by the operating system
//!
//! [`SysinfoTelemetry`] implements the telemetry capability on top of
//! `sysinfo`; [`SignalCommand`] implements process control by running the
//! platform's termination command.

mod convert;
pub mod signal;
pub mod sysinfo_source;

pub use signal::{kill_command, SignalCommand};
pub use sysinfo_source::SysinfoTelemetry;
