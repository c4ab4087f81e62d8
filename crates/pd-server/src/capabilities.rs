//! Host capabilities handed to plugins at registration time

use std::sync::Arc;

use pd_core::traits::{ProcessControl, SessionValidator, TelemetrySource};
use pd_core::{PlatformInfo, SESSION_HEADER};

/// Services the host provides; plugins never reach for globals
#[derive(Clone)]
pub struct Capabilities {
    /// Machine telemetry
    pub telemetry: Arc<dyn TelemetrySource>,
    /// Process signalling
    pub process: Arc<dyn ProcessControl>,
    /// Platform description
    pub platform: PlatformInfo,
    /// Session validation, for plugins that install their own gate
    pub sessions: Arc<dyn SessionValidator>,
    /// Header carrying the session token
    pub session_header: &'static str,
}

impl Capabilities {
    pub fn new(host: HostServices, sessions: Arc<dyn SessionValidator>) -> Self {
        Self {
            telemetry: host.telemetry,
            process: host.process,
            platform: host.platform,
            sessions,
            session_header: SESSION_HEADER,
        }
    }
}

/// Platform-facing services supplied by the embedding binary
#[derive(Clone)]
pub struct HostServices {
    pub telemetry: Arc<dyn TelemetrySource>,
    pub process: Arc<dyn ProcessControl>,
    pub platform: PlatformInfo,
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities")
            .field("platform", &self.platform)
            .field("session_header", &self.session_header)
            .finish_non_exhaustive()
    }
}
