//! Monitor settings read from the plugin's `[settings]` table

use std::time::Duration;

use pd_core::config::serde_utils::duration_millis;
use serde::{Deserialize, Serialize};

/// Shortest accepted tick interval
pub const MIN_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Time between telemetry ticks
    #[serde(rename = "interval_ms", with = "duration_millis")]
    pub interval: Duration,

    /// Number of processes sent in each `stats` event
    pub process_limit: usize,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            process_limit: 100,
        }
    }
}

impl MonitorSettings {
    /// Clamp out-of-range values, logging each adjustment
    pub fn sanitized(mut self) -> Self {
        if self.interval < MIN_INTERVAL {
            tracing::warn!(
                "interval_ms {} is below the minimum, using {}",
                self.interval.as_millis(),
                MIN_INTERVAL.as_millis()
            );
            self.interval = MIN_INTERVAL;
        }
        if self.process_limit == 0 {
            tracing::warn!("process_limit 0 is invalid, using 1");
            self.process_limit = 1;
        }
        self
    }
}
