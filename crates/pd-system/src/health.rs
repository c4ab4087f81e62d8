//! Failure tracking per metric group

use std::fmt;

/// Consecutive failures after which a group is only retried occasionally
pub const BACKOFF_AFTER: u32 = 5;

/// While backing off, a group is gathered once every this many ticks
pub const RETRY_EVERY: u32 = 5;

/// Independently gathered parts of a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricGroup {
    /// CPU, memory, processes and uptime
    Stats,
    Disk,
    Network,
}

impl fmt::Display for MetricGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricGroup::Stats => write!(f, "stats"),
            MetricGroup::Disk => write!(f, "disk"),
            MetricGroup::Network => write!(f, "network"),
        }
    }
}

/// Health of one metric group within a monitoring run.
///
/// A group that keeps failing is not dropped: after [`BACKOFF_AFTER`]
/// failures in a row it is retried every [`RETRY_EVERY`] ticks, and the
/// first success puts it back on every tick.
#[derive(Debug, Clone, Copy)]
pub struct GroupHealth {
    group: MetricGroup,
    consecutive_failures: u32,
    backing_off: bool,
    skipped: u32,
}

impl GroupHealth {
    pub fn new(group: MetricGroup) -> Self {
        Self {
            group,
            consecutive_failures: 0,
            backing_off: false,
            skipped: 0,
        }
    }

    pub fn is_backing_off(&self) -> bool {
        self.backing_off
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Whether this tick should gather the group
    pub fn due(&mut self) -> bool {
        if !self.backing_off {
            return true;
        }
        self.skipped += 1;
        if self.skipped >= RETRY_EVERY {
            self.skipped = 0;
            true
        } else {
            false
        }
    }

    pub fn record_success(&mut self) {
        if self.backing_off {
            tracing::info!(
                "{} telemetry recovered after {} failure(s)",
                self.group,
                self.consecutive_failures
            );
        } else if self.consecutive_failures > 0 {
            tracing::debug!(
                "{} telemetry recovered after {} failure(s)",
                self.group,
                self.consecutive_failures
            );
        }
        self.consecutive_failures = 0;
        self.backing_off = false;
        self.skipped = 0;
    }

    pub fn record_failure(&mut self, error: &dyn fmt::Display) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if self.consecutive_failures == 1 {
            tracing::warn!("Failed to gather {} telemetry: {}", self.group, error);
        } else {
            tracing::debug!(
                "Failed to gather {} telemetry ({} in a row): {}",
                self.group,
                self.consecutive_failures,
                error
            );
        }

        if !self.backing_off && self.consecutive_failures >= BACKOFF_AFTER {
            self.backing_off = true;
            self.skipped = 0;
            tracing::info!(
                "Retrying {} telemetry every {} ticks until it recovers",
                self.group,
                RETRY_EVERY
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fail_times(health: &mut GroupHealth, n: u32) {
        for _ in 0..n {
            health.record_failure(&"no disks");
        }
    }

    #[test]
    fn test_backs_off_after_consecutive_failures() {
        let mut health = GroupHealth::new(MetricGroup::Disk);
        fail_times(&mut health, BACKOFF_AFTER - 1);
        assert!(!health.is_backing_off());
        assert!(health.due());

        health.record_failure(&"no disks");
        assert!(health.is_backing_off());
    }

    #[test]
    fn test_backing_off_group_is_retried_periodically() {
        let mut health = GroupHealth::new(MetricGroup::Disk);
        fail_times(&mut health, BACKOFF_AFTER);

        let pattern: Vec<bool> = (0..2 * RETRY_EVERY).map(|_| health.due()).collect();
        let retries = pattern.iter().filter(|due| **due).count();
        assert_eq!(retries, 2);
        assert!(pattern[RETRY_EVERY as usize - 1]);
        assert!(!pattern[0]);
    }

    #[test]
    fn test_success_ends_backoff() {
        let mut health = GroupHealth::new(MetricGroup::Stats);
        fail_times(&mut health, BACKOFF_AFTER + 3);
        health.record_success();

        assert!(!health.is_backing_off());
        assert_eq!(health.consecutive_failures(), 0);
        assert!((0..RETRY_EVERY).all(|_| health.due()));
    }

    #[test]
    fn test_success_resets_streak() {
        let mut health = GroupHealth::new(MetricGroup::Network);
        fail_times(&mut health, BACKOFF_AFTER - 1);
        health.record_success();
        assert_eq!(health.consecutive_failures(), 0);

        health.record_failure(&"down");
        assert!(!health.is_backing_off());
    }
}
