//! Time utilities for plugdesk
//!
//! Session timestamps are Unix milliseconds throughout.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Get the current Unix timestamp in milliseconds.
///
/// Returns 0 if the system clock is before the Unix epoch.
pub fn current_time_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Add a duration to a millisecond timestamp, saturating on overflow.
pub fn add_duration(millis: u64, duration: Duration) -> u64 {
    millis.saturating_add(duration.as_millis().min(u64::MAX as u128) as u64)
}

/// Whole seconds left until `deadline`, rounded up.
///
/// Returns 0 if the deadline has passed.
pub fn remaining_secs(deadline: u64, now: u64) -> u64 {
    deadline.saturating_sub(now).div_ceil(1000)
}
