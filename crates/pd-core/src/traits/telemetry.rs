//! Telemetry source capability

use async_trait::async_trait;

use pd_protocol::telemetry::{CpuLoad, DiskSnapshot, MemoryUsage, NetworkSnapshot, ProcessList};

use crate::error::TelemetryError;

/// Point-in-time system measurements.
///
/// Every gathering call may block on the OS and is therefore async; callers
/// may run several of them concurrently.
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Aggregate and per-core CPU load
    async fn cpu(&self) -> Result<CpuLoad, TelemetryError>;

    /// Memory and swap usage
    async fn memory(&self) -> Result<MemoryUsage, TelemetryError>;

    /// The `limit` busiest processes, sorted by CPU descending
    async fn processes(&self, limit: usize) -> Result<ProcessList, TelemetryError>;

    /// Seconds since boot
    fn uptime(&self) -> u64;

    /// Disk layout, mounted partitions and I/O
    async fn disks(&self) -> Result<DiskSnapshot, TelemetryError>;

    /// Network interfaces and traffic
    async fn network(&self) -> Result<NetworkSnapshot, TelemetryError>;
}
