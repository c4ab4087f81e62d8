//! Telemetry snapshot payloads
//!
//! These are the bodies of the `stats`, `disk` and `network` events pushed on
//! the `/system` namespace. Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};

/// Aggregate and per-core CPU load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuLoad {
    /// Aggregate load across all cores (0-100)
    pub current_load: f32,
    /// Per-core load
    pub cores: Vec<CoreLoad>,
    /// 1, 5 and 15 minute load averages
    pub load_average: LoadAverage,
}

/// Load of a single logical core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreLoad {
    /// Core name as reported by the OS
    pub name: String,
    /// Load (0-100)
    pub load: f32,
    /// Current frequency in MHz
    pub frequency_mhz: u64,
}

/// System load averages
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadAverage {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

/// Memory usage in bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub available: u64,
    pub swap_total: u64,
    pub swap_used: u64,
}

/// One process entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessInfo {
    pub pid: u32,
    pub parent_pid: Option<u32>,
    pub name: String,
    /// CPU usage percentage (may exceed 100 on multi-core machines)
    pub cpu: f32,
    /// Share of total memory (0-100)
    pub mem: f32,
    /// Resident set size in bytes
    pub mem_rss: u64,
    /// Lower-case scheduler state (`running`, `sleeping`, ...)
    pub state: String,
    /// Start time in seconds since the Unix epoch
    pub started: u64,
}

/// Process table summary with the busiest processes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessList {
    /// Total number of processes seen
    pub all: usize,
    /// Number of processes currently running
    pub running: usize,
    /// Processes sorted by CPU descending
    pub list: Vec<ProcessInfo>,
}

impl ProcessList {
    /// Build a process list from raw entries, keeping the `limit` busiest
    pub fn from_processes(processes: Vec<ProcessInfo>, limit: usize) -> Self {
        let all = processes.len();
        let running = processes.iter().filter(|p| p.state == "running").count();
        Self {
            all,
            running,
            list: processes,
        }
        .top_by_cpu(limit)
    }

    /// Sort by CPU descending and truncate to `limit` entries.
    ///
    /// The `all` and `running` counters describe the whole table and are kept.
    pub fn top_by_cpu(mut self, limit: usize) -> Self {
        self.list.sort_by(|a, b| b.cpu.total_cmp(&a.cpu));
        self.list.truncate(limit);
        self
    }

    /// Whether the list is ordered by CPU descending
    pub fn is_sorted_by_cpu(&self) -> bool {
        self.list.windows(2).all(|w| w[0].cpu >= w[1].cpu)
    }
}

/// Payload of the `stats` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub cpu: CpuLoad,
    pub memory: MemoryUsage,
    pub processes: ProcessList,
    /// Seconds since boot
    pub uptime: u64,
}

/// Physical disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskLayout {
    pub name: String,
    /// `SSD`, `HDD` or `Unknown`
    pub kind: String,
    pub removable: bool,
    pub size: u64,
}

/// Mounted file system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partition {
    /// Device name
    pub fs: String,
    /// File system type
    #[serde(rename = "type")]
    pub fs_type: String,
    pub mount: String,
    pub size: u64,
    pub used: u64,
    pub available: u64,
    /// Used share of `size` (0-100)
    pub use_percent: f64,
}

/// Aggregate disk I/O since the previous sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskIo {
    pub read_bytes: u64,
    pub written_bytes: u64,
    pub total_read_bytes: u64,
    pub total_written_bytes: u64,
}

/// Payload of the `disk` event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskSnapshot {
    pub disks: Vec<DiskLayout>,
    pub partitions: Vec<Partition>,
    pub io: Option<DiskIo>,
}

/// Network interface identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    pub iface: String,
    pub mac: String,
    pub loopback: bool,
}

/// Traffic counters of one interface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceStats {
    pub iface: String,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    /// Received bytes per second since the previous sample
    pub rx_sec: f64,
    /// Transmitted bytes per second since the previous sample
    pub tx_sec: f64,
    pub rx_errors: u64,
    pub tx_errors: u64,
}

/// Payload of the `network` event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSnapshot {
    pub interfaces: Vec<NetworkInterface>,
    pub stats: Vec<InterfaceStats>,
    pub default_interface: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn process(pid: u32, cpu: f32, state: &str) -> ProcessInfo {
        ProcessInfo {
            pid,
            parent_pid: None,
            name: format!("proc-{}", pid),
            cpu,
            mem: 0.0,
            mem_rss: 0,
            state: state.to_string(),
            started: 0,
        }
    }

    #[test]
    fn test_process_list_sorted_and_truncated() {
        let raw = vec![
            process(1, 0.5, "sleeping"),
            process(2, 42.0, "running"),
            process(3, 7.25, "running"),
            process(4, 99.0, "sleeping"),
        ];
        let list = ProcessList::from_processes(raw, 3);

        assert_eq!(list.all, 4);
        assert_eq!(list.running, 2);
        assert_eq!(list.list.len(), 3);
        let pids: Vec<u32> = list.list.iter().map(|p| p.pid).collect();
        assert_eq!(pids, vec![4, 2, 3]);
        assert!(list.is_sorted_by_cpu());
    }

    #[test]
    fn test_stats_wire_names() {
        let stats = StatsSnapshot {
            cpu: CpuLoad {
                current_load: 12.5,
                cores: vec![],
                load_average: LoadAverage::default(),
            },
            memory: MemoryUsage::default(),
            processes: ProcessList::default(),
            uptime: 10,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["cpu"]["currentLoad"], 12.5);
        assert!(json["processes"]["list"].is_array());
        assert!(json["memory"]["swapTotal"].is_number());
    }

    #[test]
    fn test_partition_type_field() {
        let partition = Partition {
            fs: "/dev/sda1".into(),
            fs_type: "ext4".into(),
            mount: "/".into(),
            size: 100,
            used: 40,
            available: 60,
            use_percent: 40.0,
        };
        let json = serde_json::to_value(&partition).unwrap();
        assert_eq!(json["type"], "ext4");
        assert_eq!(json["usePercent"], 40.0);
    }
}
