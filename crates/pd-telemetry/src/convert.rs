//! Pure conversions from raw OS figures to wire snapshots

use std::time::Duration;

use pd_protocol::telemetry::{DiskLayout, InterfaceStats, NetworkInterface, Partition};
use sysinfo::ProcessStatus;

/// Lower-case scheduler state name
pub(crate) fn process_state(status: ProcessStatus) -> String {
    match status {
        ProcessStatus::Run => "running".to_string(),
        ProcessStatus::Sleep | ProcessStatus::Idle => "sleeping".to_string(),
        ProcessStatus::Stop => "stopped".to_string(),
        ProcessStatus::Zombie => "zombie".to_string(),
        ProcessStatus::Dead => "dead".to_string(),
        other => other.to_string().to_lowercase(),
    }
}

/// Share of `total` taken by `part`, in percent
pub(crate) fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

/// Bytes per second over `elapsed`
pub(crate) fn rate(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        0.0
    } else {
        bytes as f64 / secs
    }
}

pub(crate) fn partition(
    fs: String,
    fs_type: String,
    mount: String,
    size: u64,
    available: u64,
) -> Partition {
    let used = size.saturating_sub(available);
    Partition {
        fs,
        fs_type,
        mount,
        size,
        used,
        available,
        use_percent: percent(used, size),
    }
}

/// Collapse partitions of the same device into one layout entry
pub(crate) fn dedup_layouts(mut layouts: Vec<DiskLayout>) -> Vec<DiskLayout> {
    layouts.sort_by(|a, b| a.name.cmp(&b.name));
    layouts.dedup_by(|next, kept| {
        if next.name == kept.name {
            kept.size = kept.size.max(next.size);
            true
        } else {
            false
        }
    });
    layouts
}

pub(crate) fn is_loopback(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower == "lo" || lower.starts_with("lo0") || lower.contains("loopback")
}

/// The non-loopback interface that has moved the most traffic
pub(crate) fn default_interface(
    interfaces: &[NetworkInterface],
    stats: &[InterfaceStats],
) -> Option<String> {
    stats
        .iter()
        .filter(|s| {
            interfaces
                .iter()
                .any(|i| i.iface == s.iface && !i.loopback)
        })
        .max_by_key(|s| s.rx_bytes.saturating_add(s.tx_bytes))
        .map(|s| s.iface.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iface(name: &str) -> NetworkInterface {
        NetworkInterface {
            iface: name.to_string(),
            mac: "00:00:00:00:00:00".to_string(),
            loopback: is_loopback(name),
        }
    }

    fn traffic(name: &str, rx: u64, tx: u64) -> InterfaceStats {
        InterfaceStats {
            iface: name.to_string(),
            rx_bytes: rx,
            tx_bytes: tx,
            rx_sec: 0.0,
            tx_sec: 0.0,
            rx_errors: 0,
            tx_errors: 0,
        }
    }

    #[test]
    fn test_process_state() {
        assert_eq!(process_state(ProcessStatus::Run), "running");
        assert_eq!(process_state(ProcessStatus::Sleep), "sleeping");
        assert_eq!(process_state(ProcessStatus::Zombie), "zombie");
    }

    #[test]
    fn test_partition_usage() {
        let p = partition("sda1".into(), "ext4".into(), "/".into(), 200, 50);
        assert_eq!(p.used, 150);
        assert_eq!(p.use_percent, 75.0);

        let empty = partition("none".into(), "tmpfs".into(), "/run".into(), 0, 0);
        assert_eq!(empty.use_percent, 0.0);
    }

    #[test]
    fn test_rate() {
        assert_eq!(rate(1000, Duration::from_secs(2)), 500.0);
        assert_eq!(rate(1000, Duration::ZERO), 0.0);
    }

    #[test]
    fn test_dedup_layouts() {
        let disk = |name: &str, size| DiskLayout {
            name: name.to_string(),
            kind: "SSD".to_string(),
            removable: false,
            size,
        };
        let layouts = dedup_layouts(vec![disk("b", 1), disk("a", 5), disk("a", 9)]);
        assert_eq!(layouts.len(), 2);
        assert_eq!(layouts[0].name, "a");
        assert_eq!(layouts[0].size, 9);
    }

    #[test]
    fn test_default_interface_skips_loopback() {
        let interfaces = vec![iface("lo"), iface("eth0"), iface("wlan0")];
        let stats = vec![
            traffic("lo", 10_000, 10_000),
            traffic("eth0", 100, 50),
            traffic("wlan0", 500, 10),
        ];
        assert_eq!(
            default_interface(&interfaces, &stats).as_deref(),
            Some("wlan0")
        );
        assert_eq!(default_interface(&[iface("lo")], &stats[..1]), None);
    }
}
