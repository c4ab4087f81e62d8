//! Telemetry backed by `sysinfo`
//!
//! Each metric group keeps its own `sysinfo` state behind a mutex so that
//! the groups can be sampled concurrently. Sampling runs on the blocking
//! thread pool.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use async_trait::async_trait;
use pd_core::traits::TelemetrySource;
use pd_core::TelemetryError;
use pd_protocol::telemetry::{
    CoreLoad, CpuLoad, DiskIo, DiskLayout, DiskSnapshot, InterfaceStats, LoadAverage,
    MemoryUsage, NetworkInterface, NetworkSnapshot, ProcessInfo, ProcessList,
};
use sysinfo::{
    DiskKind, Disks, Networks, ProcessRefreshKind, ProcessesToUpdate, System, MINIMUM_CPU_UPDATE_INTERVAL,
};

use crate::convert;

/// A `sysinfo` handle whose CPU figures need a second refresh before they
/// are meaningful
struct Primed {
    system: System,
    primed: bool,
}

impl Primed {
    fn new() -> Self {
        Self {
            system: System::new(),
            primed: false,
        }
    }
}

struct NetworkState {
    networks: Networks,
    sampled_at: Instant,
}

struct Inner {
    cpu: Mutex<Primed>,
    memory: Mutex<System>,
    processes: Mutex<Primed>,
    disk_io: Mutex<System>,
    network: Mutex<NetworkState>,
}

/// Telemetry source reading the local machine
#[derive(Clone)]
pub struct SysinfoTelemetry {
    inner: Arc<Inner>,
}

impl SysinfoTelemetry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                cpu: Mutex::new(Primed::new()),
                memory: Mutex::new(System::new()),
                processes: Mutex::new(Primed::new()),
                disk_io: Mutex::new(System::new()),
                network: Mutex::new(NetworkState {
                    networks: Networks::new_with_refreshed_list(),
                    sampled_at: Instant::now(),
                }),
            }),
        }
    }

    async fn sample<T, F>(&self, group: &'static str, f: F) -> Result<T, TelemetryError>
    where
        T: Send + 'static,
        F: FnOnce(&Inner) -> T + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || f(&inner))
            .await
            .map_err(|e| TelemetryError::Task(format!("{} sampling: {}", group, e)))
    }
}

impl Default for SysinfoTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

fn read_cpu(state: &mut Primed) -> CpuLoad {
    state.system.refresh_cpu_usage();
    if !state.primed {
        std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
        state.system.refresh_cpu_usage();
        state.primed = true;
    }

    let system = &state.system;
    let load = System::load_average();
    CpuLoad {
        current_load: system.global_cpu_usage(),
        cores: system
            .cpus()
            .iter()
            .map(|cpu| CoreLoad {
                name: cpu.name().to_string(),
                load: cpu.cpu_usage(),
                frequency_mhz: cpu.frequency(),
            })
            .collect(),
        load_average: LoadAverage {
            one: load.one,
            five: load.five,
            fifteen: load.fifteen,
        },
    }
}

fn read_memory(system: &mut System) -> MemoryUsage {
    system.refresh_memory();
    MemoryUsage {
        total: system.total_memory(),
        used: system.used_memory(),
        free: system.free_memory(),
        available: system.available_memory(),
        swap_total: system.total_swap(),
        swap_used: system.used_swap(),
    }
}

fn read_processes(state: &mut Primed, limit: usize) -> ProcessList {
    let kind = ProcessRefreshKind::new().with_cpu().with_memory();
    state
        .system
        .refresh_processes_specifics(ProcessesToUpdate::All, true, kind);
    if !state.primed {
        std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
        state
            .system
            .refresh_processes_specifics(ProcessesToUpdate::All, true, kind);
        state.primed = true;
    }
    state.system.refresh_memory();

    let system = &state.system;
    let total_memory = system.total_memory();
    let processes = system
        .processes()
        .values()
        .map(|p| ProcessInfo {
            pid: p.pid().as_u32(),
            parent_pid: p.parent().map(|pid| pid.as_u32()),
            name: p.name().to_string_lossy().into_owned(),
            cpu: p.cpu_usage(),
            mem: convert::percent(p.memory(), total_memory) as f32,
            mem_rss: p.memory(),
            state: convert::process_state(p.status()),
            started: p.start_time(),
        })
        .collect();

    ProcessList::from_processes(processes, limit)
}

fn disk_kind(kind: DiskKind) -> &'static str {
    match kind {
        DiskKind::SSD => "SSD",
        DiskKind::HDD => "HDD",
        DiskKind::Unknown(_) => "Unknown",
    }
}

fn read_disks(io_system: &mut System) -> DiskSnapshot {
    let disks = Disks::new_with_refreshed_list();

    let mut layouts = Vec::new();
    let mut partitions = Vec::new();
    for disk in disks.list() {
        let name = disk.name().to_string_lossy().into_owned();
        layouts.push(DiskLayout {
            name: name.clone(),
            kind: disk_kind(disk.kind()).to_string(),
            removable: disk.is_removable(),
            size: disk.total_space(),
        });
        partitions.push(convert::partition(
            name,
            disk.file_system().to_string_lossy().into_owned(),
            disk.mount_point().display().to_string(),
            disk.total_space(),
            disk.available_space(),
        ));
    }

    io_system.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true,
        ProcessRefreshKind::new().with_disk_usage(),
    );
    let io = io_system
        .processes()
        .values()
        .map(|p| p.disk_usage())
        .fold(DiskIo::default(), |acc, usage| DiskIo {
            read_bytes: acc.read_bytes.saturating_add(usage.read_bytes),
            written_bytes: acc.written_bytes.saturating_add(usage.written_bytes),
            total_read_bytes: acc.total_read_bytes.saturating_add(usage.total_read_bytes),
            total_written_bytes: acc
                .total_written_bytes
                .saturating_add(usage.total_written_bytes),
        });

    DiskSnapshot {
        disks: convert::dedup_layouts(layouts),
        partitions,
        io: Some(io),
    }
}

fn read_network(state: &mut NetworkState) -> NetworkSnapshot {
    state.networks.refresh();
    let now = Instant::now();
    let elapsed = now.duration_since(state.sampled_at);
    state.sampled_at = now;

    let mut names: Vec<&String> = state.networks.list().keys().collect();
    names.sort();

    let mut interfaces = Vec::with_capacity(names.len());
    let mut stats = Vec::with_capacity(names.len());
    for name in names {
        let Some(data) = state.networks.list().get(name) else {
            continue;
        };
        interfaces.push(NetworkInterface {
            iface: name.clone(),
            mac: data.mac_address().to_string(),
            loopback: convert::is_loopback(name),
        });
        stats.push(InterfaceStats {
            iface: name.clone(),
            rx_bytes: data.total_received(),
            tx_bytes: data.total_transmitted(),
            rx_sec: convert::rate(data.received(), elapsed),
            tx_sec: convert::rate(data.transmitted(), elapsed),
            rx_errors: data.total_errors_on_received(),
            tx_errors: data.total_errors_on_transmitted(),
        });
    }

    let default_interface = convert::default_interface(&interfaces, &stats);
    NetworkSnapshot {
        interfaces,
        stats,
        default_interface,
    }
}

#[async_trait]
impl TelemetrySource for SysinfoTelemetry {
    async fn cpu(&self) -> Result<CpuLoad, TelemetryError> {
        self.sample("cpu", |inner| read_cpu(&mut lock(&inner.cpu)))
            .await
    }

    async fn memory(&self) -> Result<MemoryUsage, TelemetryError> {
        let memory = self
            .sample("memory", |inner| read_memory(&mut lock(&inner.memory)))
            .await?;
        if memory.total == 0 {
            return Err(TelemetryError::Unavailable(
                "memory figures not reported".to_string(),
            ));
        }
        Ok(memory)
    }

    async fn processes(&self, limit: usize) -> Result<ProcessList, TelemetryError> {
        self.sample("processes", move |inner| {
            read_processes(&mut lock(&inner.processes), limit)
        })
        .await
    }

    fn uptime(&self) -> u64 {
        System::uptime()
    }

    async fn disks(&self) -> Result<DiskSnapshot, TelemetryError> {
        self.sample("disk", |inner| read_disks(&mut lock(&inner.disk_io)))
            .await
    }

    async fn network(&self) -> Result<NetworkSnapshot, TelemetryError> {
        self.sample("network", |inner| read_network(&mut lock(&inner.network)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cpu_reports_cores() {
        let telemetry = SysinfoTelemetry::new();
        let cpu = telemetry.cpu().await.unwrap();
        assert!(!cpu.cores.is_empty());
        assert!(cpu.current_load >= 0.0);
    }

    #[tokio::test]
    async fn test_memory() {
        let memory = SysinfoTelemetry::new().memory().await.unwrap();
        assert!(memory.total > 0);
        assert!(memory.used <= memory.total);
    }

    #[tokio::test]
    async fn test_processes_sorted_and_limited() {
        let telemetry = SysinfoTelemetry::new();
        let list = telemetry.processes(5).await.unwrap();
        assert!(list.list.len() <= 5);
        assert!(list.all >= list.list.len());
        assert!(list.is_sorted_by_cpu());

        let me = std::process::id();
        let all = telemetry.processes(usize::MAX).await.unwrap();
        assert!(all.list.iter().any(|p| p.pid == me));
    }

    #[tokio::test]
    async fn test_network_and_disks_do_not_fail() {
        let telemetry = SysinfoTelemetry::new();
        let network = telemetry.network().await.unwrap();
        assert_eq!(network.interfaces.len(), network.stats.len());
        let disks = telemetry.disks().await.unwrap();
        assert!(disks.io.is_some());
    }
}
