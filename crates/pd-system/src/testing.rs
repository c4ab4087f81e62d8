//! In-memory capability fakes for unit tests

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use pd_core::traits::{ProcessControl, TelemetrySource};
use pd_core::{ProcessControlError, Signal, TelemetryError};
use pd_protocol::telemetry::{
    CpuLoad, DiskSnapshot, LoadAverage, MemoryUsage, NetworkSnapshot, ProcessInfo, ProcessList,
};

/// Telemetry with fixed figures, per-group call counters and optional
/// failing groups
#[derive(Default)]
pub(crate) struct FakeTelemetry {
    calls: Mutex<HashMap<&'static str, usize>>,
    failing: HashSet<&'static str>,
    flaky: HashMap<&'static str, usize>,
}

impl FakeTelemetry {
    pub(crate) fn failing(mut self, group: &'static str) -> Self {
        self.failing.insert(group);
        self
    }

    /// Fail the first `times` calls of `group`, then succeed
    pub(crate) fn failing_first(mut self, group: &'static str, times: usize) -> Self {
        self.flaky.insert(group, times);
        self
    }

    pub(crate) fn calls(&self, group: &'static str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(group)
            .copied()
            .unwrap_or(0)
    }

    fn record(&self, group: &'static str) -> Result<(), TelemetryError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(group).or_default();
            *count += 1;
            *count
        };
        let flaky = self.flaky.get(group).is_some_and(|times| call <= *times);
        if self.failing.contains(group) || flaky {
            Err(TelemetryError::Unavailable(group.to_string()))
        } else {
            Ok(())
        }
    }
}

fn process(pid: u32, cpu: f32) -> ProcessInfo {
    ProcessInfo {
        pid,
        parent_pid: Some(1),
        name: format!("proc-{}", pid),
        cpu,
        mem: 1.0,
        mem_rss: 1024,
        state: "running".to_string(),
        started: 0,
    }
}

#[async_trait]
impl TelemetrySource for FakeTelemetry {
    async fn cpu(&self) -> Result<CpuLoad, TelemetryError> {
        self.record("cpu")?;
        Ok(CpuLoad {
            current_load: 12.5,
            cores: Vec::new(),
            load_average: LoadAverage::default(),
        })
    }

    async fn memory(&self) -> Result<MemoryUsage, TelemetryError> {
        self.record("memory")?;
        Ok(MemoryUsage {
            total: 1000,
            used: 400,
            free: 600,
            available: 600,
            swap_total: 0,
            swap_used: 0,
        })
    }

    async fn processes(&self, _limit: usize) -> Result<ProcessList, TelemetryError> {
        self.record("processes")?;
        // Deliberately unsorted and over the limit
        Ok(ProcessList {
            all: 5,
            running: 5,
            list: vec![
                process(10, 1.0),
                process(11, 50.0),
                process(12, 7.5),
                process(13, 99.0),
                process(14, 0.0),
            ],
        })
    }

    fn uptime(&self) -> u64 {
        3600
    }

    async fn disks(&self) -> Result<DiskSnapshot, TelemetryError> {
        self.record("disks")?;
        Ok(DiskSnapshot::default())
    }

    async fn network(&self) -> Result<NetworkSnapshot, TelemetryError> {
        self.record("network")?;
        Ok(NetworkSnapshot::default())
    }
}

/// Process control that records requests
#[derive(Default)]
pub(crate) struct FakeProcess {
    requests: Mutex<Vec<(u32, Signal)>>,
    fail: bool,
    hang: bool,
}

impl FakeProcess {
    /// Never finishes a termination
    pub(crate) fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn requests(&self) -> Vec<(u32, Signal)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessControl for FakeProcess {
    async fn terminate(&self, pid: u32, signal: Signal) -> Result<(), ProcessControlError> {
        self.requests.lock().unwrap().push((pid, signal));
        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.fail {
            Err(ProcessControlError::Failed {
                pid,
                status: "exit status: 1".to_string(),
            })
        } else {
            Ok(())
        }
    }
}
