//! Periodic telemetry producer
//!
//! One task per monitoring run. Ticks never overlap: the loop awaits each
//! tick before waiting for the next, and ticks missed meanwhile are skipped.

use std::sync::Arc;

use pd_core::traits::TelemetrySource;
use pd_core::TelemetryError;
use pd_protocol::telemetry::StatsSnapshot;
use pd_protocol::SystemEvent;
use pd_server::Socket;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::health::{GroupHealth, MetricGroup};
use crate::settings::MonitorSettings;

/// Handle to a running producer task
pub(crate) struct MonitorTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl MonitorTask {
    pub(crate) fn spawn(
        socket: Socket,
        telemetry: Arc<dyn TelemetrySource>,
        settings: MonitorSettings,
    ) -> Self {
        let cancel = CancellationToken::new();
        let producer = Producer::new(socket, telemetry, settings);
        let handle = tokio::spawn(producer.run(cancel.clone()));
        Self { cancel, handle }
    }

    /// Cancel the task and wait until it has stopped
    pub(crate) async fn stop(self) {
        self.cancel.cancel();
        self.handle.abort();
        let _ = self.handle.await;
    }

    /// Cancel the task without waiting
    pub(crate) fn abort(&self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}

struct Producer {
    socket: Socket,
    telemetry: Arc<dyn TelemetrySource>,
    settings: MonitorSettings,
    stats: GroupHealth,
    disk: GroupHealth,
    network: GroupHealth,
}

impl Producer {
    fn new(
        socket: Socket,
        telemetry: Arc<dyn TelemetrySource>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            socket,
            telemetry,
            settings,
            stats: GroupHealth::new(MetricGroup::Stats),
            disk: GroupHealth::new(MetricGroup::Disk),
            network: GroupHealth::new(MetricGroup::Network),
        }
    }

    async fn run(mut self, cancel: CancellationToken) {
        let mut ticker = interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => self.tick().await,
            }
        }
    }

    async fn tick(&mut self) {
        if self.stats.due() {
            match self.gather_stats().await {
                Ok(stats) => {
                    self.stats.record_success();
                    self.emit(SystemEvent::Stats(stats));
                }
                Err(e) => self.stats.record_failure(&e),
            }
        }

        if self.disk.due() {
            match self.telemetry.disks().await {
                Ok(disk) => {
                    self.disk.record_success();
                    self.emit(SystemEvent::Disk(disk));
                }
                Err(e) => self.disk.record_failure(&e),
            }
        }

        if self.network.due() {
            match self.telemetry.network().await {
                Ok(network) => {
                    self.network.record_success();
                    self.emit(SystemEvent::Network(network));
                }
                Err(e) => self.network.record_failure(&e),
            }
        }
    }

    async fn gather_stats(&self) -> Result<StatsSnapshot, TelemetryError> {
        let limit = self.settings.process_limit;
        let (cpu, memory, processes) = tokio::join!(
            self.telemetry.cpu(),
            self.telemetry.memory(),
            self.telemetry.processes(limit),
        );

        Ok(StatsSnapshot {
            cpu: cpu?,
            memory: memory?,
            processes: processes?.top_by_cpu(limit),
            uptime: self.telemetry.uptime(),
        })
    }

    fn emit(&self, event: SystemEvent) {
        emit(&self.socket, event);
    }
}

/// Encode and queue one `/system` event on a socket
pub(crate) fn emit(socket: &Socket, event: SystemEvent) {
    match event.to_frame() {
        Ok(frame) => {
            socket.emit(frame);
        }
        Err(e) => tracing::warn!("Failed to encode '{}' event: {}", event.name(), e),
    }
}
