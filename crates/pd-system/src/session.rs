//! Per-connection state machine of the `/system` namespace

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pd_core::time::current_time_millis;
use pd_core::traits::{ProcessControl, TelemetrySource};
use pd_core::Signal;
use pd_protocol::{Frame, KillRequest, SystemEvent, SystemRequest};
use pd_server::{Capabilities, ConnectionHandler, ConnectionSession, Socket};
use tokio::task::JoinSet;

use crate::monitor::{emit, MonitorTask};
use crate::settings::MonitorSettings;

/// Where a connection is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Authenticated and idle
    Connected,
    /// Periodic push active
    Monitoring,
    /// Disconnected; terminal
    Closed,
}

/// Longest wait for one termination command before reporting failure
pub const KILL_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection handler attached to the `/system` namespace
pub struct SystemHandler {
    telemetry: Arc<dyn TelemetrySource>,
    process: Arc<dyn ProcessControl>,
    settings: MonitorSettings,
}

impl SystemHandler {
    pub fn new(caps: &Capabilities, settings: MonitorSettings) -> Self {
        Self {
            telemetry: Arc::clone(&caps.telemetry),
            process: Arc::clone(&caps.process),
            settings,
        }
    }
}

#[async_trait]
impl ConnectionHandler for SystemHandler {
    async fn on_connect(&self, socket: Socket) -> Box<dyn ConnectionSession> {
        Box::new(MonitorSession::new(
            socket,
            Arc::clone(&self.telemetry),
            Arc::clone(&self.process),
            self.settings,
        ))
    }
}

/// Telemetry streaming session owned by one connection
pub struct MonitorSession {
    socket: Socket,
    telemetry: Arc<dyn TelemetrySource>,
    process: Arc<dyn ProcessControl>,
    settings: MonitorSettings,
    task: Option<MonitorTask>,
    /// In-flight termination requests; aborted with the session
    kills: JoinSet<()>,
    closed: bool,
}

impl MonitorSession {
    pub fn new(
        socket: Socket,
        telemetry: Arc<dyn TelemetrySource>,
        process: Arc<dyn ProcessControl>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            socket,
            telemetry,
            process,
            settings,
            task: None,
            kills: JoinSet::new(),
            closed: false,
        }
    }

    pub fn state(&self) -> MonitorState {
        if self.closed {
            MonitorState::Closed
        } else if self.task.is_some() {
            MonitorState::Monitoring
        } else {
            MonitorState::Connected
        }
    }

    pub async fn handle(&mut self, request: SystemRequest) {
        if self.closed {
            return;
        }
        match request {
            SystemRequest::Ping => self.ping(),
            SystemRequest::StartMonitoring => self.start_monitoring().await,
            SystemRequest::StopMonitoring => self.stop_monitoring().await,
            SystemRequest::KillProcess(request) => self.kill_process(request),
        }
    }

    /// Start a fresh monitoring run, replacing any active one
    pub async fn start_monitoring(&mut self) {
        if let Some(task) = self.task.take() {
            task.stop().await;
        }
        tracing::debug!(
            "Monitoring started for {} every {}ms",
            self.socket.id(),
            self.settings.interval.as_millis()
        );
        self.task = Some(MonitorTask::spawn(
            self.socket.clone(),
            Arc::clone(&self.telemetry),
            self.settings,
        ));
    }

    /// Stop the active run; returns once its task can no longer emit
    pub async fn stop_monitoring(&mut self) {
        if let Some(task) = self.task.take() {
            task.stop().await;
            tracing::debug!("Monitoring stopped for {}", self.socket.id());
        }
    }

    fn ping(&self) {
        self.emit(SystemEvent::Pong {
            message: "pong".to_string(),
            time: current_time_millis(),
        });
    }

    /// Validate a termination request and run it in the background; the
    /// outcome arrives later as `process-killed` or `process-error`
    fn kill_process(&mut self, request: KillRequest) {
        let Some(pid) = request.parse_pid() else {
            self.emit(SystemEvent::ProcessError {
                message: format!("Invalid pid: {}", request.pid),
                pid: None,
            });
            return;
        };

        let signal = match request.signal.as_deref().map(str::parse::<Signal>) {
            None => Signal::default(),
            Some(Ok(signal)) => signal,
            Some(Err(e)) => {
                self.emit(SystemEvent::ProcessError {
                    message: e.to_string(),
                    pid: Some(pid),
                });
                return;
            }
        };

        while self.kills.try_join_next().is_some() {}

        let socket = self.socket.clone();
        let process = Arc::clone(&self.process);
        self.kills.spawn(async move {
            let outcome =
                tokio::time::timeout(KILL_TIMEOUT, process.terminate(pid, signal)).await;
            let failure = match outcome {
                Ok(Ok(())) => {
                    emit(&socket, SystemEvent::ProcessKilled { pid, success: true });
                    return;
                }
                Ok(Err(e)) => e.to_string(),
                Err(_) => format!("no answer after {}s", KILL_TIMEOUT.as_secs()),
            };
            tracing::warn!("Failed to send {} to {}: {}", signal, pid, failure);
            emit(
                &socket,
                SystemEvent::ProcessError {
                    message: format!("Failed to kill process {}: {}", pid, failure),
                    pid: Some(pid),
                },
            );
        });
    }

    /// Number of termination requests still running
    pub fn pending_kills(&self) -> usize {
        self.kills.len()
    }

    fn emit(&self, event: SystemEvent) {
        emit(&self.socket, event);
    }
}

#[async_trait]
impl ConnectionSession for MonitorSession {
    async fn on_event(&mut self, frame: Frame) {
        match SystemRequest::from_frame(&frame) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                tracing::debug!("Rejected '{}' on {}: {}", frame.event, self.socket.id(), e);
                self.socket.emit(Frame::error(e.to_string()));
            }
        }
    }

    async fn on_disconnect(&mut self) {
        self.stop_monitoring().await;
        self.kills.shutdown().await;
        self.closed = true;
    }
}

impl Drop for MonitorSession {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.kills.abort_all();
    }
}
