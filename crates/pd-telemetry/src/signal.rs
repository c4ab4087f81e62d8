//! Process termination through the platform's kill command

use std::process::Stdio;

use async_trait::async_trait;
use pd_core::traits::ProcessControl;
use pd_core::{PlatformInfo, ProcessControlError, Signal};
use tokio::process::Command;

/// Build the termination command line for `pid`.
///
/// On Windows graceful signals map to a plain `taskkill`, everything that
/// terminates maps to `taskkill /F`, and signals with no Windows equivalent
/// are refused. Elsewhere `kill -s <NAME> <pid>` is used.
pub fn kill_command(
    pid: u32,
    signal: Signal,
    windows: bool,
) -> Result<(&'static str, Vec<String>), ProcessControlError> {
    if !windows {
        return Ok((
            "kill",
            vec![
                "-s".to_string(),
                signal.short_name().to_string(),
                pid.to_string(),
            ],
        ));
    }

    let mut args = vec!["/PID".to_string(), pid.to_string()];
    match signal {
        Signal::Term | Signal::Int => {}
        Signal::Kill | Signal::Hup | Signal::Quit => args.push("/F".to_string()),
        Signal::Usr1 | Signal::Usr2 | Signal::Stop | Signal::Cont => {
            return Err(ProcessControlError::UnsupportedSignal(signal.to_string()))
        }
    }
    Ok(("taskkill", args))
}

/// Process control via `kill`/`taskkill`
#[derive(Debug, Clone)]
pub struct SignalCommand {
    windows: bool,
}

impl SignalCommand {
    pub fn new(platform: &PlatformInfo) -> Self {
        Self {
            windows: platform.is_windows(),
        }
    }
}

impl Default for SignalCommand {
    fn default() -> Self {
        Self::new(&PlatformInfo::detect())
    }
}

#[async_trait]
impl ProcessControl for SignalCommand {
    async fn terminate(&self, pid: u32, signal: Signal) -> Result<(), ProcessControlError> {
        let (program, args) = kill_command(pid, signal, self.windows)?;
        tracing::debug!("Running {} {}", program, args.join(" "));

        let status = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await?;

        if status.success() {
            tracing::info!("Sent {} to process {}", signal, pid);
            Ok(())
        } else {
            Err(ProcessControlError::Failed {
                pid,
                status: status.to_string(),
            })
        }
    }
}
