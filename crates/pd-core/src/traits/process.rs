//! Process control capability

use async_trait::async_trait;

use crate::error::ProcessControlError;
use crate::types::Signal;

/// Issues termination signals to processes.
///
/// Success means the signal was issued without OS-level error; it does not
/// confirm that the target exited.
#[async_trait]
pub trait ProcessControl: Send + Sync {
    /// Send `signal` to `pid`
    async fn terminate(&self, pid: u32, signal: Signal) -> Result<(), ProcessControlError>;
}
