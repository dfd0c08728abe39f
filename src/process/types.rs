/*!
 * Process Types
 * Lifecycle states, wait modes and exit code mapping
 */

use crate::errors::{SpawnError, SpawnResult};
use nix::sys::wait::WaitStatus;
use nix::unistd::Pid;

/// Exit code reported for a child that died from a signal
///
/// Which signal it was is not encoded; inspect `Process::wait_status` for that.
pub const SIGNALED_EXIT_CODE: i32 = 129;

/// Process lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Spawn never succeeded; behaves like `Exited` without a status
    Unstarted,
    /// Spawned and not yet observed to terminate
    Running,
    /// Terminal status observed and cached
    Exited,
}

/// How `Process::wait_with` reaps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitMode {
    /// Sleep until the child changes state
    Blocking,
    /// Return immediately if the child is still running
    NonBlocking,
}

/// Exit code for a terminal wait status
pub(crate) fn exit_code_of(pid: Pid, status: WaitStatus) -> SpawnResult<i32> {
    match status {
        WaitStatus::Exited(_, code) => Ok(code),
        WaitStatus::Signaled(..) => Ok(SIGNALED_EXIT_CODE),
        other => Err(SpawnError::UnexpectedStatus {
            pid: pid.as_raw(),
            status: format!("{:?}", other),
        }),
    }
}
