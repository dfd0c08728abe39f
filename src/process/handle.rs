/*!
 * Process Handle
 * Owns one spawned child and reaps it exactly once
 */

use super::types::{exit_code_of, ProcessState, WaitMode};
use crate::errors::{SpawnError, SpawnResult};
use crate::signals::{check_signal, signal_name};
use libc::c_int;
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use tracing::{debug, warn};

/// A child process created by `spawn`
///
/// Once a terminal status has been observed it is cached, and later waits
/// return it without calling into the OS again. Dropping a handle that is
/// still running sends its close signal and reaps it; prefer calling
/// [`Process::close`] so failures can be seen.
#[derive(Debug)]
pub struct Process {
    pid: Option<Pid>,
    close_signal: c_int,
    exited: bool,
    wait_status: Option<WaitStatus>,
}

impl Process {
    /// Handle for an attempt that has not produced a child (yet)
    pub(crate) fn unstarted(close_signal: c_int) -> Self {
        Self {
            pid: None,
            close_signal,
            exited: true,
            wait_status: None,
        }
    }

    /// Record the pid of a successful spawn
    pub(crate) fn started(&mut self, pid: Pid) {
        debug_assert!(self.pid.is_none(), "pid is set exactly once");
        self.pid = Some(pid);
        self.exited = false;
    }

    /// OS process id, `None` if the spawn never succeeded
    pub fn pid(&self) -> Option<Pid> {
        self.pid
    }

    pub fn close_signal(&self) -> c_int {
        self.close_signal
    }

    pub fn state(&self) -> ProcessState {
        match (self.pid, self.exited) {
            (None, _) => ProcessState::Unstarted,
            (Some(_), true) => ProcessState::Exited,
            (Some(_), false) => ProcessState::Running,
        }
    }

    /// Cached terminal status, once observed
    pub fn wait_status(&self) -> Option<WaitStatus> {
        self.wait_status
    }

    /// Block until the child exits and return its exit code
    ///
    /// A child killed by a signal reports `SIGNALED_EXIT_CODE`.
    pub fn wait(&mut self) -> SpawnResult<i32> {
        let pid = self.pid.ok_or(SpawnError::NotStarted)?;
        self.wait_with(WaitMode::Blocking)?
            .ok_or_else(|| SpawnError::UnexpectedStatus {
                pid: pid.as_raw(),
                status: "still alive after blocking wait".to_string(),
            })
    }

    /// Reap the child if it has exited, without blocking
    pub fn try_wait(&mut self) -> SpawnResult<Option<i32>> {
        self.wait_with(WaitMode::NonBlocking)
    }

    /// Exit code if the child is known to have exited
    ///
    /// Polls the child as a side effect, so this doubles as a liveness probe.
    pub fn exit_code(&mut self) -> SpawnResult<Option<i32>> {
        if self.pid.is_none() {
            return Ok(None);
        }
        self.wait_with(WaitMode::NonBlocking)
    }

    /// Wait for the child, returning `None` only when non-blocking and still running
    pub fn wait_with(&mut self, mode: WaitMode) -> SpawnResult<Option<i32>> {
        let pid = self.pid.ok_or(SpawnError::NotStarted)?;

        if self.exited {
            return self.cached_exit_code(pid).map(Some);
        }

        let flags = match mode {
            WaitMode::Blocking => None,
            WaitMode::NonBlocking => Some(WaitPidFlag::WNOHANG),
        };

        let status = loop {
            match waitpid(pid, flags) {
                Ok(status) => break status,
                Err(Errno::EINTR) => continue,
                Err(source) => {
                    return Err(SpawnError::WaitFailed {
                        pid: pid.as_raw(),
                        source,
                    })
                }
            }
        };

        match status {
            WaitStatus::StillAlive => Ok(None),
            WaitStatus::Exited(..) | WaitStatus::Signaled(..) => {
                self.exited = true;
                self.wait_status = Some(status);
                let code = exit_code_of(pid, status)?;
                debug!(pid = pid.as_raw(), code, status = ?status, "process reaped");
                Ok(Some(code))
            }
            other => Err(SpawnError::UnexpectedStatus {
                pid: pid.as_raw(),
                status: format!("{:?}", other),
            }),
        }
    }

    fn cached_exit_code(&self, pid: Pid) -> SpawnResult<i32> {
        match self.wait_status {
            Some(status) => exit_code_of(pid, status),
            None => Err(SpawnError::UnexpectedStatus {
                pid: pid.as_raw(),
                status: "exited without a recorded status".to_string(),
            }),
        }
    }

    /// Send `sig` to the child; a no-op once it has exited
    pub fn signal(&self, sig: c_int) -> SpawnResult<()> {
        check_signal(sig, "signal")?;
        match self.live_pid() {
            Some(pid) => send_signal(pid, sig),
            None => Ok(()),
        }
    }

    /// Send the close signal and wait for the child to go away
    ///
    /// On success the handle is always `Exited`.
    pub fn close(&mut self) -> SpawnResult<()> {
        let Some(pid) = self.live_pid() else {
            return Ok(());
        };
        send_signal(pid, self.close_signal)?;
        self.wait()?;
        Ok(())
    }

    fn live_pid(&self) -> Option<Pid> {
        if self.exited {
            None
        } else {
            self.pid
        }
    }
}

fn send_signal(pid: Pid, sig: c_int) -> SpawnResult<()> {
    loop {
        // SAFETY: kill takes plain integers and touches no memory of ours.
        match Errno::result(unsafe { libc::kill(pid.as_raw(), sig) }) {
            Ok(_) => {
                debug!(pid = pid.as_raw(), signal = signal_name(sig), "signal sent");
                return Ok(());
            }
            Err(Errno::EINTR) => continue,
            Err(Errno::ESRCH) => {
                // Raced to exit and was reaped elsewhere.
                debug!(pid = pid.as_raw(), "process already gone");
                return Ok(());
            }
            Err(source) => {
                return Err(SpawnError::SignalFailed {
                    pid: pid.as_raw(),
                    source,
                })
            }
        }
    }
}

impl Drop for Process {
    fn drop(&mut self) {
        let Some(pid) = self.live_pid() else {
            return;
        };

        if let Err(e) = send_signal(pid, self.close_signal) {
            warn!(pid = pid.as_raw(), error = %e, "failed to signal abandoned process");
        }

        if let Err(e) = self.wait_with(WaitMode::Blocking) {
            warn!(pid = pid.as_raw(), error = %e, "failed to reap abandoned process");
            self.exited = true;
        }
    }
}
