/*!
 * Spawn Engine
 * Runs posix_spawnp for a request and wraps the child in a Process handle
 */

use crate::errors::{SpawnError, SpawnResult};
use crate::marshal::{self, SpawnArena};
use crate::process::Process;
use crate::request::SpawnRequest;
use nix::errno::Errno;
use nix::unistd::Pid;
use tracing::{debug, instrument, warn};

/// Spawn the child described by `request`
///
/// All temporary native objects are released before this returns, whether or
/// not the spawn succeeded. A failed attempt never yields a handle.
///
/// # Example
///
/// ```rust,no_run
/// use pspawn::{spawn, SpawnRequest};
///
/// let mut child = spawn(&SpawnRequest::new("sleep").arg("10"))?;
/// child.close()?;
/// # Ok::<(), pspawn::SpawnError>(())
/// ```
#[instrument(level = "debug", skip_all, fields(command = %request.command))]
pub fn spawn(request: &SpawnRequest) -> SpawnResult<Process> {
    let arena = SpawnArena::new();
    let prepared = marshal::prepare(&arena, request)?;
    let mut process = Process::unstarted(prepared.close_signal);

    let mut raw_pid: libc::pid_t = 0;
    // SAFETY: every pointer comes from `prepared`, whose arena strings,
    // null-terminated arrays and native objects outlive this call.
    let rc = unsafe {
        libc::posix_spawnp(
            &mut raw_pid,
            prepared.command.as_ptr(),
            prepared.file_actions.as_ptr(),
            prepared.attr.as_ptr(),
            prepared.argv.as_ptr(),
            prepared.envp.as_ptr(),
        )
    };

    if rc != 0 {
        let source = Errno::from_raw(rc);
        warn!(error = %source, "spawn failed");
        return Err(SpawnError::SpawnFailed {
            command: request.command.clone(),
            source,
        });
    }

    process.started(Pid::from_raw(raw_pid));
    debug!(pid = raw_pid, "spawned process");
    Ok(process)
}

/// Spawn and block until the child exits, returning its exit code
pub fn run(request: &SpawnRequest) -> SpawnResult<i32> {
    let mut process = spawn(request)?;
    process.wait()
}
