/*!
 * Resource Marshaling
 * Validates a spawn request and converts it into the native structures
 * posix_spawnp consumes
 *
 * Steps run in a fixed order and stop at the first invalid element:
 * command, argv, close signal, file actions, environment, attribute flags,
 * signal sets.
 */

mod arena;
mod native;

pub(crate) use arena::{CStrArray, SpawnArena};
pub(crate) use native::{FileActions, SpawnAttr};

use crate::errors::{SpawnError, SpawnResult};
use crate::request::{FileAction, SpawnRequest};
use crate::signals::NO_SIGNAL;
use libc::c_int;
use std::collections::BTreeMap;
use std::ffi::{CStr, OsString};
use std::os::unix::ffi::OsStrExt;
use tracing::trace;

/// Native form of a request, borrowing its strings from the arena
pub(crate) struct Prepared<'a> {
    pub command: &'a CStr,
    pub argv: CStrArray<'a>,
    pub envp: CStrArray<'a>,
    pub close_signal: c_int,
    pub file_actions: FileActions,
    pub attr: SpawnAttr,
}

/// Run every marshaling step against `request`
pub(crate) fn prepare<'a>(arena: &'a SpawnArena, request: &SpawnRequest) -> SpawnResult<Prepared<'a>> {
    let mut attr = SpawnAttr::new()?;
    let mut file_actions = FileActions::new()?;

    let command = command(arena, &request.command)?;
    let argv = argv(arena, &request.args)?;
    let close_signal = close_signal(request.close_signal)?;
    add_file_actions(&mut file_actions, &request.file_actions)?;
    let envp = environment(arena, request.env.as_ref())?;

    attr.set_flags(request.attr_flags)?;
    let sig_default = request.sig_default.to_sigset()?;
    let sig_mask = request.sig_mask.to_sigset()?;
    attr.set_sigdefault(&sig_default)?;
    attr.set_sigmask(&sig_mask)?;

    trace!(
        argc = argv.len(),
        envc = envp.len(),
        file_actions = file_actions.len(),
        flags = request.attr_flags,
        "spawn request marshaled"
    );

    Ok(Prepared {
        command,
        argv,
        envp,
        close_signal,
        file_actions,
        attr,
    })
}

fn has_nul(s: &str) -> bool {
    s.as_bytes().contains(&0)
}

fn command<'a>(arena: &'a SpawnArena, command: &str) -> SpawnResult<&'a CStr> {
    if has_nul(command) {
        return Err(SpawnError::InvalidCommand(format!("{:?}", command)));
    }
    arena.alloc_cstr(command.as_bytes())
}

fn argv<'a>(arena: &'a SpawnArena, args: &[String]) -> SpawnResult<CStrArray<'a>> {
    let mut argv = arena.alloc_array(args.len())?;
    for arg in args {
        if has_nul(arg) {
            return Err(SpawnError::InvalidArgument(format!("{:?}", arg)));
        }
        argv.push(arena.alloc_cstr(arg.as_bytes())?)?;
    }
    Ok(argv)
}

fn close_signal(sig: c_int) -> SpawnResult<c_int> {
    if sig == NO_SIGNAL {
        return Err(SpawnError::InvalidCloseSignal(format!(
            "invalid value for close signal: {}",
            sig
        )));
    }
    Ok(sig)
}

fn add_file_actions(native: &mut FileActions, actions: &[FileAction]) -> SpawnResult<()> {
    for action in actions {
        match *action {
            FileAction::Dup2 { source, target } => {
                if source < 0 || target < 0 {
                    return Err(SpawnError::InvalidFileAction(format!(
                        "dup2 unable to determine fileno, got {:?}",
                        action
                    )));
                }
                native.add_dup2(source, target)?;
            }
            FileAction::Close { fd } => {
                if fd < 0 {
                    return Err(SpawnError::InvalidFileAction(format!(
                        "close unable to determine fileno, got {:?}",
                        action
                    )));
                }
                native.add_close(fd)?;
            }
        }
    }
    Ok(())
}

fn environment<'a>(
    arena: &'a SpawnArena,
    env: Option<&BTreeMap<String, String>>,
) -> SpawnResult<CStrArray<'a>> {
    match env {
        Some(vars) => {
            let mut envp = arena.alloc_array(vars.len())?;
            for (key, value) in vars {
                if has_nul(key) {
                    return Err(SpawnError::InvalidEnvironment(format!(
                        "environ keys cannot have embedded nulls, got {:?}",
                        key
                    )));
                }
                if has_nul(value) {
                    return Err(SpawnError::InvalidEnvironment(format!(
                        "environ values cannot have embedded nulls, got {:?}",
                        value
                    )));
                }
                envp.push(arena.alloc_env_entry(key.as_bytes(), value.as_bytes())?)?;
            }
            Ok(envp)
        }
        None => {
            // Snapshot of the parent environment; OS strings never hold NUL.
            let vars: Vec<(OsString, OsString)> = std::env::vars_os().collect();
            let mut envp = arena.alloc_array(vars.len())?;
            for (key, value) in &vars {
                envp.push(arena.alloc_env_entry(key.as_bytes(), value.as_bytes())?)?;
            }
            Ok(envp)
        }
    }
}
