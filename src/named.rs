/*!
 * Named Spawn Options
 * Keyword-style spawn call translated onto the positional contract
 *
 * Keys: `cmd` (required), `args`, `close-signal`, `file-actions`, `env`,
 * `attr-flags`, `sig-default`, `sig-mask`.
 */

use crate::errors::{SpawnError, SpawnResult};
use crate::positional;
use crate::process::Process;
use crate::signals::{POSIX_SPAWN_SETSIGDEF, POSIX_SPAWN_SETSIGMASK, SIGTERM};
use serde_json::{json, Value};

const KEYS: [&str; 8] = [
    "cmd",
    "args",
    "close-signal",
    "file-actions",
    "env",
    "attr-flags",
    "sig-default",
    "sig-mask",
];

/// Build the positional slots for a named options object
///
/// `args` lists the arguments after the command; argv[0] is always `cmd`.
/// Without `attr-flags`, the flags enable whichever signal sets were given.
pub fn to_positional(options: &Value) -> SpawnResult<Vec<Value>> {
    let map = options.as_object().ok_or_else(|| {
        SpawnError::InvalidRequest(format!("spawn options must be an object, got {}", options))
    })?;

    if let Some(unknown) = map.keys().find(|k| !KEYS.contains(&k.as_str())) {
        return Err(SpawnError::InvalidRequest(format!(
            "unknown spawn option {:?}",
            unknown
        )));
    }

    let opt = |key: &str| map.get(key).cloned().unwrap_or(Value::Null);

    let cmd = map
        .get("cmd")
        .cloned()
        .ok_or_else(|| SpawnError::InvalidRequest("missing required option \"cmd\"".to_string()))?;

    let argv = match map.get("args") {
        None | Some(Value::Null) => Value::Array(vec![cmd.clone()]),
        Some(Value::Array(rest)) => {
            let mut argv = Vec::with_capacity(rest.len() + 1);
            argv.push(cmd.clone());
            argv.extend(rest.iter().cloned());
            Value::Array(argv)
        }
        // let the positional decoder report the bad shape
        Some(other) => other.clone(),
    };

    let close_signal = map.get("close-signal").cloned().unwrap_or_else(|| json!(SIGTERM));
    let sig_default = opt("sig-default");
    let sig_mask = opt("sig-mask");

    let attr_flags = match map.get("attr-flags") {
        Some(flags) => flags.clone(),
        None => {
            let mut flags = 0;
            if !sig_default.is_null() {
                flags |= POSIX_SPAWN_SETSIGDEF;
            }
            if !sig_mask.is_null() {
                flags |= POSIX_SPAWN_SETSIGMASK;
            }
            json!(flags)
        }
    };

    Ok(vec![
        cmd,
        argv,
        close_signal,
        opt("file-actions"),
        opt("env"),
        attr_flags,
        sig_default,
        sig_mask,
    ])
}

/// Spawn from named options
pub fn spawn(options: &Value) -> SpawnResult<Process> {
    positional::spawn(&to_positional(options)?)
}

/// Spawn from named options and wait for the exit code
pub fn run(options: &Value) -> SpawnResult<i32> {
    let mut process = spawn(options)?;
    process.wait()
}
