/*!
 * Positional Spawn Contract
 * Fixed 8-slot spawn call over dynamic JSON values
 *
 * Slots, in order: command, argv, close signal, file actions, environment,
 * attribute flags, signal-default set, signal-mask set. Absent optional
 * values are passed as `null`, never omitted. Decoding finishes before any
 * native resource is allocated and stops at the first bad slot.
 */

use crate::errors::{SpawnError, SpawnResult};
use crate::process::Process;
use crate::request::{FileAction, SpawnRequest};
use crate::signals::{SignalSet, NO_SIGNAL};
use libc::{c_int, c_short};
use serde_json::Value;
use std::collections::BTreeMap;
use std::os::fd::RawFd;

/// Number of slots in a positional spawn call
pub const ARITY: usize = 8;

/// Decode and spawn
pub fn spawn(args: &[Value]) -> SpawnResult<Process> {
    let request = decode(args)?;
    crate::spawn::spawn(&request)
}

/// Decode the 8 slots into a typed request
pub fn decode(args: &[Value]) -> SpawnResult<SpawnRequest> {
    if args.len() != ARITY {
        return Err(SpawnError::InvalidRequest(format!(
            "expected {} positional values, got {}",
            ARITY,
            args.len()
        )));
    }

    let command = text(&args[0]).ok_or_else(|| SpawnError::InvalidCommand(args[0].to_string()))?;
    let argv = argv(&args[1])?;
    let close_signal = close_signal(&args[2])?;
    let file_actions = file_actions(&args[3])?;
    let env = environment(&args[4])?;
    let attr_flags = attr_flags(&args[5])?;
    let sig_default = signal_set(&args[6])?;
    let sig_mask = signal_set(&args[7])?;

    Ok(SpawnRequest {
        command: command.to_string(),
        args: argv,
        close_signal,
        file_actions,
        env,
        attr_flags,
        sig_default,
        sig_mask,
    })
}

/// A string without embedded NUL
fn text(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.as_bytes().contains(&0))
}

/// Any JSON number, truncated toward zero; huge values saturate
fn number(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f.trunc() as i64))
}

/// A number that must also fit `T`
fn int<T: TryFrom<i64>>(
    value: &Value,
    what: &str,
    error: fn(String) -> SpawnError,
) -> SpawnResult<T> {
    let n = number(value)
        .ok_or_else(|| error(format!("{} must be a number, got {}", what, value)))?;
    T::try_from(n).map_err(|_| error(format!("{} out of range, got {}", what, value)))
}

fn argv(value: &Value) -> SpawnResult<Vec<String>> {
    let items = value.as_array().ok_or_else(|| {
        SpawnError::InvalidArgument(format!("arguments must be an array, got {}", value))
    })?;
    items
        .iter()
        .map(|item| {
            text(item)
                .map(str::to_string)
                .ok_or_else(|| SpawnError::InvalidArgument(item.to_string()))
        })
        .collect()
}

fn close_signal(value: &Value) -> SpawnResult<c_int> {
    let sig: c_int = int(value, "close signal", SpawnError::InvalidCloseSignal)?;
    if sig == NO_SIGNAL {
        return Err(SpawnError::InvalidCloseSignal(format!(
            "invalid value for close-signal: {}",
            sig
        )));
    }
    Ok(sig)
}

fn descriptor(tag: &str, value: &Value) -> SpawnResult<RawFd> {
    if !value.is_i64() && !value.is_u64() {
        return Err(SpawnError::InvalidFileAction(format!(
            "{} value must be a file descriptor, got {}",
            tag, value
        )));
    }
    value
        .as_i64()
        .and_then(|n| RawFd::try_from(n).ok())
        .filter(|fd| *fd >= 0)
        .ok_or_else(|| {
            SpawnError::InvalidFileAction(format!(
                "{} file action unable to determine fileno, got {}",
                tag, value
            ))
        })
}

fn file_actions(value: &Value) -> SpawnResult<Vec<FileAction>> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    let entries = value.as_array().ok_or_else(|| {
        SpawnError::InvalidFileAction(format!(
            "file action elements must be an indexed type, got {}",
            value
        ))
    })?;

    let mut actions = Vec::with_capacity(entries.len());
    for entry in entries {
        let parts = entry.as_array().ok_or_else(|| {
            SpawnError::InvalidFileAction(format!(
                "file action elements must be an indexed type, got {}",
                entry
            ))
        })?;
        let Some(tag) = parts.first() else {
            return Err(SpawnError::InvalidFileAction(
                "file action elements must be at least one element".to_string(),
            ));
        };

        match tag.as_str() {
            Some("dup2") => {
                if parts.len() != 3 {
                    return Err(SpawnError::InvalidFileAction(format!(
                        "dup2 file actions have 2 file elements, got {}",
                        entry
                    )));
                }
                actions.push(FileAction::Dup2 {
                    source: descriptor("dup2", &parts[1])?,
                    target: descriptor("dup2", &parts[2])?,
                });
            }
            Some("close") => {
                if parts.len() != 2 {
                    return Err(SpawnError::InvalidFileAction(format!(
                        "close file actions have 1 file element, got {}",
                        entry
                    )));
                }
                actions.push(FileAction::Close {
                    fd: descriptor("close", &parts[1])?,
                });
            }
            _ => {
                return Err(SpawnError::InvalidFileAction(format!(
                    "{} is not a valid file action",
                    tag
                )))
            }
        }
    }
    Ok(actions)
}

fn environment(value: &Value) -> SpawnResult<Option<BTreeMap<String, String>>> {
    if value.is_null() {
        return Ok(None);
    }
    let map = value.as_object().ok_or_else(|| {
        SpawnError::InvalidEnvironment(format!("env must be a dictionary, got {}", value))
    })?;

    let mut env = BTreeMap::new();
    for (key, val) in map {
        if key.as_bytes().contains(&0) {
            return Err(SpawnError::InvalidEnvironment(format!(
                "environ keys cannot have embedded nulls, got {:?}",
                key
            )));
        }
        let Some(val) = val.as_str() else {
            return Err(SpawnError::InvalidEnvironment(format!(
                "environ value is not a string, got {}",
                val
            )));
        };
        if val.as_bytes().contains(&0) {
            return Err(SpawnError::InvalidEnvironment(format!(
                "environ values cannot have embedded nulls, got {:?}",
                val
            )));
        }
        env.insert(key.clone(), val.to_string());
    }
    Ok(Some(env))
}

fn attr_flags(value: &Value) -> SpawnResult<c_short> {
    int(value, "attr flags", SpawnError::InvalidAttrFlags)
}

fn signal_set(value: &Value) -> SpawnResult<SignalSet> {
    match value {
        Value::Null => Ok(SignalSet::Empty),
        Value::String(s) if s == "all" => Ok(SignalSet::All),
        Value::Array(items) => items
            .iter()
            .map(|item| int(item, "signal", SpawnError::InvalidSignal))
            .collect::<SpawnResult<Vec<c_int>>>()
            .map(SignalSet::Explicit),
        other => Err(SpawnError::InvalidSignal(format!(
            "signal set must be null, \"all\" or an array, got {}",
            other
        ))),
    }
}
