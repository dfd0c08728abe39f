/*!
 * Boundary Tests
 * Positional and named requests driving real children
 */

use pretty_assertions::assert_eq;
use pspawn::{named, positional, SpawnError, SIGNALED_EXIT_CODE};
use serde_json::{json, Value};
use std::io::{Read, Seek, SeekFrom};
use std::os::fd::AsRawFd;
use tempfile::tempfile;

#[test]
fn test_positional_spawn_with_file_actions_and_env() {
    let mut out = tempfile().unwrap();
    let slots = vec![
        json!("sh"),
        json!(["sh", "-c", "echo $GREETING"]),
        json!(15),
        json!([["dup2", out.as_raw_fd(), 1]]),
        json!({"GREETING": "from positional"}),
        json!(0),
        Value::Null,
        Value::Null,
    ];

    let mut child = positional::spawn(&slots).unwrap();
    assert_eq!(child.wait().unwrap(), 0);

    let mut text = String::new();
    out.seek(SeekFrom::Start(0)).unwrap();
    out.read_to_string(&mut text).unwrap();
    assert_eq!(text, "from positional\n");
}

#[test]
fn test_positional_rejects_before_spawning() {
    let slots = vec![
        json!("true"),
        json!(["true"]),
        json!(-1),
        Value::Null,
        Value::Null,
        json!(0),
        Value::Null,
        Value::Null,
    ];
    let err = positional::spawn(&slots).unwrap_err();
    assert_eq!(
        err,
        SpawnError::InvalidCloseSignal("invalid value for close-signal: -1".to_string())
    );
}

#[test]
fn test_named_close_signal_is_used() {
    let mut child = named::spawn(&json!({
        "cmd": "sleep",
        "args": ["30"],
        "close-signal": 9,
    }))
    .unwrap();
    assert_eq!(child.close_signal(), 9);

    child.close().unwrap();
    assert_eq!(child.wait().unwrap(), SIGNALED_EXIT_CODE);
}

#[test]
fn test_named_run_with_env_and_mask() {
    let code = named::run(&json!({
        "cmd": "sh",
        "args": ["-c", "test \"$MODE\" = strict"],
        "env": {"MODE": "strict"},
        "sig-mask": "all",
    }))
    .unwrap();
    assert_eq!(code, 0);
}

#[test]
fn test_named_missing_command() {
    assert!(matches!(
        named::run(&json!({"args": ["x"]})),
        Err(SpawnError::InvalidRequest(_))
    ));
}
