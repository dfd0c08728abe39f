/*!
 * Process Lifecycle Tests
 * Waiting, signaling, closing and abandonment of real children
 */

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::WaitStatus;
use pretty_assertions::assert_eq;
use pspawn::signals::{SIGKILL, SIGTERM};
use pspawn::{Process, ProcessState, SpawnError, SpawnRequest, SIGNALED_EXIT_CODE};
use std::thread::sleep;
use std::time::Duration;

fn sleeper() -> Process {
    SpawnRequest::new("sleep").arg("30").spawn().unwrap()
}

#[test]
fn test_wait_is_idempotent() {
    let mut child = SpawnRequest::new("sh").args(["-c", "exit 3"]).spawn().unwrap();
    let pid = child.pid().unwrap();
    assert_eq!(child.state(), ProcessState::Running);

    assert_eq!(child.wait().unwrap(), 3);
    assert_eq!(child.state(), ProcessState::Exited);

    // cached: the child is already reaped, so a real waitpid would fail
    assert_eq!(child.wait().unwrap(), 3);
    assert_eq!(child.exit_code().unwrap(), Some(3));
    assert_eq!(child.wait_status(), Some(WaitStatus::Exited(pid, 3)));
}

#[test]
fn test_killed_child_reports_signal_code() {
    let mut child = sleeper();
    child.signal(SIGKILL).unwrap();

    assert_eq!(child.wait().unwrap(), SIGNALED_EXIT_CODE);
    assert!(matches!(
        child.wait_status(),
        Some(WaitStatus::Signaled(_, Signal::SIGKILL, _))
    ));
}

#[test]
fn test_close_terminates_running_child() {
    let mut child = sleeper();
    assert_eq!(child.close_signal(), SIGTERM);

    child.close().unwrap();
    assert_eq!(child.state(), ProcessState::Exited);
    assert_eq!(child.wait().unwrap(), SIGNALED_EXIT_CODE);
    assert!(matches!(
        child.wait_status(),
        Some(WaitStatus::Signaled(_, Signal::SIGTERM, _))
    ));
}

#[test]
fn test_close_uses_requested_signal() {
    let mut child = SpawnRequest::new("sleep")
        .arg("30")
        .close_signal(SIGKILL)
        .spawn()
        .unwrap();

    child.close().unwrap();
    assert!(matches!(
        child.wait_status(),
        Some(WaitStatus::Signaled(_, Signal::SIGKILL, _))
    ));
}

#[test]
fn test_close_after_exit_is_noop() {
    let mut child = SpawnRequest::new("true").spawn().unwrap();
    assert_eq!(child.wait().unwrap(), 0);

    child.close().unwrap();
    child.signal(SIGTERM).unwrap();
    assert_eq!(child.wait().unwrap(), 0);
}

#[test]
fn test_close_on_already_dead_child() {
    // dead but not yet reaped: close still observes the real exit status
    let mut child = SpawnRequest::new("true").spawn().unwrap();
    sleep(Duration::from_millis(100));

    child.close().unwrap();
    assert_eq!(child.state(), ProcessState::Exited);
    assert_eq!(child.wait().unwrap(), 0);
}

#[test]
fn test_try_wait_and_exit_code_probe() {
    let mut child = sleeper();

    assert_eq!(child.try_wait().unwrap(), None);
    assert_eq!(child.exit_code().unwrap(), None);
    assert_eq!(child.state(), ProcessState::Running);
    assert!(child.wait_status().is_none());

    child.signal(SIGKILL).unwrap();
    let mut code = None;
    for _ in 0..200 {
        code = child.exit_code().unwrap();
        if code.is_some() {
            break;
        }
        sleep(Duration::from_millis(10));
    }
    assert_eq!(code, Some(SIGNALED_EXIT_CODE));
    assert_eq!(child.state(), ProcessState::Exited);
}

#[test]
fn test_signal_rejects_no_signal() {
    let mut child = sleeper();
    assert!(matches!(child.signal(-1), Err(SpawnError::InvalidSignal(_))));
    assert_eq!(child.state(), ProcessState::Running);
    child.close().unwrap();
}

#[test]
fn test_drop_reaps_running_child() {
    let child = sleeper();
    let pid = child.pid().unwrap();
    drop(child);

    assert_eq!(kill(pid, None), Err(Errno::ESRCH));
}
