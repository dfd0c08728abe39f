/*!
 * Descriptor Utilities
 * Pipes and duplicates that are close-on-exec from the moment they exist
 *
 * Children only see these descriptors when a file action wires them in
 * explicitly.
 */

use crate::errors::{SpawnError, SpawnResult};
use nix::fcntl::{fcntl, FcntlArg};
use std::fs::File;
use std::os::fd::{AsFd, AsRawFd, FromRawFd, OwnedFd};
use tracing::trace;

/// Create a pipe, returning `(read_end, write_end)`
///
/// # Example
///
/// ```rust,no_run
/// use pspawn::{pipe, SpawnRequest};
/// use std::io::Read;
///
/// let (mut reader, writer) = pipe()?;
/// let mut child = SpawnRequest::new("echo").arg("hi").stdout(&writer).spawn()?;
/// drop(writer);
/// child.wait()?;
///
/// let mut out = String::new();
/// reader.read_to_string(&mut out).unwrap();
/// assert_eq!(out, "hi\n");
/// # Ok::<(), pspawn::SpawnError>(())
/// ```
pub fn pipe() -> SpawnResult<(File, File)> {
    let (read_end, write_end) = cloexec_pipe()?;
    trace!(
        read = read_end.as_raw_fd(),
        write = write_end.as_raw_fd(),
        "pipe created"
    );
    Ok((File::from(read_end), File::from(write_end)))
}

#[cfg(not(any(target_os = "macos", target_os = "ios")))]
fn cloexec_pipe() -> SpawnResult<(OwnedFd, OwnedFd)> {
    use nix::fcntl::OFlag;

    nix::unistd::pipe2(OFlag::O_CLOEXEC).map_err(|source| SpawnError::Descriptor {
        what: "unable to allocate pipe",
        source,
    })
}

#[cfg(any(target_os = "macos", target_os = "ios"))]
fn cloexec_pipe() -> SpawnResult<(OwnedFd, OwnedFd)> {
    // No pipe2 here. Both ends are OwnedFd, so an early return closes
    // whatever was already opened.
    let (read_end, write_end) = nix::unistd::pipe().map_err(|source| SpawnError::Descriptor {
        what: "unable to allocate pipe",
        source,
    })?;
    set_cloexec(&read_end)?;
    set_cloexec(&write_end)?;
    Ok((read_end, write_end))
}

#[cfg(any(target_os = "macos", target_os = "ios"))]
fn set_cloexec<F: AsRawFd>(fd: &F) -> SpawnResult<()> {
    use nix::fcntl::FdFlag;

    fcntl(fd.as_raw_fd(), FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC))
        .map(drop)
        .map_err(|source| SpawnError::Descriptor {
            what: "unable to set pipe FD_CLOEXEC",
            source,
        })
}

/// Duplicate a descriptor; the copy is close-on-exec
pub fn dup<F: AsFd>(fd: &F) -> SpawnResult<File> {
    let raw = fd.as_fd().as_raw_fd();
    let new_fd = fcntl(raw, FcntlArg::F_DUPFD_CLOEXEC(0)).map_err(|source| {
        SpawnError::Descriptor {
            what: "unable to duplicate descriptor",
            source,
        }
    })?;
    trace!(from = raw, to = new_fd, "descriptor duplicated");
    // SAFETY: fcntl just returned a fresh descriptor that nothing else owns.
    Ok(unsafe { File::from_raw_fd(new_fd) })
}
