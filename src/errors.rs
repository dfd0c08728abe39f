/*!
 * Error Types
 * Spawn and lifecycle errors with thiserror and miette diagnostics
 */

use miette::Diagnostic;
use nix::errno::Errno;
use thiserror::Error;

/// Result type for spawn and process operations
pub type SpawnResult<T> = Result<T, SpawnError>;

/// Broad class of a failure, used by callers deciding whether to retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Request had the wrong shape; nothing was touched at the OS level
    Validation,
    /// A temporary buffer could not be allocated
    ResourceExhausted,
    /// The OS rejected a spawn, wait, signal or descriptor call
    Os,
    /// The OS reported something that should not happen
    Internal,
}

/// Errors raised while building, spawning or managing a child process
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum SpawnError {
    #[error("{0} is not a valid command")]
    #[diagnostic(
        code(spawn::invalid_command),
        help("The command must be a string without embedded NUL bytes.")
    )]
    InvalidCommand(String),

    #[error("{0} is not a valid argument")]
    #[diagnostic(
        code(spawn::invalid_argument),
        help("Arguments must be a sequence of strings without embedded NUL bytes.")
    )]
    InvalidArgument(String),

    #[error("invalid close signal: {0}")]
    #[diagnostic(
        code(spawn::invalid_close_signal),
        help("The close signal must be a signal number other than -1.")
    )]
    InvalidCloseSignal(String),

    #[error("invalid file action: {0}")]
    #[diagnostic(
        code(spawn::invalid_file_action),
        help("Use [\"dup2\", source, target] or [\"close\", fd] with open descriptors.")
    )]
    InvalidFileAction(String),

    #[error("invalid environment: {0}")]
    #[diagnostic(
        code(spawn::invalid_environment),
        help("The environment must map strings to strings, with no NUL bytes in either.")
    )]
    InvalidEnvironment(String),

    #[error("invalid attribute flags: {0}")]
    #[diagnostic(
        code(spawn::invalid_attr_flags),
        help("Attribute flags are a bitset of the POSIX_SPAWN_* constants.")
    )]
    InvalidAttrFlags(String),

    #[error("invalid signal: {0}")]
    #[diagnostic(
        code(spawn::invalid_signal),
        help("Signals are numbers supported by the host OS; -1 is reserved.")
    )]
    InvalidSignal(String),

    #[error("invalid request: {0}")]
    #[diagnostic(code(spawn::invalid_request))]
    InvalidRequest(String),

    #[error("no memory: {0}")]
    #[diagnostic(
        code(spawn::no_memory),
        help("A temporary spawn buffer could not be allocated.")
    )]
    ResourceExhausted(String),

    #[error("{what}: {source}")]
    #[diagnostic(code(spawn::native))]
    Native { what: &'static str, source: Errno },

    #[error("spawn failed: {command}: {source}")]
    #[diagnostic(
        code(spawn::spawn_failed),
        help("Check that the command exists on PATH and is executable.")
    )]
    SpawnFailed { command: String, source: Errno },

    #[error("error waiting for process {pid} - {source}")]
    #[diagnostic(code(process::wait_failed))]
    WaitFailed { pid: i32, source: Errno },

    #[error("unable to signal process {pid} - {source}")]
    #[diagnostic(code(process::signal_failed))]
    SignalFailed { pid: i32, source: Errno },

    #[error("process was never started")]
    #[diagnostic(
        code(process::not_started),
        help("Only handles returned by a successful spawn can be waited on.")
    )]
    NotStarted,

    #[error("unexpected wait status for process {pid}: {status}")]
    #[diagnostic(code(process::unexpected_status))]
    UnexpectedStatus { pid: i32, status: String },

    #[error("{what} - {source}")]
    #[diagnostic(code(fd::failed))]
    Descriptor { what: &'static str, source: Errno },
}

impl SpawnError {
    /// Classify the error
    pub fn category(&self) -> ErrorCategory {
        match self {
            SpawnError::InvalidCommand(_)
            | SpawnError::InvalidArgument(_)
            | SpawnError::InvalidCloseSignal(_)
            | SpawnError::InvalidFileAction(_)
            | SpawnError::InvalidEnvironment(_)
            | SpawnError::InvalidAttrFlags(_)
            | SpawnError::InvalidSignal(_)
            | SpawnError::InvalidRequest(_) => ErrorCategory::Validation,
            SpawnError::ResourceExhausted(_) => ErrorCategory::ResourceExhausted,
            SpawnError::Native { .. }
            | SpawnError::SpawnFailed { .. }
            | SpawnError::WaitFailed { .. }
            | SpawnError::SignalFailed { .. }
            | SpawnError::Descriptor { .. } => ErrorCategory::Os,
            SpawnError::NotStarted | SpawnError::UnexpectedStatus { .. } => {
                ErrorCategory::Internal
            }
        }
    }

    /// The OS error behind this failure, if any
    pub fn errno(&self) -> Option<Errno> {
        match self {
            SpawnError::Native { source, .. }
            | SpawnError::SpawnFailed { source, .. }
            | SpawnError::WaitFailed { source, .. }
            | SpawnError::SignalFailed { source, .. }
            | SpawnError::Descriptor { source, .. } => Some(*source),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.category() == ErrorCategory::Validation
    }
}

/// Map a libc return code (0 on success, error number otherwise) to a result
pub(crate) fn check_rc(rc: libc::c_int, what: &'static str) -> SpawnResult<()> {
    if rc == 0 {
        Ok(())
    } else {
        Err(SpawnError::Native {
            what,
            source: Errno::from_raw(rc),
        })
    }
}
