/*!
 * Spawn Request
 * Description of a child process: argv, environment, file actions and signal attributes
 */

use crate::errors::SpawnResult;
use crate::process::Process;
use crate::signals::{SignalSet, SIGTERM};
use libc::{c_int, c_short};
use std::collections::BTreeMap;
use std::os::fd::{AsRawFd, RawFd};

/// An instruction the child applies to its own descriptors before exec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    /// Duplicate `source` onto `target`
    Dup2 { source: RawFd, target: RawFd },
    /// Close `fd`
    Close { fd: RawFd },
}

impl FileAction {
    pub fn dup2<S: AsRawFd>(source: &S, target: RawFd) -> Self {
        FileAction::Dup2 {
            source: source.as_raw_fd(),
            target,
        }
    }

    pub fn close<F: AsRawFd>(fd: &F) -> Self {
        FileAction::Close { fd: fd.as_raw_fd() }
    }
}

/// Everything needed to spawn one child process
///
/// # Example
///
/// ```rust,no_run
/// use pspawn::SpawnRequest;
///
/// let code = SpawnRequest::new("echo").arg("hello").run()?;
/// assert_eq!(code, 0);
/// # Ok::<(), pspawn::SpawnError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRequest {
    /// Executable name, resolved through PATH, or a path
    pub command: String,
    /// Full argv, including argv[0]
    pub args: Vec<String>,
    /// Sent on close and when the handle is dropped
    pub close_signal: c_int,
    pub file_actions: Vec<FileAction>,
    /// `None` inherits the current environment
    pub env: Option<BTreeMap<String, String>>,
    pub attr_flags: c_short,
    pub sig_default: SignalSet,
    pub sig_mask: SignalSet,
}

impl SpawnRequest {
    /// New request whose argv is just the command
    pub fn new(command: impl Into<String>) -> Self {
        let command = command.into();
        Self {
            args: vec![command.clone()],
            command,
            close_signal: SIGTERM,
            file_actions: Vec::new(),
            env: None,
            attr_flags: 0,
            sig_default: SignalSet::Empty,
            sig_mask: SignalSet::Empty,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Replace the whole argv, argv[0] included
    pub fn with_argv<I, S>(mut self, argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = argv.into_iter().map(Into::into).collect();
        self
    }

    pub fn close_signal(mut self, sig: c_int) -> Self {
        self.close_signal = sig;
        self
    }

    pub fn file_action(mut self, action: FileAction) -> Self {
        self.file_actions.push(action);
        self
    }

    pub fn dup2<S: AsRawFd>(self, source: &S, target: RawFd) -> Self {
        self.file_action(FileAction::dup2(source, target))
    }

    pub fn close_fd<F: AsRawFd>(self, fd: &F) -> Self {
        self.file_action(FileAction::close(fd))
    }

    pub fn stdin<S: AsRawFd>(self, source: &S) -> Self {
        self.dup2(source, libc::STDIN_FILENO)
    }

    pub fn stdout<S: AsRawFd>(self, source: &S) -> Self {
        self.dup2(source, libc::STDOUT_FILENO)
    }

    pub fn stderr<S: AsRawFd>(self, source: &S) -> Self {
        self.dup2(source, libc::STDERR_FILENO)
    }

    /// Set one variable; the first call switches from inheriting to an explicit environment
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let env = self.env.get_or_insert_with(BTreeMap::new);
        for (key, value) in vars {
            env.insert(key.into(), value.into());
        }
        self
    }

    /// Start from an empty environment
    pub fn env_clear(mut self) -> Self {
        self.env = Some(BTreeMap::new());
        self
    }

    /// Go back to inheriting the parent environment
    pub fn env_inherit(mut self) -> Self {
        self.env = None;
        self
    }

    pub fn attr_flags(mut self, flags: c_short) -> Self {
        self.attr_flags = flags;
        self
    }

    pub fn sig_default(mut self, set: SignalSet) -> Self {
        self.sig_default = set;
        self
    }

    pub fn sig_mask(mut self, set: SignalSet) -> Self {
        self.sig_mask = set;
        self
    }

    pub fn spawn(&self) -> SpawnResult<Process> {
        crate::spawn::spawn(self)
    }

    /// Spawn and block until the child exits
    pub fn run(&self) -> SpawnResult<i32> {
        crate::spawn::run(self)
    }
}
