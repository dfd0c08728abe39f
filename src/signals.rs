/*!
 * Signals
 * Host signal numbers, spawn attribute flags and signal sets
 */

use crate::errors::{SpawnError, SpawnResult};
use libc::{c_int, c_short, sigset_t};
use nix::sys::signal::Signal;
use std::mem::MaybeUninit;

pub const SIGINT: c_int = libc::SIGINT;
pub const SIGHUP: c_int = libc::SIGHUP;
pub const SIGPIPE: c_int = libc::SIGPIPE;
pub const SIGTERM: c_int = libc::SIGTERM;
pub const SIGKILL: c_int = libc::SIGKILL;
pub const SIGUSR1: c_int = libc::SIGUSR1;
pub const SIGUSR2: c_int = libc::SIGUSR2;

/// Reserved "no signal" value, never accepted as a signal to send
pub const NO_SIGNAL: c_int = -1;

/// Honor the signal mask set in the attributes
pub const POSIX_SPAWN_SETSIGMASK: c_short = libc::POSIX_SPAWN_SETSIGMASK as c_short;
/// Honor the signal default set in the attributes
pub const POSIX_SPAWN_SETSIGDEF: c_short = libc::POSIX_SPAWN_SETSIGDEF as c_short;
/// Reset effective ids to the real ids in the child
pub const POSIX_SPAWN_RESETIDS: c_short = libc::POSIX_SPAWN_RESETIDS as c_short;

/// Human readable name for a signal number, for logs
pub fn signal_name(sig: c_int) -> &'static str {
    Signal::try_from(sig).map(Signal::as_str).unwrap_or("UNKNOWN")
}

/// A set of signals for the child's mask or default disposition
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SignalSet {
    /// No signals
    #[default]
    Empty,
    /// Every signal the OS knows about
    All,
    /// Exactly these signals
    Explicit(Vec<c_int>),
}

impl SignalSet {
    pub fn explicit<I>(signals: I) -> Self
    where
        I: IntoIterator<Item = c_int>,
    {
        SignalSet::Explicit(signals.into_iter().collect())
    }

    /// Build the native set
    pub(crate) fn to_sigset(&self) -> SpawnResult<sigset_t> {
        let mut set = MaybeUninit::<sigset_t>::uninit();
        // SAFETY: both calls fully initialize the set they are given.
        let rc = unsafe {
            match self {
                SignalSet::All => libc::sigfillset(set.as_mut_ptr()),
                _ => libc::sigemptyset(set.as_mut_ptr()),
            }
        };
        if rc != 0 {
            return Err(SpawnError::Native {
                what: "unable to init signal masks",
                source: nix::errno::Errno::last(),
            });
        }
        // SAFETY: initialized above.
        let mut set = unsafe { set.assume_init() };

        if let SignalSet::Explicit(sigs) = self {
            for &sig in sigs {
                // SAFETY: set is a valid, initialized sigset_t.
                if unsafe { libc::sigaddset(&mut set, sig) } != 0 {
                    return Err(SpawnError::InvalidSignal(format!(
                        "signal must be a valid signal number, got {}",
                        sig
                    )));
                }
            }
        }

        Ok(set)
    }
}

/// Validate a signal that is about to be delivered or stored
pub(crate) fn check_signal(sig: c_int, what: &str) -> SpawnResult<()> {
    if sig == NO_SIGNAL {
        return Err(SpawnError::InvalidSignal(format!("invalid value for {}", what)));
    }
    Ok(())
}
