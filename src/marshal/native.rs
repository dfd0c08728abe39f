/*!
 * Native Spawn Objects
 * RAII guards for posix_spawnattr_t and posix_spawn_file_actions_t
 */

use crate::errors::{check_rc, SpawnError, SpawnResult};
use libc::{c_short, posix_spawn_file_actions_t, posix_spawnattr_t, sigset_t};
use nix::errno::Errno;
use std::mem::MaybeUninit;
use std::os::fd::RawFd;

/// Spawn attributes, destroyed on drop
pub(crate) struct SpawnAttr {
    inner: posix_spawnattr_t,
}

impl SpawnAttr {
    pub fn new() -> SpawnResult<Self> {
        let mut attr = MaybeUninit::<posix_spawnattr_t>::uninit();
        // SAFETY: init writes a valid attribute object on success.
        check_rc(
            unsafe { libc::posix_spawnattr_init(attr.as_mut_ptr()) },
            "unable to init attr set",
        )?;
        Ok(Self {
            // SAFETY: initialized above.
            inner: unsafe { attr.assume_init() },
        })
    }

    pub fn set_flags(&mut self, flags: c_short) -> SpawnResult<()> {
        // SAFETY: inner is an initialized attribute object.
        let rc = unsafe { libc::posix_spawnattr_setflags(&mut self.inner, flags) };
        if rc != 0 {
            return Err(SpawnError::InvalidAttrFlags(format!(
                "unable to set spawn attr flags {:#x}: {}",
                flags,
                Errno::from_raw(rc)
            )));
        }
        Ok(())
    }

    pub fn set_sigdefault(&mut self, set: &sigset_t) -> SpawnResult<()> {
        // SAFETY: inner and set are both initialized.
        check_rc(
            unsafe { libc::posix_spawnattr_setsigdefault(&mut self.inner, set) },
            "unable to set sig default",
        )
    }

    pub fn set_sigmask(&mut self, set: &sigset_t) -> SpawnResult<()> {
        // SAFETY: inner and set are both initialized.
        check_rc(
            unsafe { libc::posix_spawnattr_setsigmask(&mut self.inner, set) },
            "unable to set sig mask",
        )
    }

    #[cfg(test)]
    pub fn flags(&self) -> SpawnResult<c_short> {
        let mut flags: c_short = 0;
        // SAFETY: inner is initialized and flags is a valid out pointer.
        check_rc(
            unsafe { libc::posix_spawnattr_getflags(&self.inner, &mut flags) },
            "unable to get spawn attr flags",
        )?;
        Ok(flags)
    }

    pub fn as_ptr(&self) -> *const posix_spawnattr_t {
        &self.inner
    }
}

impl Drop for SpawnAttr {
    fn drop(&mut self) {
        // SAFETY: inner was initialized in new and is destroyed exactly once.
        unsafe {
            libc::posix_spawnattr_destroy(&mut self.inner);
        }
    }
}

/// File actions the child runs before exec, destroyed on drop
pub(crate) struct FileActions {
    inner: posix_spawn_file_actions_t,
    count: usize,
}

impl FileActions {
    pub fn new() -> SpawnResult<Self> {
        let mut actions = MaybeUninit::<posix_spawn_file_actions_t>::uninit();
        // SAFETY: init writes a valid file actions object on success.
        check_rc(
            unsafe { libc::posix_spawn_file_actions_init(actions.as_mut_ptr()) },
            "unable to init file actions set",
        )?;
        Ok(Self {
            // SAFETY: initialized above.
            inner: unsafe { actions.assume_init() },
            count: 0,
        })
    }

    pub fn add_dup2(&mut self, source: RawFd, target: RawFd) -> SpawnResult<()> {
        // SAFETY: inner is an initialized file actions object.
        let rc = unsafe { libc::posix_spawn_file_actions_adddup2(&mut self.inner, source, target) };
        if rc != 0 {
            return Err(SpawnError::InvalidFileAction(format!(
                "dup2 file action unable to use descriptors {} -> {}: {}",
                source,
                target,
                Errno::from_raw(rc)
            )));
        }
        self.count += 1;
        Ok(())
    }

    pub fn add_close(&mut self, fd: RawFd) -> SpawnResult<()> {
        // SAFETY: inner is an initialized file actions object.
        let rc = unsafe { libc::posix_spawn_file_actions_addclose(&mut self.inner, fd) };
        if rc != 0 {
            return Err(SpawnError::InvalidFileAction(format!(
                "close file action unable to use descriptor {}: {}",
                fd,
                Errno::from_raw(rc)
            )));
        }
        self.count += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn as_ptr(&self) -> *const posix_spawn_file_actions_t {
        &self.inner
    }
}

impl Drop for FileActions {
    fn drop(&mut self) {
        // SAFETY: inner was initialized in new and is destroyed exactly once.
        unsafe {
            libc::posix_spawn_file_actions_destroy(&mut self.inner);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::{POSIX_SPAWN_SETSIGDEF, POSIX_SPAWN_SETSIGMASK};

    #[test]
    fn test_attr_flags_roundtrip() {
        let mut attr = SpawnAttr::new().unwrap();
        let flags = POSIX_SPAWN_SETSIGMASK | POSIX_SPAWN_SETSIGDEF;
        attr.set_flags(flags).unwrap();
        assert_eq!(attr.flags().unwrap(), flags);
    }

    #[test]
    fn test_file_actions_count() {
        let mut actions = FileActions::new().unwrap();
        actions.add_dup2(2, 1).unwrap();
        actions.add_close(0).unwrap();
        assert_eq!(actions.len(), 2);
    }

    #[test]
    fn test_negative_descriptor_rejected() {
        let mut actions = FileActions::new().unwrap();
        let err = actions.add_close(-1).unwrap_err();
        assert!(matches!(err, SpawnError::InvalidFileAction(_)));
        assert_eq!(actions.len(), 0);
    }
}
