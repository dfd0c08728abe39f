/*!
 * Spawn Arena
 * Bump allocation for the C strings and pointer arrays of one spawn attempt
 */

use crate::errors::{SpawnError, SpawnResult};
use bumpalo::Bump;
use libc::c_char;
use std::alloc::Layout;
use std::ffi::CStr;
use std::ptr;

// Everything one attempt needs is allocated here and released together when
// the arena drops, on success and on every early return.
//
// Allocations go through `try_alloc_layout` so running out of memory is a
// reportable error rather than an abort.
pub(crate) struct SpawnArena {
    bump: Bump,
}

impl SpawnArena {
    pub fn new() -> Self {
        Self {
            bump: Bump::with_capacity(4 * 1024),
        }
    }

    /// Copy `bytes` into the arena with a trailing NUL
    ///
    /// The caller has already checked that `bytes` contains no NUL.
    pub fn alloc_cstr(&self, bytes: &[u8]) -> SpawnResult<&CStr> {
        self.alloc_joined(&[bytes])
    }

    /// Join `key=value` into one arena C string
    pub fn alloc_env_entry(&self, key: &[u8], value: &[u8]) -> SpawnResult<&CStr> {
        self.alloc_joined(&[key, &b"="[..], value])
    }

    fn alloc_joined(&self, parts: &[&[u8]]) -> SpawnResult<&CStr> {
        debug_assert!(parts.iter().all(|p| !p.contains(&0)));
        let len = parts
            .iter()
            .try_fold(1usize, |acc, p| acc.checked_add(p.len()))
            .ok_or_else(|| no_memory("string too large"))?;
        let layout = Layout::array::<u8>(len).map_err(|_| no_memory("string too large"))?;
        let dst = self
            .bump
            .try_alloc_layout(layout)
            .map_err(|_| no_memory("string"))?
            .as_ptr();

        // SAFETY: dst points to `len` fresh bytes owned by the arena and the
        // parts add up to `len - 1` bytes.
        unsafe {
            let mut offset = 0;
            for part in parts {
                ptr::copy_nonoverlapping(part.as_ptr(), dst.add(offset), part.len());
                offset += part.len();
            }
            dst.add(offset).write(0);
            let slice = std::slice::from_raw_parts(dst, len);
            Ok(CStr::from_bytes_with_nul_unchecked(slice))
        }
    }

    /// Pointer array with room for `capacity` entries plus the terminating null
    pub fn alloc_array(&self, capacity: usize) -> SpawnResult<CStrArray<'_>> {
        let slots = capacity
            .checked_add(1)
            .ok_or_else(|| no_memory("pointer array too large"))?;
        let layout = Layout::array::<*mut c_char>(slots)
            .map_err(|_| no_memory("pointer array too large"))?;
        let base = self
            .bump
            .try_alloc_layout(layout)
            .map_err(|_| no_memory("pointer array"))?
            .cast::<*mut c_char>();

        // SAFETY: base is aligned for `slots` pointers and every slot is
        // written before the slice is formed.
        let slots = unsafe {
            for i in 0..slots {
                base.as_ptr().add(i).write(ptr::null_mut());
            }
            std::slice::from_raw_parts_mut(base.as_ptr(), slots)
        };

        Ok(CStrArray { slots, len: 0 })
    }

    #[cfg(test)]
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }
}

fn no_memory(what: &str) -> SpawnError {
    SpawnError::ResourceExhausted(what.to_string())
}

/// Null-terminated array of C string pointers, as argv and envp expect
pub(crate) struct CStrArray<'a> {
    slots: &'a mut [*mut c_char],
    len: usize,
}

impl<'a> CStrArray<'a> {
    pub fn push(&mut self, entry: &'a CStr) -> SpawnResult<()> {
        // last slot stays null
        if self.len + 1 >= self.slots.len() {
            return Err(no_memory("pointer array capacity exceeded"));
        }
        self.slots[self.len] = entry.as_ptr() as *mut c_char;
        self.len += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn as_ptr(&self) -> *const *mut c_char {
        self.slots.as_ptr()
    }

    /// Entry `index`, if it was pushed
    #[cfg(test)]
    pub fn get(&self, index: usize) -> Option<&'a CStr> {
        if index >= self.len {
            return None;
        }
        // SAFETY: pushed slots hold pointers to arena C strings living for 'a.
        Some(unsafe { CStr::from_ptr(self.slots[index]) })
    }

    #[cfg(test)]
    pub fn is_terminated(&self) -> bool {
        self.slots[self.len].is_null()
    }
}
