//! Effective-uid and access(2) checks.

use crate::error::{GraphplotError, Result};
use std::path::Path;

#[cfg(unix)]
pub fn effective_uid() -> u32 {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() }
}

#[cfg(not(unix))]
pub fn effective_uid() -> u32 {
    0
}

/// Fail unless running as root.
pub fn ensure_root() -> Result<()> {
    match effective_uid() {
        0 => Ok(()),
        uid => Err(GraphplotError::NotPrivileged(uid)),
    }
}

/// Whether the real user may read and/or write `path`.
#[cfg(unix)]
pub fn has_access(path: &Path, read: bool, write: bool) -> bool {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    let mut mode = libc::F_OK;
    if read {
        mode |= libc::R_OK;
    }
    if write {
        mode |= libc::W_OK;
    }
    // SAFETY: c_path is a valid NUL-terminated string for the call's duration.
    unsafe { libc::access(c_path.as_ptr(), mode) == 0 }
}

#[cfg(not(unix))]
pub fn has_access(path: &Path, _read: bool, write: bool) -> bool {
    match std::fs::metadata(path) {
        Ok(m) => !write || !m.permissions().readonly(),
        Err(_) => false,
    }
}
