//! Process-level run lock.
//!
//! Only one batch run may own the input directories, ledgers and error log at
//! a time. The lock is an exclusive `fs2` lock on a well-known file; a second
//! invocation fails immediately instead of waiting.

use chrono::Utc;
use fs2::FileExt;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from lock operations.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("Another graphplot run holds the lock: {0}")]
    Locked(PathBuf),

    #[error("Failed to create lock file: {0}")]
    CreateFailed(#[source] io::Error),

    #[error("Failed to acquire lock: {0}")]
    AcquireFailed(#[source] io::Error),
}

/// Holds the run lock until dropped.
pub struct RunLockGuard {
    _file: File,
    lock_path: PathBuf,
    sidecar_path: Option<PathBuf>,
}

impl RunLockGuard {
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }
}

impl std::fmt::Debug for RunLockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunLockGuard")
            .field("lock_path", &self.lock_path)
            .finish()
    }
}

impl Drop for RunLockGuard {
    fn drop(&mut self) {
        debug!("Releasing run lock: {}", self.lock_path.display());
        if let Some(path) = &self.sidecar_path {
            if let Err(e) = fs::remove_file(path) {
                debug!("Failed to remove lock sidecar {}: {}", path.display(), e);
            }
        }
    }
}

#[derive(Serialize)]
struct LockSidecar {
    pid: u32,
    exe: Option<String>,
    timestamp: String,
}

/// `/var/run/graphplot.lock` → `/var/run/graphplot.lock.json`
fn sidecar_path_for(lock_path: &Path) -> PathBuf {
    let mut name = lock_path.as_os_str().to_owned();
    name.push(".json");
    PathBuf::from(name)
}

fn write_sidecar(lock_path: &Path) -> Option<PathBuf> {
    let sidecar = LockSidecar {
        pid: std::process::id(),
        exe: std::env::current_exe().ok().map(|p| p.display().to_string()),
        timestamp: Utc::now().to_rfc3339(),
    };
    let sidecar_path = sidecar_path_for(lock_path);
    match serde_json::to_vec_pretty(&sidecar)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
        .and_then(|payload| fs::write(&sidecar_path, payload))
    {
        Ok(()) => Some(sidecar_path),
        Err(e) => {
            warn!("Failed to write lock sidecar {}: {}", sidecar_path.display(), e);
            None
        }
    }
}

/// Try to take the run lock without blocking.
///
/// Returns `Err(LockError::Locked)` at once when another process holds it.
pub fn try_lock_run(lock_path: &Path) -> Result<RunLockGuard, LockError> {
    debug!("Attempting to acquire run lock: {}", lock_path.display());

    if let Some(parent) = lock_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(LockError::CreateFailed)?;
        }
    }

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)
        .map_err(LockError::CreateFailed)?;

    // Fully qualified: std::fs::File::try_lock_exclusive (1.89+) has a different error type.
    match FileExt::try_lock_exclusive(&file) {
        Ok(()) => {
            info!("Acquired run lock: {}", lock_path.display());
            let sidecar_path = write_sidecar(lock_path);
            Ok(RunLockGuard {
                _file: file,
                lock_path: lock_path.to_path_buf(),
                sidecar_path,
            })
        }
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
            debug!("Run lock is held by another process");
            Err(LockError::Locked(lock_path.to_path_buf()))
        }
        Err(e) => Err(LockError::AcquireFailed(e)),
    }
}
