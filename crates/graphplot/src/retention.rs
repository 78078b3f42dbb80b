//! Age-based cleanup of input and rejected directories.

use crate::error::Result;
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};
use walkdir::WalkDir;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Delete regular files directly in `dir` last modified more than `days`
/// days before `now`. Returns how many were removed. Individual failures
/// are logged and skipped.
pub fn purge_older_than(dir: &Path, days: u32, now: SystemTime) -> Result<usize> {
    let cutoff = now
        .checked_sub(Duration::from_secs(u64::from(days) * SECONDS_PER_DAY))
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let mut removed = 0;
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let modified = match entry.metadata().map(|m| m.modified()) {
            Ok(Ok(t)) => t,
            _ => {
                warn!("No modification time for {}", entry.path().display());
                continue;
            }
        };
        if modified >= cutoff {
            continue;
        }
        match fs::remove_file(entry.path()) {
            Ok(()) => {
                debug!("Purged {}", entry.path().display());
                removed += 1;
            }
            Err(e) => warn!("Cannot purge {}: {}", entry.path().display(), e),
        }
    }
    Ok(removed)
}
