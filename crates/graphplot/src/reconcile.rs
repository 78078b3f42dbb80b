//! Stuck-file detection
//!
//! Two independent checks run after distribution:
//!
//! - **Silently failed**: a name present in a command directory both before
//!   and after the run that never became a tracked record. Nothing handled it.
//! - **Visible but incomplete**: a tracked record that never reached a
//!   region. It is moved to quarantine.
//!
//! A file can only show up in one of the two.

use crate::error_log::ErrorLog;
use crate::intake::{move_file, DirSnapshot};
use crate::state::RunState;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// A file nobody handled.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct StuckFile {
    pub command: String,
    pub name: String,
}

impl StuckFile {
    /// `command/name`
    pub fn command_path(&self) -> String {
        format!("{}/{}", self.command, self.name)
    }
}

/// Names in both snapshots that no record claims, per command, sorted.
pub fn find_silently_failed(before: &DirSnapshot, after: &DirSnapshot, state: &RunState) -> Vec<StuckFile> {
    let mut stuck = Vec::new();
    for (command, names_before) in before {
        let Some(names_after) = after.get(command) else {
            continue;
        };
        let tracked = state.command(command);
        for name in names_before.intersection(names_after) {
            if tracked.map(|c| c.tracks(name)).unwrap_or(false) {
                continue;
            }
            stuck.push(StuckFile {
                command: command.clone(),
                name: name.clone(),
            });
        }
    }
    stuck
}

/// A record moved to quarantine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quarantined {
    pub command: String,
    pub name: String,
    pub location: PathBuf,
}

/// Move every unprocessed record into `quarantine_dir` under its current
/// name. Records that fail to move stay where they are and are still
/// reported.
pub fn quarantine_unfinished(state: &mut RunState, quarantine_dir: &Path, log: &mut ErrorLog) -> Vec<Quarantined> {
    let mut out = Vec::new();
    for record in state.records_mut() {
        if record.is_processed() {
            continue;
        }
        let name = record.current_name().to_string();
        match move_file(record.location(), quarantine_dir, &name) {
            Ok(path) => {
                record.mark_quarantined(path);
                log.write(format!(
                    "{}: valid name but not processed, moved to quarantine",
                    record.command_path()
                ));
            }
            Err(e) => {
                let msg = format!("{}: quarantine move failed: {}", record.command_path(), e);
                record.errors.push(msg.clone());
                log.write(msg);
            }
        }
        out.push(Quarantined {
            command: record.cmd.clone(),
            name: record.fname.clone(),
            location: record.location().to_path_buf(),
        });
    }
    if !out.is_empty() {
        info!(count = out.len(), "Quarantine sweep finished");
    }
    out
}
