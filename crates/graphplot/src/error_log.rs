//! Operator-facing error log
//!
//! A plain text file in the error directory, one timestamped line per event,
//! appended across runs. Every line is mirrored to tracing. Writing never
//! fails the run: if the file cannot be written the line still reaches
//! tracing and the in-memory list.

use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug)]
pub struct ErrorLog {
    path: PathBuf,
    file: Option<File>,
    entries: Vec<String>,
}

impl ErrorLog {
    /// Open `path` for appending, creating it if needed.
    pub fn open(path: &Path) -> Self {
        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => Some(f),
            Err(e) => {
                warn!("Cannot open error log {}: {}", path.display(), e);
                None
            }
        };
        Self {
            path: path.to_path_buf(),
            file,
            entries: Vec::new(),
        }
    }

    /// A log that only keeps entries in memory.
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            file: None,
            entries: Vec::new(),
        }
    }

    pub fn write(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(target: "graphplot::error_log", "{}", message);
        if let Some(file) = self.file.as_mut() {
            let line = format!("{} {}\n", Local::now().format("%Y-%m-%d %H:%M:%S"), message);
            if let Err(e) = file.write_all(line.as_bytes()) {
                warn!("Error log write failed ({}): {}", self.path.display(), e);
            }
        }
        self.entries.push(message);
    }

    /// Messages written during this run.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn appends_across_opens() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("errors.log");

        let mut first = ErrorLog::open(&path);
        first.write("one");
        drop(first);
        let mut second = ErrorLog::open(&path);
        second.write("two");
        drop(second);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" one"));
        assert!(lines[1].ends_with(" two"));
    }

    #[test]
    fn unwritable_path_still_records_entries() {
        let temp = TempDir::new().unwrap();
        let mut log = ErrorLog::open(&temp.path().join("missing").join("errors.log"));
        log.write("kept");
        assert_eq!(log.entries(), ["kept".to_string()]);
    }
}
