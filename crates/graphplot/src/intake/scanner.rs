//! Command directory listing
//!
//! Lists regular files directly inside each command's input directory.
//! Listing order is whatever the filesystem returns; nothing downstream may
//! rely on it being sorted.

use crate::error::Result;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A listed file and its size in bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedEntry {
    pub name: String,
    pub size: u64,
}

/// One command directory's contents at scan time.
#[derive(Debug, Clone, Default)]
pub struct CommandListing {
    /// Every regular file, any extension.
    pub all: Vec<String>,
    /// Files carrying one of the allowed extensions.
    pub filtered: Vec<ScannedEntry>,
}

/// Per-command file-name sets captured at one instant.
pub type DirSnapshot = BTreeMap<String, BTreeSet<String>>;

#[derive(Debug, Clone)]
pub struct Scanner {
    suffixes: Vec<String>,
}

impl Scanner {
    pub fn new(extensions: &[String]) -> Self {
        Self {
            suffixes: extensions.iter().map(|e| format!(".{}", e)).collect(),
        }
    }

    pub fn has_allowed_extension(&self, name: &str) -> bool {
        self.suffixes.iter().any(|s| name.ends_with(s.as_str()))
    }

    /// List one command directory.
    pub fn list(&self, dir: &Path) -> Result<CommandListing> {
        let mut listing = CommandListing::default();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = match entry.file_name().to_str() {
                Some(n) => n.to_string(),
                None => {
                    warn!("Skipping non UTF-8 file name in {}", dir.display());
                    continue;
                }
            };
            if self.has_allowed_extension(&name) {
                let size = entry.metadata()?.len();
                listing.filtered.push(ScannedEntry {
                    name: name.clone(),
                    size,
                });
            }
            listing.all.push(name);
        }
        debug!(
            dir = %dir.display(),
            all = listing.all.len(),
            filtered = listing.filtered.len(),
            "Listed command directory"
        );
        Ok(listing)
    }

    /// Capture the name set of every command directory.
    pub fn snapshot<'a, I>(&self, commands: I, input_dir: &Path) -> Result<DirSnapshot>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut snapshot = DirSnapshot::new();
        for cmd in commands {
            let listing = self.list(&input_dir.join(cmd))?;
            snapshot.insert(cmd.clone(), listing.all.into_iter().collect());
        }
        Ok(snapshot)
    }
}
