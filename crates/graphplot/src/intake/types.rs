//! Core types for intake
//!
//! A [`FileRecord`] is created once a candidate passes the filename
//! validator and is tracked until it is permanently relocated.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Target name assigned when an identifier is absent from the target deck.
pub const NOT_IN_TARGET_DECK: &str = "NOT_IN_TARGET_DECK";

// ============================================================================
// Verdicts
// ============================================================================

/// Why a candidate was rejected. Checks run in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    ZeroFileSize,
    InvalidName,
    InvalidYear,
    InvalidDatetime,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ZeroFileSize => "zero file size",
            Self::InvalidName => "invalid name",
            Self::InvalidYear => "invalid year",
            Self::InvalidDatetime => "invalid datetime",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rejected: {}", self.as_str())
    }
}

/// Fields extracted from a valid file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    /// `YYYYMMDD`
    pub date: String,
    /// `HHMM`
    pub time: String,
    pub year: i32,
    pub month: u32,
    /// BE number
    pub identifier: String,
}

// ============================================================================
// Records
// ============================================================================

/// Lifecycle position of a tracked record.
///
/// Rejected candidates never become records; `Processed` and `Quarantined`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStage {
    Parsed,
    DeckChecked,
    ExternallyProcessed,
    Renamed,
    Processed,
    Quarantined,
}

/// A file produced alongside the record by external processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLocation {
    pub name: String,
    pub dir: PathBuf,
}

impl FileLocation {
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
        }
    }
}

/// One valid candidate file tracked through the run.
#[derive(Debug, Clone, Serialize)]
pub struct FileRecord {
    pub fname: String,
    pub cmd: String,
    pub date: String,
    pub time: String,
    pub year: i32,
    pub month: u32,
    pub identifier: String,
    pub target_name: String,
    pub renamed_name: String,
    /// Full path of the file right now. Authoritative after every move.
    location: PathBuf,
    processed: bool,
    stage: RecordStage,
    pub errors: Vec<String>,
    pub extra_locations: Vec<FileLocation>,
}

impl FileRecord {
    pub fn new(
        fname: impl Into<String>,
        cmd: impl Into<String>,
        parsed: ParsedName,
        location: PathBuf,
        processed_tag: &str,
    ) -> Self {
        let fname = fname.into();
        let renamed = renamed_name(&fname, processed_tag);
        Self {
            fname,
            cmd: cmd.into(),
            date: parsed.date,
            time: parsed.time,
            year: parsed.year,
            month: parsed.month,
            identifier: parsed.identifier,
            target_name: String::new(),
            renamed_name: renamed,
            location,
            processed: false,
            stage: RecordStage::Parsed,
            errors: Vec::new(),
            extra_locations: Vec::new(),
        }
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Directory currently holding the file.
    pub fn directory(&self) -> &Path {
        self.location.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Name the file currently carries on disk.
    pub fn current_name(&self) -> &str {
        self.location
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.fname)
    }

    pub fn is_processed(&self) -> bool {
        self.processed
    }

    pub fn stage(&self) -> RecordStage {
        self.stage
    }

    pub fn is_in_deck(&self) -> bool {
        self.target_name != NOT_IN_TARGET_DECK
    }

    /// `command/original_name`, the key used by path-keyed ledgers.
    pub fn command_path(&self) -> String {
        format!("{}/{}", self.cmd, self.fname)
    }

    /// `<YYYY>/<MM>` output subpath.
    pub fn year_month_dir(&self) -> PathBuf {
        PathBuf::from(format!("{:04}", self.year)).join(format!("{:02}", self.month))
    }

    pub fn set_target(&mut self, target_name: impl Into<String>) {
        self.target_name = target_name.into();
        self.stage = RecordStage::DeckChecked;
    }

    pub fn add_location(&mut self, location: FileLocation) {
        self.extra_locations.push(location);
    }

    pub fn mark_externally_processed(&mut self) {
        if self.stage == RecordStage::DeckChecked {
            self.stage = RecordStage::ExternallyProcessed;
        }
    }

    /// Record the in-place rename performed by the caller.
    pub fn mark_renamed(&mut self, new_location: PathBuf) {
        self.location = new_location;
        self.stage = RecordStage::Renamed;
    }

    /// Record a move to the region tree. The transition happens at most once.
    pub fn mark_processed(&mut self, new_location: PathBuf) -> bool {
        if self.processed {
            return false;
        }
        self.location = new_location;
        self.processed = true;
        self.stage = RecordStage::Processed;
        true
    }

    /// Record a move to quarantine. Processed records stay processed.
    pub fn mark_quarantined(&mut self, new_location: PathBuf) -> bool {
        if self.processed {
            return false;
        }
        self.location = new_location;
        self.stage = RecordStage::Quarantined;
        true
    }
}

// ============================================================================
// Naming helpers
// ============================================================================

/// `<stem>_<tag>.<ext>`; names without an extension get `_<tag>` appended.
pub fn renamed_name(fname: &str, tag: &str) -> String {
    match fname.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}_{}.{}", stem, tag, ext),
        _ => format!("{}_{}", fname, tag),
    }
}

/// Metadata sidecars that travel with a file: `<name>.xml` and `<stem>.xml`.
pub fn sidecar_candidates(fname: &str) -> Vec<String> {
    let mut out = vec![format!("{}.xml", fname)];
    if let Some((stem, ext)) = fname.rsplit_once('.') {
        if !stem.is_empty() && !ext.eq_ignore_ascii_case("xml") {
            out.push(format!("{}.xml", stem));
        }
    }
    out
}
