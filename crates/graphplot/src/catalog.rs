//! Run output document
//!
//! One document per run maps each processed file's final name to its
//! flattened attributes. Unprocessed records are left out. The document is
//! handed to a [`CatalogSink`]; the default sink writes pretty JSON.

use crate::error::Result;
use crate::intake::FileRecord;
use crate::state::RunState;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub fname: String,
    pub date: String,
    pub time: String,
    pub identifier: String,
    pub target: String,
    pub command: String,
    pub location: PathBuf,
    pub processed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_locations: Vec<PathBuf>,
    /// Problems hit along the way that did not stop placement.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl From<&FileRecord> for CatalogEntry {
    fn from(record: &FileRecord) -> Self {
        Self {
            fname: record.fname.clone(),
            date: record.date.clone(),
            time: record.time.clone(),
            identifier: record.identifier.clone(),
            target: record.target_name.clone(),
            command: record.cmd.clone(),
            location: record.location().to_path_buf(),
            processed: record.is_processed(),
            extra_locations: record
                .extra_locations
                .iter()
                .map(|l| l.dir.join(&l.name))
                .collect(),
            errors: record.errors.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogDocument {
    pub entries: BTreeMap<String, CatalogEntry>,
}

impl CatalogDocument {
    pub fn from_state(state: &RunState) -> Self {
        let entries = state
            .records()
            .filter(|r| r.is_processed())
            .map(|r| (r.renamed_name.clone(), CatalogEntry::from(r)))
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub trait CatalogSink {
    /// Publish the document. Returns where it went, if that is a path.
    fn publish(&mut self, document: &CatalogDocument, run_started: NaiveDateTime) -> Result<Option<PathBuf>>;
}

/// Writes `graphplots_<YYYYMMDD_HHMMSS>.json` into a directory.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn file_name(run_started: NaiveDateTime) -> String {
        format!("graphplots_{}.json", run_started.format("%Y%m%d_%H%M%S"))
    }
}

impl CatalogSink for JsonFileSink {
    fn publish(&mut self, document: &CatalogDocument, run_started: NaiveDateTime) -> Result<Option<PathBuf>> {
        let path = self.dir.join(Self::file_name(run_started));
        let payload = serde_json::to_vec_pretty(document)?;
        fs::write(&path, payload)?;
        info!(entries = document.len(), "Catalog written to {}", path.display());
        Ok(Some(path))
    }
}
