//! Target deck lookup
//!
//! The deck maps BE numbers to target names. One `IDENTIFIER|TARGET NAME`
//! entry per line; blank lines and `#` comments are skipped.

use crate::error::{GraphplotError, Result};
use crate::error_log::ErrorLog;
use crate::intake::{FileRecord, NOT_IN_TARGET_DECK};
use crate::notify::{Channel, Deduper};
use crate::state::CommandState;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct DeckIndex {
    targets: HashMap<String, String>,
}

impl DeckIndex {
    /// Load the deck file. Failure here aborts the run.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GraphplotError::Reference(format!("target deck {}: {}", path.display(), e))
        })?;
        Ok(Self::parse_str(&content))
    }

    pub fn parse_str(content: &str) -> Self {
        let mut targets = HashMap::new();
        for (lineno, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.split_once('|') {
                Some((id, name)) if !id.trim().is_empty() => {
                    let id = id.trim().to_string();
                    if targets.contains_key(&id) {
                        debug!("Deck line {}: duplicate identifier {}, keeping first", lineno + 1, id);
                        continue;
                    }
                    targets.insert(id, name.trim().to_string());
                }
                _ => warn!("Deck line {} is malformed, skipped: {}", lineno + 1, raw),
            }
        }
        Self { targets }
    }

    pub fn lookup(&self, identifier: &str) -> Option<&str> {
        self.targets.get(identifier).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Assign the record's target name.
///
/// Unknown identifiers get [`NOT_IN_TARGET_DECK`]. If the not-in-deck ledger
/// has not seen the identifier the file name is queued for notification;
/// otherwise only a log line is written. The record stays valid either way.
pub fn resolve(
    deck: &DeckIndex,
    record: &mut FileRecord,
    deduper: &Deduper,
    command: &mut CommandState,
    log: &mut ErrorLog,
) {
    match deck.lookup(&record.identifier) {
        Some(target) => {
            debug!(file = %record.fname, target_name = target, "Resolved target");
            record.set_target(target);
        }
        None => {
            record.set_target(NOT_IN_TARGET_DECK);
            if deduper.already_notified(Channel::NotInDeck, &record.identifier) {
                debug!(
                    file = %record.fname,
                    identifier = %record.identifier,
                    "Not in deck, already notified"
                );
            } else {
                log.write(format!(
                    "{}: BE number {} not in target deck",
                    record.command_path(),
                    record.identifier
                ));
                command.queue_not_in_deck(&record.fname, &record.identifier);
            }
        }
    }
}
