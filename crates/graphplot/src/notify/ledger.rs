//! Notification ledgers
//!
//! A ledger is a text file with one key per line. It is read once when the
//! run starts and only ever appended to. Keys recorded during the run are
//! visible to every later check in the same run.

use super::{Channel, Notification, Notifier};
use crate::error::Result;
use std::collections::{BTreeMap, HashSet};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct NotificationLedger {
    path: PathBuf,
    keys: HashSet<String>,
    pending: Vec<String>,
}

impl NotificationLedger {
    /// Load a ledger. A missing file is an empty ledger.
    pub fn load(path: &Path) -> Result<Self> {
        let keys = match fs::read_to_string(path) {
            Ok(content) => content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashSet::new(),
            Err(e) => return Err(e.into()),
        };
        debug!("Loaded ledger {} ({} keys)", path.display(), keys.len());
        Ok(Self {
            path: path.to_path_buf(),
            keys,
            pending: Vec::new(),
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Add a key. Returns false if it was already present.
    pub fn record(&mut self, key: &str) -> bool {
        if self.keys.insert(key.to_string()) {
            self.pending.push(key.to_string());
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Append keys recorded since the last persist. Returns how many were written.
    pub fn persist(&mut self) -> Result<usize> {
        if self.pending.is_empty() {
            return Ok(0);
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut buf = String::new();
        for key in &self.pending {
            buf.push_str(key);
            buf.push('\n');
        }
        file.write_all(buf.as_bytes())?;
        file.sync_all()?;
        let written = self.pending.len();
        self.pending.clear();
        Ok(written)
    }
}

/// One line of a pending message and the ledger key that gates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingNotice {
    pub key: String,
    pub line: String,
}

impl PendingNotice {
    pub fn new(key: impl Into<String>, line: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            line: line.into(),
        }
    }
}

/// What [`Deduper::dispatch`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Every key was already in the ledger.
    NothingNew,
    /// No recipients configured; nothing was sent or recorded.
    NoRecipients,
    /// Sent; this many new keys were recorded.
    Sent(usize),
}

/// At-most-once gate over the three channel ledgers.
#[derive(Debug)]
pub struct Deduper {
    ledgers: BTreeMap<Channel, NotificationLedger>,
}

impl Deduper {
    pub fn load<F>(path_for: F) -> Result<Self>
    where
        F: Fn(Channel) -> PathBuf,
    {
        let mut ledgers = BTreeMap::new();
        for channel in Channel::ALL {
            ledgers.insert(channel, NotificationLedger::load(&path_for(channel))?);
        }
        Ok(Self { ledgers })
    }

    /// Read-only membership test.
    pub fn already_notified(&self, channel: Channel, key: &str) -> bool {
        self.ledgers
            .get(&channel)
            .map(|l| l.contains(key))
            .unwrap_or(false)
    }

    /// Send one message covering every notice whose key is new, then record
    /// those keys and append them to the channel's ledger file. Nothing is
    /// recorded unless the send succeeds. If the append fails the keys stay
    /// pending for [`Deduper::persist`].
    pub fn dispatch<F>(
        &mut self,
        channel: Channel,
        notices: Vec<PendingNotice>,
        notifier: &mut dyn Notifier,
        compose: F,
    ) -> Result<DispatchOutcome>
    where
        F: FnOnce(&[String]) -> Notification,
    {
        let mut new_keys: Vec<String> = Vec::new();
        let mut lines: Vec<String> = Vec::new();
        for notice in notices {
            if self.already_notified(channel, &notice.key) {
                debug!(%channel, key = %notice.key, "Already notified");
                continue;
            }
            if !new_keys.contains(&notice.key) {
                new_keys.push(notice.key);
            }
            lines.push(notice.line);
        }
        if lines.is_empty() {
            return Ok(DispatchOutcome::NothingNew);
        }

        let notification = compose(&lines);
        if notification.to.is_empty() {
            warn!(%channel, "No recipients configured, {} line(s) not sent", lines.len());
            return Ok(DispatchOutcome::NoRecipients);
        }
        notifier.send(&notification)?;

        let Some(ledger) = self.ledgers.get_mut(&channel) else {
            return Ok(DispatchOutcome::Sent(0));
        };
        let recorded = new_keys.iter().filter(|k| ledger.record(k)).count();
        if let Err(e) = ledger.persist() {
            warn!(%channel, "Ledger append failed, will retry at end of run: {}", e);
        }
        info!(%channel, recorded, "Notification sent");
        Ok(DispatchOutcome::Sent(recorded))
    }

    /// Append every channel's new keys to disk.
    pub fn persist(&mut self) -> Result<usize> {
        let mut total = 0;
        for ledger in self.ledgers.values_mut() {
            total += ledger.persist()?;
        }
        Ok(total)
    }
}
