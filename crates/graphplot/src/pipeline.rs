//! Batch orchestration
//!
//! One call to [`execute`] is one run: privilege check, run lock, preflight,
//! then [`run_batch`]. Stages run strictly in sequence over an explicit
//! [`RunState`]:
//!
//! 1. list each command directory (the "before" snapshot) and classify
//!    every candidate: reject, or track as a record
//! 2. invalid-filename and not-in-deck notifications
//! 3. region distribution
//! 4. catalog document
//! 5. "after" snapshot and silently-failed report
//! 6. quarantine sweep and its report
//! 7. reject summary, ledger persistence, retention
//!
//! No per-file problem aborts the run. Only missing reference data that
//! every file depends on (deck, ledgers) or an input directory that cannot
//! be listed before anything moved does. Ledger keys hit disk as soon as
//! their message is sent.

use crate::catalog::{CatalogDocument, CatalogSink};
use crate::config::GraphplotConfig;
use crate::deck::{self, DeckIndex};
use crate::error::Result;
use crate::error_log::ErrorLog;
use crate::intake::{
    move_file, sidecar_candidates, DirSnapshot, FileRecord, FilenameValidator, RejectReason,
    ScannedEntry, Scanner,
};
use crate::lock::try_lock_run;
use crate::notify::{reports, Channel, Deduper, DispatchOutcome, Notifier, PendingNotice, ReportKind};
use crate::preflight;
use crate::privilege;
use crate::processing::ExternalProcessor;
use crate::reconcile::{find_silently_failed, quarantine_unfinished};
use crate::region::{distribute, CountryIndex};
use crate::retention::purge_older_than;
use crate::state::{CommandState, RunState};
use chrono::{DateTime, Datelike, Local};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// The pluggable edges of a run.
pub struct Collaborators<'a> {
    pub processor: &'a mut dyn ExternalProcessor,
    pub notifier: &'a mut dyn Notifier,
    pub catalog: &'a mut dyn CatalogSink,
}

/// What a run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub scanned: usize,
    pub rejected: usize,
    pub valid: usize,
    pub not_in_deck: usize,
    pub processed: usize,
    pub quarantined: usize,
    pub silently_failed: usize,
    pub notifications_sent: usize,
    pub catalog: Option<PathBuf>,
    pub purged: usize,
}

impl RunSummary {
    /// `key=value` lines for the CLI.
    pub fn to_lines(&self) -> Vec<String> {
        vec![
            format!("scanned={}", self.scanned),
            format!("rejected={}", self.rejected),
            format!("valid={}", self.valid),
            format!("not_in_deck={}", self.not_in_deck),
            format!("processed={}", self.processed),
            format!("quarantined={}", self.quarantined),
            format!("silently_failed={}", self.silently_failed),
            format!("notifications_sent={}", self.notifications_sent),
            format!(
                "catalog={}",
                self.catalog
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default()
            ),
            format!("purged={}", self.purged),
        ]
    }
}

/// Full run: privilege check, lock, preflight, batch.
pub fn execute(
    config: &GraphplotConfig,
    now: DateTime<Local>,
    collab: Collaborators<'_>,
) -> Result<RunSummary> {
    if config.require_root {
        privilege::ensure_root()?;
    }
    let _lock = try_lock_run(&config.lock_path())?;
    preflight::run(config)?;
    run_batch(config, now, collab)
}

/// Everything that stays fixed for the length of a run.
struct Batch<'c> {
    config: &'c GraphplotConfig,
    now: DateTime<Local>,
    validator: FilenameValidator,
    scanner: Scanner,
    deck: DeckIndex,
    deduper: Deduper,
    log: ErrorLog,
    summary: RunSummary,
}

/// Run every stage. The caller holds the lock and has passed preflight.
pub fn run_batch(
    config: &GraphplotConfig,
    now: DateTime<Local>,
    collab: Collaborators<'_>,
) -> Result<RunSummary> {
    let Collaborators {
        processor,
        notifier,
        catalog,
    } = collab;

    let log = ErrorLog::open(&config.error_log_path());
    let mut batch = Batch {
        config,
        now,
        validator: FilenameValidator::new(&config.extensions)?,
        scanner: Scanner::new(&config.extensions),
        deck: DeckIndex::load(&config.paths.target_deck)?,
        deduper: Deduper::load(|c| config.ledger_path(c))?,
        log,
        summary: RunSummary::default(),
    };
    info!(
        commands = config.commands.len(),
        deck_entries = batch.deck.len(),
        "Run started"
    );

    let mut state = RunState::new(&config.commands);
    let mut listings = Vec::with_capacity(config.commands.len());
    for cmd in &config.commands {
        listings.push(batch.scanner.list(&config.command_dir(cmd))?);
    }
    let mut before = DirSnapshot::new();
    for (cmd_state, listing) in state.commands.iter_mut().zip(listings) {
        let dir = config.command_dir(&cmd_state.command);
        before.insert(cmd_state.command.clone(), listing.all.iter().cloned().collect());
        cmd_state.all_files = listing.all;
        cmd_state.filtered_files = listing.filtered.iter().map(|e| e.name.clone()).collect();
        for entry in &listing.filtered {
            batch.classify(cmd_state, &dir, entry, processor);
        }
    }
    if state.scanned_count() == 0 {
        batch.log.write("There are no files to process.");
    }

    batch.notify_invalid_names(&state, notifier);
    batch.notify_not_in_deck(&state, notifier);

    let index = CountryIndex::load(
        &config.paths.list_dir,
        &config.paths.benum_dir,
        &config.regions,
        &mut batch.log,
    );
    distribute(&index, &mut state, &config.paths.graphbase_dir, &mut batch.log);

    let document = CatalogDocument::from_state(&state);
    if document.is_empty() {
        debug!("Nothing processed, no catalog document");
    } else {
        match catalog.publish(&document, now.naive_local()) {
            Ok(path) => batch.summary.catalog = path,
            Err(e) => batch.log.write(format!("Catalog publish failed: {}", e)),
        }
    }

    match batch.scanner.snapshot(&config.commands, &config.paths.input_dir) {
        Ok(after) => {
            let stuck = find_silently_failed(&before, &after, &state);
            for file in &stuck {
                batch.log.write(format!("{}: file was not processed", file.command_path()));
            }
            batch.summary.silently_failed = stuck.len();
            let notices = stuck
                .iter()
                .map(|f| PendingNotice::new(f.command_path(), f.command_path()))
                .collect();
            batch.dispatch(Channel::SilentlyFailed, ReportKind::SilentlyFailed, notices, notifier);
        }
        Err(e) => batch.log.write(format!(
            "Input listing after processing failed, silently failed check skipped: {}",
            e
        )),
    }

    let quarantined = quarantine_unfinished(&mut state, &config.paths.quarantine_dir, &mut batch.log);
    batch.summary.quarantined = quarantined.len();
    let lines: Vec<String> = quarantined
        .iter()
        .map(|q| format!("{}/{}", q.command, q.name))
        .collect();
    batch.report(ReportKind::ValidNotProcessed, &lines, notifier);

    let reject_lines: Vec<String> = state
        .commands
        .iter()
        .flat_map(|c| {
            c.rejects
                .iter()
                .map(move |r| format!("{}/{}: {}", c.command, r.name, r.reason))
        })
        .collect();
    batch.report(ReportKind::RejectSummary, &reject_lines, notifier);

    match batch.deduper.persist() {
        Ok(n) => debug!("Persisted {} retried ledger entries", n),
        Err(e) => batch.log.write(format!("Ledger persist failed: {}", e)),
    }

    if config.retention.enabled {
        batch.retention();
    }

    let mut summary = batch.summary;
    summary.scanned = state.scanned_count();
    summary.rejected = state.reject_count();
    summary.valid = state.valid_count();
    summary.not_in_deck = state.records().filter(|r| !r.is_in_deck()).count();
    summary.processed = state.processed_count();
    info!(
        scanned = summary.scanned,
        rejected = summary.rejected,
        processed = summary.processed,
        quarantined = summary.quarantined,
        silently_failed = summary.silently_failed,
        "Run finished"
    );
    Ok(summary)
}

impl Batch<'_> {
    /// One verdict per candidate.
    fn classify(
        &mut self,
        cmd_state: &mut CommandState,
        dir: &Path,
        entry: &ScannedEntry,
        processor: &mut dyn ExternalProcessor,
    ) {
        let parsed = match self.validator.validate(&entry.name, entry.size, self.now.year()) {
            Ok(parsed) => parsed,
            Err(reason) => {
                self.reject(cmd_state, dir, &entry.name, reason);
                return;
            }
        };

        let mut record = FileRecord::new(
            entry.name.clone(),
            cmd_state.command.clone(),
            parsed,
            dir.join(&entry.name),
            &self.config.processed_tag,
        );
        let renamed_path = dir.join(&record.renamed_name);
        if renamed_path.exists() {
            self.log.write(format!(
                "{}: rename target {} already exists, file left in place",
                record.command_path(),
                record.renamed_name
            ));
            return;
        }

        deck::resolve(&self.deck, &mut record, &self.deduper, cmd_state, &mut self.log);

        let mut produced = Vec::new();
        let outcome = processor.process(&record, &mut produced);
        for location in produced {
            record.add_location(location);
        }
        match outcome {
            Ok(()) => record.mark_externally_processed(),
            Err(e) => {
                let msg = format!("{}: external processing failed: {}", record.command_path(), e);
                record.errors.push(msg.clone());
                self.log.write(msg);
            }
        }

        match move_file(record.location(), dir, &record.renamed_name) {
            Ok(path) => record.mark_renamed(path),
            Err(e) => {
                let msg = format!("{}: rename failed: {}", record.command_path(), e);
                record.errors.push(msg.clone());
                self.log.write(msg);
            }
        }
        cmd_state.valid.push(record);
    }

    /// Move a rejected file (and, for empty files, its sidecars) out of the
    /// input directory.
    fn reject(&mut self, cmd_state: &mut CommandState, dir: &Path, name: &str, reason: RejectReason) {
        let rejected_dir = &self.config.paths.rejected_dir;
        self.log.write(format!("{}/{}: {}", cmd_state.command, name, reason));
        if let Err(e) = move_file(&dir.join(name), rejected_dir, name) {
            self.log.write(format!("{}/{}: reject move failed: {}", cmd_state.command, name, e));
        }
        if reason == RejectReason::ZeroFileSize {
            for sidecar in sidecar_candidates(name) {
                let path = dir.join(&sidecar);
                if !path.is_file() {
                    continue;
                }
                match move_file(&path, rejected_dir, &sidecar) {
                    Ok(_) => self.log.write(format!(
                        "{}/{}: rejected along with zero size file",
                        cmd_state.command, sidecar
                    )),
                    Err(e) => self.log.write(format!(
                        "{}/{}: sidecar move failed: {}",
                        cmd_state.command, sidecar, e
                    )),
                }
            }
        }
        cmd_state.reject(name, reason);
    }

    fn notify_invalid_names(&mut self, state: &RunState, notifier: &mut dyn Notifier) {
        let notices = state
            .commands
            .iter()
            .flat_map(|c| {
                c.rejects.iter().map(move |r| {
                    let key = format!("{}/{}", c.command, r.name);
                    PendingNotice::new(key.clone(), key)
                })
            })
            .collect();
        self.dispatch(Channel::InvalidFilename, ReportKind::InvalidFilename, notices, notifier);
    }

    /// One consolidated message for every command.
    fn notify_not_in_deck(&mut self, state: &RunState, notifier: &mut dyn Notifier) {
        let notices = state
            .commands
            .iter()
            .flat_map(|c| {
                c.not_in_deck.iter().map(move |n| {
                    PendingNotice::new(n.identifier.clone(), format!("{}/{}", c.command, n.name))
                })
            })
            .collect();
        self.dispatch(Channel::NotInDeck, ReportKind::NotInDeck, notices, notifier);
    }

    fn dispatch(
        &mut self,
        channel: Channel,
        kind: ReportKind,
        notices: Vec<PendingNotice>,
        notifier: &mut dyn Notifier,
    ) {
        let mail = &self.config.mail;
        match self
            .deduper
            .dispatch(channel, notices, notifier, |lines| reports::compose(kind, mail, lines))
        {
            Ok(DispatchOutcome::Sent(_)) => self.summary.notifications_sent += 1,
            Ok(DispatchOutcome::NoRecipients) => {
                self.log.write(format!("No recipients for {} notification", channel))
            }
            Ok(DispatchOutcome::NothingNew) => {}
            Err(e) => self
                .log
                .write(format!("{} notification not sent: {}", channel, e)),
        }
    }

    /// Send a report that is not gated by a ledger.
    fn report(&mut self, kind: ReportKind, lines: &[String], notifier: &mut dyn Notifier) {
        if lines.is_empty() {
            return;
        }
        let notification = reports::compose(kind, &self.config.mail, lines);
        if notification.to.is_empty() {
            warn!("No recipients for '{}'", notification.subject);
            return;
        }
        match notifier.send(&notification) {
            Ok(()) => self.summary.notifications_sent += 1,
            Err(e) => self
                .log
                .write(format!("'{}' not sent: {}", notification.subject, e)),
        }
    }

    fn retention(&mut self) {
        let now = SystemTime::from(self.now);
        let retention = &self.config.retention;
        let mut targets: Vec<(PathBuf, u32)> = self
            .config
            .commands
            .iter()
            .map(|c| (self.config.command_dir(c), retention.input_days))
            .collect();
        targets.push((self.config.paths.rejected_dir.clone(), retention.rejected_days));

        for (dir, days) in targets {
            match purge_older_than(&dir, days, now) {
                Ok(n) => self.summary.purged += n,
                Err(e) => self
                    .log
                    .write(format!("Cleanup of {} failed: {}", dir.display(), e)),
            }
        }
    }
}
