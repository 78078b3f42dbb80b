//! Outbound notifications
//!
//! Three channels are deduplicated against durable ledgers so a condition is
//! reported once across all runs. Two further reports (quarantine sweep and
//! the per-run reject summary) go out every time they have content.
//!
//! Delivery is behind [`Notifier`]; the default adapter spools RFC-822 text
//! files for an external MTA.

pub mod ledger;
pub mod reports;
pub mod spool;

pub use ledger::{DispatchOutcome, Deduper, NotificationLedger, PendingNotice};
pub use spool::SpoolNotifier;

use crate::error::Result;
use serde::Serialize;
use std::fmt;

/// A deduplicated notification channel. Each has its own ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Channel {
    /// Keyed by `command/name`.
    InvalidFilename,
    /// Keyed by identifier.
    NotInDeck,
    /// Keyed by `command/name`.
    SilentlyFailed,
}

impl Channel {
    pub const ALL: [Channel; 3] = [
        Channel::InvalidFilename,
        Channel::NotInDeck,
        Channel::SilentlyFailed,
    ];

    pub fn default_ledger_name(&self) -> &'static str {
        match self {
            Channel::InvalidFilename => "rejected_gps.ledger",
            Channel::NotInDeck => "mail_notdeck.ledger",
            Channel::SilentlyFailed => "nonproc.ledger",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::InvalidFilename => "invalid-filename",
            Channel::NotInDeck => "not-in-deck",
            Channel::SilentlyFailed => "silently-failed",
        };
        f.write_str(name)
    }
}

/// Every kind of message a run can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ReportKind {
    InvalidFilename,
    NotInDeck,
    SilentlyFailed,
    ValidNotProcessed,
    RejectSummary,
}

impl ReportKind {
    pub fn subject(&self) -> &'static str {
        match self {
            ReportKind::InvalidFilename => "Invalid Graphplot File Names",
            ReportKind::NotInDeck => "GraphPlots File Name Not In Deck",
            ReportKind::SilentlyFailed => "Non-Processed File Names",
            ReportKind::ValidNotProcessed => "Valid File Name, but Non-Processed File(s)",
            ReportKind::RejectSummary => "GP:  Rejected files",
        }
    }

    /// File-name friendly tag.
    pub fn slug(&self) -> &'static str {
        match self {
            ReportKind::InvalidFilename => "invalid_filename",
            ReportKind::NotInDeck => "not_in_deck",
            ReportKind::SilentlyFailed => "silently_failed",
            ReportKind::ValidNotProcessed => "valid_not_processed",
            ReportKind::RejectSummary => "reject_summary",
        }
    }
}

/// A composed message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: ReportKind,
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Delivery seam. Implementations must return `Err` on any failure so the
/// caller can leave ledger entries unwritten.
pub trait Notifier {
    fn send(&mut self, notification: &Notification) -> Result<()>;
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn send(&mut self, notification: &Notification) -> Result<()> {
        (**self).send(notification)
    }
}
