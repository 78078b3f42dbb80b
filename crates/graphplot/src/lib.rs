//! Graphplot Intake
//!
//! Batch ingestion of graph plot imagery dropped into per-command input
//! directories.
//!
//! # Run shape
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌──────────┐   ┌───────────┐   ┌─────────────┐
//! │ Scanner  │──▶│ Validator │──▶│   Deck   │──▶│  Region   │──▶│ Reconcile   │
//! │(snapshot)│   │ (reject)  │   │(not-deck)│   │(distribute)│  │(stuck files)│
//! └──────────┘   └───────────┘   └──────────┘   └───────────┘   └─────────────┘
//!                        │              │                              │
//!                        └──────────────┴──────────▶ Notify (ledger-deduped)
//! ```
//!
//! Everything runs on one thread, under one process-wide lock, with an
//! explicit [`RunState`] threaded through each stage.

pub mod catalog;
pub mod config;
pub mod deck;
pub mod error;
pub mod error_log;
pub mod intake;
pub mod lock;
pub mod notify;
pub mod pipeline;
pub mod preflight;
pub mod privilege;
pub mod processing;
pub mod reconcile;
pub mod region;
pub mod retention;
pub mod state;

pub use catalog::{CatalogDocument, CatalogEntry, CatalogSink, JsonFileSink};
pub use config::GraphplotConfig;
pub use deck::DeckIndex;
pub use error::{GraphplotError, Result};
pub use error_log::ErrorLog;
pub use intake::{FileRecord, FilenameValidator, RecordStage, RejectReason, NOT_IN_TARGET_DECK};
pub use lock::{try_lock_run, LockError, RunLockGuard};
pub use notify::{Channel, Deduper, Notification, Notifier, ReportKind, SpoolNotifier};
pub use pipeline::{execute, run_batch, Collaborators, RunSummary};
pub use processing::{DocumentumProcessor, ExternalProcessor, NoopProcessor};
pub use region::CountryIndex;
pub use state::{CommandState, RunState};
