//! Intake - listing, validating and moving candidate files
//!
//! The scanner lists command directories, the validator issues exactly one
//! verdict per candidate, and the relocation helpers perform every physical
//! move the run makes.

pub mod relocate;
pub mod scanner;
pub mod types;
pub mod validator;

pub use relocate::{copy_file, ensure_dir, move_file};
pub use scanner::{CommandListing, DirSnapshot, ScannedEntry, Scanner};
pub use types::{
    renamed_name, sidecar_candidates, FileLocation, FileRecord, ParsedName, RecordStage,
    RejectReason, NOT_IN_TARGET_DECK,
};
pub use validator::{FilenameValidator, EARLIEST_YEAR};
