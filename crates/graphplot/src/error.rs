//! Error types for graphplot intake

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::lock::LockError;

/// Graphplot error type
#[derive(Error, Debug)]
pub enum GraphplotError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Preflight failed: {}", .0.join("; "))]
    Preflight(Vec<String>),

    #[error("Must run as root (effective uid {0})")]
    NotPrivileged(u32),

    #[error("Failed to relocate {from} -> {to}: {source}")]
    Relocate {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Destination already exists: {0}")]
    DestinationExists(PathBuf),

    #[error("Reference file error: {0}")]
    Reference(String),

    #[error("Notification error: {0}")]
    Notify(String),

    #[error("Catalog error: {0}")]
    Catalog(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, GraphplotError>;
