//! Configuration for a graphplot run
//!
//! Loaded from a single TOML file. Optional keys carry serde defaults; paths
//! that are usually colocated with the error directory (lock file, ledgers,
//! mail spool) fall back to it when omitted.

use crate::error::{GraphplotError, Result};
use crate::notify::Channel;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphplotConfig {
    /// Command input subdirectories under `paths.input_dir`, in processing order.
    pub commands: Vec<String>,

    /// Regions to distribute into, in processing order.
    #[serde(default)]
    pub regions: Vec<String>,

    /// Allowed file extensions, without the leading dot.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Tag appended to the stem when a valid file is renamed.
    #[serde(default = "default_processed_tag")]
    pub processed_tag: String,

    /// Refuse to run unless the effective uid is 0.
    #[serde(default)]
    pub require_root: bool,

    pub paths: PathsConfig,

    #[serde(default)]
    pub mail: MailConfig,

    #[serde(default)]
    pub retention: RetentionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Filesystem layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Parent of the per-command input directories.
    pub input_dir: PathBuf,
    /// Error log, and default home of the lock file and ledgers.
    pub error_dir: PathBuf,
    /// Holds `<region>-country_list` files.
    pub list_dir: PathBuf,
    /// Holds `<country>_benums` files.
    pub benum_dir: PathBuf,
    /// Root of the `<region>/<country>/<YYYY>/<MM>` output tree.
    pub graphbase_dir: PathBuf,
    pub rejected_dir: PathBuf,
    /// Receives metadata sidecars after external processing.
    pub meta_dir: PathBuf,
    /// Valid-name files that never reached a region.
    pub quarantine_dir: PathBuf,
    /// Catalog documents.
    pub json_dir: PathBuf,
    pub target_deck: PathBuf,

    #[serde(default)]
    pub lock_file: Option<PathBuf>,
    #[serde(default)]
    pub invalid_name_ledger: Option<PathBuf>,
    #[serde(default)]
    pub not_in_deck_ledger: Option<PathBuf>,
    #[serde(default)]
    pub silently_failed_ledger: Option<PathBuf>,

    /// Documentum image copy target. Unset disables the copy.
    #[serde(default)]
    pub image_dir: Option<PathBuf>,
    /// Documentum metacard copy target. Unset disables the sidecar copy.
    #[serde(default)]
    pub metacard_dir: Option<PathBuf>,
}

/// Outbound notification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default = "default_mail_from")]
    pub from: String,
    /// Recipients of reject, silently-failed and quarantine reports.
    #[serde(default)]
    pub warn_to: Vec<String>,
    /// Recipients of not-in-deck reports.
    #[serde(default)]
    pub target_to: Vec<String>,
    /// Spool directory picked up by the mail transport.
    #[serde(default)]
    pub spool_dir: Option<PathBuf>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from: default_mail_from(),
            warn_to: Vec::new(),
            target_to: Vec::new(),
            spool_dir: None,
        }
    }
}

/// Age-based cleanup after each run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_input_days")]
    pub input_days: u32,
    #[serde(default = "default_rejected_days")]
    pub rejected_days: u32,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            input_days: default_input_days(),
            rejected_days: default_rejected_days(),
        }
    }
}

/// Tracing file output
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Rotated tracing log directory. Defaults to `paths.error_dir`.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub max_files: Option<usize>,
    #[serde(default)]
    pub max_file_size_mb: Option<u64>,
}

fn default_extensions() -> Vec<String> {
    vec!["tif".to_string(), "gif".to_string()]
}

fn default_processed_tag() -> String {
    "proc".to_string()
}

fn default_mail_from() -> String {
    "graphplot@localhost".to_string()
}

fn default_true() -> bool {
    true
}

fn default_input_days() -> u32 {
    9
}

fn default_rejected_days() -> u32 {
    60
}

pub const ERROR_LOG_NAME: &str = "graphplot_errors.log";
const LOCK_FILE_NAME: &str = "graphplot.lock";

impl GraphplotConfig {
    /// Load and validate configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GraphplotError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: GraphplotConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Semantic checks serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.commands.is_empty() {
            return Err(GraphplotError::Config("at least one command is required".into()));
        }
        let mut seen = HashSet::new();
        for cmd in &self.commands {
            if cmd.is_empty() || cmd.contains('/') || cmd.contains('\\') || cmd == ".." {
                return Err(GraphplotError::Config(format!("invalid command name '{}'", cmd)));
            }
            if !seen.insert(cmd.as_str()) {
                return Err(GraphplotError::Config(format!("duplicate command '{}'", cmd)));
            }
        }
        if self.extensions.is_empty() {
            return Err(GraphplotError::Config("at least one extension is required".into()));
        }
        if let Some(bad) = self
            .extensions
            .iter()
            .find(|e| e.is_empty() || !e.chars().all(|c| c.is_ascii_alphanumeric()))
        {
            return Err(GraphplotError::Config(format!("invalid extension '{}'", bad)));
        }
        if self.processed_tag.is_empty()
            || !self
                .processed_tag
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(GraphplotError::Config(format!(
                "invalid processed_tag '{}'",
                self.processed_tag
            )));
        }
        Ok(())
    }

    pub fn command_dir(&self, command: &str) -> PathBuf {
        self.paths.input_dir.join(command)
    }

    pub fn error_log_path(&self) -> PathBuf {
        self.paths.error_dir.join(ERROR_LOG_NAME)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.paths
            .lock_file
            .clone()
            .unwrap_or_else(|| self.paths.error_dir.join(LOCK_FILE_NAME))
    }

    pub fn ledger_path(&self, channel: Channel) -> PathBuf {
        let explicit = match channel {
            Channel::InvalidFilename => &self.paths.invalid_name_ledger,
            Channel::NotInDeck => &self.paths.not_in_deck_ledger,
            Channel::SilentlyFailed => &self.paths.silently_failed_ledger,
        };
        explicit
            .clone()
            .unwrap_or_else(|| self.paths.error_dir.join(channel.default_ledger_name()))
    }

    pub fn spool_dir(&self) -> PathBuf {
        self.mail
            .spool_dir
            .clone()
            .unwrap_or_else(|| self.paths.error_dir.join("outbox"))
    }

    pub fn log_dir(&self) -> PathBuf {
        self.logging
            .dir
            .clone()
            .unwrap_or_else(|| self.paths.error_dir.clone())
    }
}
