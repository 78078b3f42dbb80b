//! Preflight checks
//!
//! Every directory and file the run touches is described once in
//! [`Resource`] with the access it needs. [`check`] validates a single
//! resource; [`run`] checks the whole table and reports every failure at
//! once. Nothing in the input directories is touched before this passes.

use crate::config::GraphplotConfig;
use crate::error::{GraphplotError, Result};
use crate::notify::Channel;
use crate::privilege::has_access;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use tracing::{debug, info};

/// Required access for one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    /// Create when missing.
    pub create: bool,
    pub read: bool,
    pub write: bool,
    /// Skip entirely when not configured.
    pub optional: bool,
    pub is_dir: bool,
}

const fn dir(create: bool, write: bool) -> Access {
    Access {
        create,
        read: true,
        write,
        optional: false,
        is_dir: true,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    ErrorDir,
    ListDir,
    BenumDir,
    GraphbaseDir,
    InputDir,
    RejectedDir,
    MetaDir,
    QuarantineDir,
    JsonDir,
    SpoolDir,
    MetacardDir,
    ImageDir,
    TargetDeck,
    Ledger(Channel),
    CommandDir(String),
}

impl Resource {
    pub fn access(&self) -> Access {
        match self {
            Resource::ListDir | Resource::BenumDir => dir(false, false),
            Resource::InputDir | Resource::CommandDir(_) => dir(false, true),
            Resource::MetacardDir | Resource::ImageDir => Access {
                optional: true,
                ..dir(false, true)
            },
            Resource::TargetDeck => Access {
                create: false,
                read: true,
                write: false,
                optional: false,
                is_dir: false,
            },
            Resource::Ledger(_) => Access {
                create: true,
                read: true,
                write: true,
                optional: false,
                is_dir: false,
            },
            Resource::ErrorDir
            | Resource::GraphbaseDir
            | Resource::RejectedDir
            | Resource::MetaDir
            | Resource::QuarantineDir
            | Resource::JsonDir
            | Resource::SpoolDir => dir(true, true),
        }
    }

    pub fn path(&self, config: &GraphplotConfig) -> Option<PathBuf> {
        let p = &config.paths;
        match self {
            Resource::ErrorDir => Some(p.error_dir.clone()),
            Resource::ListDir => Some(p.list_dir.clone()),
            Resource::BenumDir => Some(p.benum_dir.clone()),
            Resource::GraphbaseDir => Some(p.graphbase_dir.clone()),
            Resource::InputDir => Some(p.input_dir.clone()),
            Resource::RejectedDir => Some(p.rejected_dir.clone()),
            Resource::MetaDir => Some(p.meta_dir.clone()),
            Resource::QuarantineDir => Some(p.quarantine_dir.clone()),
            Resource::JsonDir => Some(p.json_dir.clone()),
            Resource::SpoolDir => Some(config.spool_dir()),
            Resource::MetacardDir => p.metacard_dir.clone(),
            Resource::ImageDir => p.image_dir.clone(),
            Resource::TargetDeck => Some(p.target_deck.clone()),
            Resource::Ledger(channel) => Some(config.ledger_path(*channel)),
            Resource::CommandDir(cmd) => Some(config.command_dir(cmd)),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::ErrorDir => f.write_str("error_dir"),
            Resource::ListDir => f.write_str("list_dir"),
            Resource::BenumDir => f.write_str("benum_dir"),
            Resource::GraphbaseDir => f.write_str("graphbase_dir"),
            Resource::InputDir => f.write_str("input_dir"),
            Resource::RejectedDir => f.write_str("rejected_dir"),
            Resource::MetaDir => f.write_str("meta_dir"),
            Resource::QuarantineDir => f.write_str("quarantine_dir"),
            Resource::JsonDir => f.write_str("json_dir"),
            Resource::SpoolDir => f.write_str("mail spool"),
            Resource::MetacardDir => f.write_str("metacard_dir"),
            Resource::ImageDir => f.write_str("image_dir"),
            Resource::TargetDeck => f.write_str("target_deck"),
            Resource::Ledger(channel) => write!(f, "{} ledger", channel),
            Resource::CommandDir(cmd) => write!(f, "command '{}'", cmd),
        }
    }
}

/// Ordered so that parents come before anything created inside them.
pub fn resource_table(config: &GraphplotConfig) -> Vec<Resource> {
    let mut table = vec![
        Resource::ErrorDir,
        Resource::ListDir,
        Resource::BenumDir,
        Resource::GraphbaseDir,
        Resource::InputDir,
        Resource::RejectedDir,
        Resource::MetaDir,
        Resource::QuarantineDir,
        Resource::JsonDir,
        Resource::SpoolDir,
        Resource::MetacardDir,
        Resource::ImageDir,
        Resource::TargetDeck,
    ];
    table.extend(Channel::ALL.into_iter().map(Resource::Ledger));
    table.extend(config.commands.iter().cloned().map(Resource::CommandDir));
    table
}

/// Check one resource, creating it if its access allows.
pub fn check(resource: &Resource, config: &GraphplotConfig) -> std::result::Result<(), String> {
    let access = resource.access();
    let Some(path) = resource.path(config) else {
        if access.optional {
            return Ok(());
        }
        return Err(format!("{}: not configured", resource));
    };

    if !path.exists() {
        if !access.create {
            return Err(format!("{}: {} does not exist", resource, path.display()));
        }
        let created = if access.is_dir {
            fs::create_dir_all(&path)
        } else {
            OpenOptions::new().create(true).append(true).open(&path).map(|_| ())
        };
        created.map_err(|e| format!("{}: cannot create {}: {}", resource, path.display(), e))?;
        debug!("Created {} at {}", resource, path.display());
    }

    if access.is_dir != path.is_dir() {
        let want = if access.is_dir { "directory" } else { "file" };
        return Err(format!("{}: {} is not a {}", resource, path.display(), want));
    }
    if !has_access(&path, access.read, access.write) {
        let mode = match (access.read, access.write) {
            (true, true) => "read/write",
            (false, true) => "write",
            _ => "read",
        };
        return Err(format!("{}: no {} access to {}", resource, mode, path.display()));
    }
    Ok(())
}

/// Check the whole table. Any failure fails the run.
pub fn run(config: &GraphplotConfig) -> Result<usize> {
    let table = resource_table(config);
    let failures: Vec<String> = table.iter().filter_map(|r| check(r, config).err()).collect();
    if !failures.is_empty() {
        return Err(GraphplotError::Preflight(failures));
    }
    info!("Preflight passed ({} resources)", table.len());
    Ok(table.len())
}
