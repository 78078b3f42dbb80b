//! Per-run state
//!
//! One [`CommandState`] per configured command, kept in configuration
//! order. Passed explicitly through every stage of the run.

use crate::intake::{FileRecord, RejectReason};
use serde::Serialize;

/// A rejected candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reject {
    pub name: String,
    pub reason: RejectReason,
}

/// A file queued for the not-in-deck notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotInDeck {
    pub name: String,
    pub identifier: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CommandState {
    pub command: String,
    /// Every regular file listed at scan time.
    pub all_files: Vec<String>,
    /// Files with an allowed extension, listing order.
    pub filtered_files: Vec<String>,
    pub valid: Vec<FileRecord>,
    pub rejects: Vec<Reject>,
    pub not_in_deck: Vec<NotInDeck>,
}

impl CommandState {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Default::default()
        }
    }

    pub fn reject(&mut self, name: impl Into<String>, reason: RejectReason) {
        self.rejects.push(Reject {
            name: name.into(),
            reason,
        });
    }

    pub fn queue_not_in_deck(&mut self, name: &str, identifier: &str) {
        self.not_in_deck.push(NotInDeck {
            name: name.to_string(),
            identifier: identifier.to_string(),
        });
    }

    /// Whether `name` became a tracked record this run.
    pub fn tracks(&self, name: &str) -> bool {
        self.valid.iter().any(|r| r.fname == name)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunState {
    pub commands: Vec<CommandState>,
}

impl RunState {
    pub fn new<'a, I>(commands: I) -> Self
    where
        I: IntoIterator<Item = &'a String>,
    {
        Self {
            commands: commands.into_iter().map(CommandState::new).collect(),
        }
    }

    pub fn command(&self, command: &str) -> Option<&CommandState> {
        self.commands.iter().find(|c| c.command == command)
    }

    pub fn command_mut(&mut self, command: &str) -> Option<&mut CommandState> {
        self.commands.iter_mut().find(|c| c.command == command)
    }

    pub fn records(&self) -> impl Iterator<Item = &FileRecord> {
        self.commands.iter().flat_map(|c| c.valid.iter())
    }

    pub fn records_mut(&mut self) -> impl Iterator<Item = &mut FileRecord> {
        self.commands.iter_mut().flat_map(|c| c.valid.iter_mut())
    }

    pub fn scanned_count(&self) -> usize {
        self.commands.iter().map(|c| c.filtered_files.len()).sum()
    }

    pub fn reject_count(&self) -> usize {
        self.commands.iter().map(|c| c.rejects.len()).sum()
    }

    pub fn valid_count(&self) -> usize {
        self.commands.iter().map(|c| c.valid.len()).sum()
    }

    pub fn processed_count(&self) -> usize {
        self.records().filter(|r| r.is_processed()).count()
    }
}
