//! Shared fixtures for graphplot integration tests.
//!
//! [`Fixture`] lays out a complete directory tree under a `TempDir` and
//! builds a matching config. [`RecordingNotifier`] and [`RecordingCatalog`]
//! capture what a run would have sent.

#![allow(dead_code)]

use chrono::{DateTime, Local, TimeZone};
use graphplot::config::{LoggingConfig, MailConfig, PathsConfig, RetentionConfig};
use graphplot::{
    execute, CatalogDocument, CatalogSink, Collaborators, GraphplotConfig, GraphplotError,
    NoopProcessor, Notification, Notifier, ReportKind, Result, RunSummary,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const CMD_A: &str = "cmd_a";
pub const CMD_B: &str = "cmd_b";

/// 2023-06-01 12:00 local.
pub fn run_time() -> DateTime<Local> {
    Local
        .with_ymd_and_hms(2023, 6, 1, 12, 0, 0)
        .single()
        .expect("unambiguous local time")
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Vec<Notification>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn of_kind(&self, kind: ReportKind) -> Vec<&Notification> {
        self.sent.iter().filter(|n| n.kind == kind).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn send(&mut self, notification: &Notification) -> Result<()> {
        if self.fail {
            return Err(GraphplotError::Notify("transport down".into()));
        }
        self.sent.push(notification.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingCatalog {
    pub documents: Vec<CatalogDocument>,
}

impl CatalogSink for RecordingCatalog {
    fn publish(
        &mut self,
        document: &CatalogDocument,
        _run_started: chrono::NaiveDateTime,
    ) -> Result<Option<PathBuf>> {
        self.documents.push(document.clone());
        Ok(None)
    }
}

pub struct Fixture {
    pub temp: TempDir,
    pub config: GraphplotConfig,
}

impl Fixture {
    /// Two commands, one region, empty deck and reference lists.
    pub fn new() -> Self {
        let temp = TempDir::new().expect("temp dir");
        let root = temp.path();
        let paths = PathsConfig {
            input_dir: root.join("gp"),
            error_dir: root.join("err"),
            list_dir: root.join("lists"),
            benum_dir: root.join("benums"),
            graphbase_dir: root.join("web"),
            rejected_dir: root.join("rejected"),
            meta_dir: root.join("meta"),
            quarantine_dir: root.join("nonproc"),
            json_dir: root.join("json"),
            target_deck: root.join("lists").join("target_deck"),
            lock_file: None,
            invalid_name_ledger: None,
            not_in_deck_ledger: None,
            silently_failed_ledger: None,
            image_dir: None,
            metacard_dir: None,
        };
        let config = GraphplotConfig {
            commands: vec![CMD_A.to_string(), CMD_B.to_string()],
            regions: vec!["RegionA".to_string()],
            extensions: vec!["tif".to_string(), "gif".to_string()],
            processed_tag: "proc".to_string(),
            require_root: false,
            paths,
            mail: MailConfig {
                warn_to: vec!["ops@example.com".to_string()],
                target_to: vec!["targets@example.com".to_string()],
                ..Default::default()
            },
            retention: RetentionConfig::default(),
            logging: LoggingConfig::default(),
        };
        for cmd in &config.commands {
            fs::create_dir_all(config.command_dir(cmd)).expect("command dir");
        }
        fs::create_dir_all(&config.paths.list_dir).expect("list dir");
        fs::create_dir_all(&config.paths.benum_dir).expect("benum dir");
        fs::write(&config.paths.target_deck, "").expect("deck");
        Self { temp, config }
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn input(&self, cmd: &str) -> PathBuf {
        self.config.command_dir(cmd)
    }

    pub fn drop_file(&self, cmd: &str, name: &str, content: &[u8]) -> PathBuf {
        let path = self.input(cmd).join(name);
        fs::write(&path, content).expect("write input");
        path
    }

    pub fn set_deck(&self, entries: &[(&str, &str)]) {
        let body: String = entries
            .iter()
            .map(|(id, name)| format!("{}|{}\n", id, name))
            .collect();
        fs::write(&self.config.paths.target_deck, body).expect("deck");
    }

    pub fn set_countries(&self, region: &str, countries: &[&str]) {
        let path = self.config.paths.list_dir.join(format!("{}-country_list", region));
        fs::write(path, countries.join("\n")).expect("country list");
    }

    pub fn set_benums(&self, country: &str, identifiers: &[&str]) {
        let path = self.config.paths.benum_dir.join(format!("{}_benums", country));
        fs::write(path, identifiers.join("\n")).expect("benums");
    }

    pub fn run_with(
        &self,
        notifier: &mut RecordingNotifier,
        catalog: &mut RecordingCatalog,
    ) -> Result<RunSummary> {
        let mut processor = NoopProcessor;
        execute(
            &self.config,
            run_time(),
            Collaborators {
                processor: &mut processor,
                notifier,
                catalog,
            },
        )
    }

    /// One run with fresh recorders.
    pub fn run(&self) -> (RunSummary, RecordingNotifier, RecordingCatalog) {
        let mut notifier = RecordingNotifier::default();
        let mut catalog = RecordingCatalog::default();
        let summary = self.run_with(&mut notifier, &mut catalog).expect("run");
        (summary, notifier, catalog)
    }

    pub fn ledger_lines(&self, channel: graphplot::Channel) -> Vec<String> {
        fs::read_to_string(self.config.ledger_path(channel))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn error_log(&self) -> String {
        fs::read_to_string(self.config.error_log_path()).unwrap_or_default()
    }
}
