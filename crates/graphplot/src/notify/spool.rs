//! Mail spool adapter
//!
//! Writes each message as a small RFC-822 style text file. An external MTA
//! picks the directory up; delivery is not our concern.

use super::{Notification, Notifier};
use crate::error::{GraphplotError, Result};
use chrono::Local;
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug)]
pub struct SpoolNotifier {
    dir: PathBuf,
    seq: u32,
    written: Vec<PathBuf>,
}

impl SpoolNotifier {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            seq: 0,
            written: Vec::new(),
        }
    }

    /// Spool files produced so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn render(notification: &Notification) -> String {
        let mut out = String::new();
        out.push_str(&format!("From: {}\n", notification.from));
        out.push_str(&format!("To: {}\n", notification.to.join(", ")));
        out.push_str(&format!("Subject: {}\n", notification.subject));
        out.push_str(&format!("Date: {}\n", Local::now().to_rfc2822()));
        out.push('\n');
        out.push_str(&notification.body);
        out
    }
}

impl Notifier for SpoolNotifier {
    fn send(&mut self, notification: &Notification) -> Result<()> {
        if notification.to.is_empty() {
            return Err(GraphplotError::Notify(format!(
                "'{}' has no recipients",
                notification.subject
            )));
        }
        self.seq += 1;
        let name = format!(
            "{}_{}_{:04}_{}.eml",
            Local::now().format("%Y%m%d_%H%M%S"),
            std::process::id(),
            self.seq,
            notification.kind.slug()
        );
        let path = self.dir.join(name);
        fs::write(&path, Self::render(notification)).map_err(|e| {
            GraphplotError::Notify(format!("cannot spool {}: {}", path.display(), e))
        })?;
        info!("Spooled '{}' to {}", notification.subject, path.display());
        self.written.push(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::ReportKind;
    use tempfile::TempDir;

    fn message(to: Vec<String>) -> Notification {
        Notification {
            kind: ReportKind::RejectSummary,
            from: "gp@host".into(),
            to,
            subject: "GP:  Rejected files".into(),
            body: "Files rejected during this run:\ncmd/a.tif\n".into(),
        }
    }

    #[test]
    fn writes_headers_then_body() {
        let temp = TempDir::new().unwrap();
        let mut spool = SpoolNotifier::new(temp.path());
        spool
            .send(&message(vec!["a@x".into(), "b@x".into()]))
            .unwrap();

        assert_eq!(spool.written().len(), 1);
        let path = &spool.written()[0];
        assert!(path.to_string_lossy().ends_with("_0001_reject_summary.eml"));
        let text = fs::read_to_string(path).unwrap();
        assert!(text.starts_with("From: gp@host\nTo: a@x, b@x\nSubject: GP:  Rejected files\n"));
        assert!(text.ends_with("\n\nFiles rejected during this run:\ncmd/a.tif\n"));
    }

    #[test]
    fn missing_spool_dir_is_a_send_failure() {
        let temp = TempDir::new().unwrap();
        let mut spool = SpoolNotifier::new(temp.path().join("absent"));
        assert!(spool.send(&message(vec!["a@x".into()])).is_err());
    }
}
