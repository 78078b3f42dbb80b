//! Ledger-backed deduplication across consecutive runs.

mod harness;

use graphplot::{
    execute, Channel, Collaborators, NoopProcessor, Notification, Notifier, ReportKind, Result,
};
use harness::{run_time, Fixture, RecordingCatalog, RecordingNotifier, CMD_A, CMD_B};
use std::path::PathBuf;

#[test]
fn unknown_identifier_is_notified_once_across_runs() {
    let fx = Fixture::new();
    fx.set_countries("RegionA", &["CountryX"]);
    fx.set_benums("CountryX", &["B12345"]);

    fx.drop_file(CMD_A, "20230115_1230Z_B12345_XY_ABC.tif", b"1");
    let (_, first, _) = fx.run();

    fx.drop_file(CMD_A, "20230116_1230Z_B12345_XY_ABC.tif", b"1");
    let (second_summary, second, _) = fx.run();

    assert_eq!(first.of_kind(ReportKind::NotInDeck).len(), 1);
    assert!(second.of_kind(ReportKind::NotInDeck).is_empty());
    assert_eq!(second_summary.processed, 1, "still processed");
    assert_eq!(fx.ledger_lines(Channel::NotInDeck), vec!["B12345"]);
}

#[test]
fn leftover_file_is_reported_once() {
    let fx = Fixture::new();
    fx.drop_file(CMD_A, "readme.txt", b"not imagery");

    let (first_summary, first, _) = fx.run();
    let (second_summary, second, _) = fx.run();

    assert_eq!(first_summary.silently_failed, 1);
    assert_eq!(second_summary.silently_failed, 1, "still detected");
    assert_eq!(first.of_kind(ReportKind::SilentlyFailed).len(), 1);
    assert!(second.of_kind(ReportKind::SilentlyFailed).is_empty());
    assert_eq!(fx.ledger_lines(Channel::SilentlyFailed), vec!["cmd_a/readme.txt"]);
}

#[test]
fn failed_delivery_is_retried_next_run() {
    let fx = Fixture::new();
    fx.drop_file(CMD_A, "readme.txt", b"x");

    let mut down = RecordingNotifier {
        fail: true,
        ..Default::default()
    };
    let mut catalog = RecordingCatalog::default();
    fx.run_with(&mut down, &mut catalog).unwrap();
    assert!(fx.ledger_lines(Channel::SilentlyFailed).is_empty());
    assert!(fx.error_log().contains("silently-failed notification not sent"));

    let (_, up, _) = fx.run();
    assert_eq!(up.of_kind(ReportKind::SilentlyFailed).len(), 1);
    assert_eq!(fx.ledger_lines(Channel::SilentlyFailed).len(), 1);
}

#[test]
fn rejected_names_are_keyed_by_command_path() {
    let fx = Fixture::new();
    fx.drop_file(CMD_A, "bad.tif", b"x");
    let (_, first, _) = fx.run();
    assert_eq!(first.of_kind(ReportKind::InvalidFilename).len(), 1);
    assert_eq!(fx.ledger_lines(Channel::InvalidFilename), vec!["cmd_a/bad.tif"]);

    // Same name dropped again: moved again, summarised again, not re-alerted.
    fx.drop_file(CMD_A, "bad.tif", b"x");
    let (summary, second, _) = fx.run();
    assert_eq!(summary.rejected, 1);
    assert!(second.of_kind(ReportKind::InvalidFilename).is_empty());
    assert_eq!(second.of_kind(ReportKind::RejectSummary).len(), 1);
    assert!(fx.config.paths.rejected_dir.join("bad.tif").is_file());
}

/// Delivers like [`RecordingNotifier`] and pulls a command directory out
/// from under the run on the first invalid-filename message.
struct DirRemovingNotifier {
    inner: RecordingNotifier,
    doomed: PathBuf,
}

impl Notifier for DirRemovingNotifier {
    fn send(&mut self, notification: &Notification) -> Result<()> {
        if notification.kind == ReportKind::InvalidFilename && self.doomed.exists() {
            std::fs::remove_dir_all(&self.doomed).unwrap();
        }
        self.inner.send(notification)
    }
}

#[test]
fn sent_keys_survive_a_failed_after_listing() {
    let fx = Fixture::new();
    fx.drop_file(CMD_A, "bad.tif", b"x");

    let mut notifier = DirRemovingNotifier {
        inner: RecordingNotifier::default(),
        doomed: fx.input(CMD_B),
    };
    let mut catalog = RecordingCatalog::default();
    let mut processor = NoopProcessor;
    let summary = execute(
        &fx.config,
        run_time(),
        Collaborators {
            processor: &mut processor,
            notifier: &mut notifier,
            catalog: &mut catalog,
        },
    )
    .unwrap();

    assert_eq!(summary.rejected, 1);
    assert_eq!(notifier.inner.of_kind(ReportKind::InvalidFilename).len(), 1);
    assert_eq!(fx.ledger_lines(Channel::InvalidFilename), vec!["cmd_a/bad.tif"]);
    assert!(fx.error_log().contains("silently failed check skipped"));
}
