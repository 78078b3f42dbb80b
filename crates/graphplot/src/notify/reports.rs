//! Message composition for each report kind.

use super::{Notification, ReportKind};
use crate::config::MailConfig;

fn intro(kind: ReportKind) -> &'static str {
    match kind {
        ReportKind::InvalidFilename => "Graphplot file names that failed validation:",
        ReportKind::NotInDeck => "File names whose BE number is not in the target deck:",
        ReportKind::SilentlyFailed => "File names that were not processed:",
        ReportKind::ValidNotProcessed => {
            "Valid file names that could not be placed and were moved to quarantine:"
        }
        ReportKind::RejectSummary => "Files rejected during this run:",
    }
}

fn recipients(kind: ReportKind, mail: &MailConfig) -> Vec<String> {
    match kind {
        ReportKind::NotInDeck => mail.target_to.clone(),
        _ => mail.warn_to.clone(),
    }
}

/// Subject line, intro line, then one body line per entry.
pub fn compose(kind: ReportKind, mail: &MailConfig, lines: &[String]) -> Notification {
    let mut body = String::from(intro(kind));
    body.push('\n');
    for line in lines {
        body.push_str(line);
        body.push('\n');
    }
    Notification {
        kind,
        from: mail.from.clone(),
        to: recipients(kind, mail),
        subject: kind.subject().to_string(),
        body,
    }
}
