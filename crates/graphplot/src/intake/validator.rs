//! Filename validation
//!
//! Every candidate gets exactly one verdict. The checks run in a fixed
//! order and the first failure wins:
//!
//! 1. size > 0
//! 2. grammar
//! 3. year in `[EARLIEST_YEAR, current_year]`
//! 4. date and time form a real timestamp

use super::types::{ParsedName, RejectReason};
use crate::error::Result;
use chrono::{Datelike, NaiveDateTime};
use regex::Regex;

/// Oldest year a graph plot can carry.
pub const EARLIEST_YEAR: i32 = 1965;

// `\d` would accept any Unicode decimal digit; names are ASCII only.
const DTG: &str = r"([0-9]{8})_([0-9]{4})Z_";

/// The five accepted BE number shapes.
const IDENTIFIER_FORMS: [&str; 5] = [
    r"[0-9]{4}[E\-][0-9]{5}",
    r"[0-9]{4}[A-Z]{2}[0-9]{3,4}",
    r"[0-9]{4}[A-Z]{3}[0-9]{3}",
    r"[BDL][0-9]{5}",
    r"DB[A-Z0-9]{4}",
];

const SUFFIX: &str = r"_(?:.*_)?[A-Z]{2}_[A-Z]{2,4}(?:_[A-Z])?";

/// Compiled filename grammar for one set of allowed extensions.
#[derive(Debug, Clone)]
pub struct FilenameValidator {
    pattern: Regex,
}

impl FilenameValidator {
    pub fn new(extensions: &[String]) -> Result<Self> {
        let exts: Vec<String> = extensions.iter().map(|e| regex::escape(e)).collect();
        let source = format!(
            "^{}({}){}\\.(?:{})$",
            DTG,
            IDENTIFIER_FORMS.join("|"),
            SUFFIX,
            exts.join("|")
        );
        Ok(Self {
            pattern: Regex::new(&source)?,
        })
    }

    pub fn validate(
        &self,
        name: &str,
        size: u64,
        current_year: i32,
    ) -> std::result::Result<ParsedName, RejectReason> {
        if size == 0 {
            return Err(RejectReason::ZeroFileSize);
        }

        let caps = self
            .pattern
            .captures(name)
            .ok_or(RejectReason::InvalidName)?;
        let date = &caps[1];
        let time = &caps[2];
        let identifier = &caps[3];

        let year: i32 = date
            .get(..4)
            .and_then(|y| y.parse().ok())
            .ok_or(RejectReason::InvalidName)?;
        if !(EARLIEST_YEAR..=current_year).contains(&year) {
            return Err(RejectReason::InvalidYear);
        }

        let stamp = format!("{}{}", date, time);
        let parsed = NaiveDateTime::parse_from_str(&stamp, "%Y%m%d%H%M")
            .map_err(|_| RejectReason::InvalidDatetime)?;

        Ok(ParsedName {
            date: date.to_string(),
            time: time.to_string(),
            year,
            month: parsed.month(),
            identifier: identifier.to_string(),
        })
    }
}
