//! Statement export archives and their filename-encoded date ranges.
//!
//! Exports are named `<start>-<end>-<account>-camt52v8Booked.<ext>` with
//! both dates as `YYYYMMDD`, e.g. `20250807-20250821-4619086-camt52v8Booked.ZIP`.
//! A name without a parseable date pair is not an error: it maps to the
//! sentinel date so it sorts last by recency and never covers a window.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Placeholder for archives whose filename carries no usable date range.
pub const SENTINEL_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1900, 1, 1) {
    Some(d) => d,
    None => panic!("sentinel date must be valid"),
};

/// Full archive filename, used when scanning a directory.
pub static ARCHIVE_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d{8})-(\d{8})-([^-]+)-camt52v8Booked\.[a-z0-9]+$")
        .expect("archive filename pattern")
});

static DATE_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{8})-(\d{8})").expect("date pair pattern"));

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Archive {
    pub filename: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Archive {
    pub fn new(filename: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        let (start_date, end_date) = if start_date <= end_date {
            (start_date, end_date)
        } else {
            (end_date, start_date)
        };
        Self {
            filename: filename.into(),
            start_date,
            end_date,
        }
    }

    /// Parse the date range out of an archive filename. Never fails.
    pub fn from_filename(filename: &str) -> Self {
        match parse_range(filename) {
            Some((start, end)) => Self::new(filename, start, end),
            None => {
                tracing::debug!(filename, "no date range in archive name, using sentinel");
                Self::new(filename, SENTINEL_DATE, SENTINEL_DATE)
            }
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.end_date == SENTINEL_DATE
    }

    /// Account id (third dash-separated field) for well-formed names.
    pub fn account_id(&self) -> Option<&str> {
        ARCHIVE_FILENAME
            .captures(&self.filename)
            .and_then(|c| c.get(3))
            .map(|m| m.as_str())
    }

    /// Inclusive length of the covered range in days.
    pub fn span_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

fn parse_range(filename: &str) -> Option<(NaiveDate, NaiveDate)> {
    let caps = DATE_PAIR.captures(filename)?;
    let start = NaiveDate::parse_from_str(&caps[1], "%Y%m%d").ok()?;
    let end = NaiveDate::parse_from_str(&caps[2], "%Y%m%d").ok()?;
    Some((start, end))
}

/// Build archives for a batch of filenames, keeping input order.
pub fn catalog<S: AsRef<str>>(filenames: &[S]) -> Vec<Archive> {
    filenames
        .iter()
        .map(|f| Archive::from_filename(f.as_ref()))
        .collect()
}
