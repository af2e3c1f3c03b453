//! Time utilities: the reporting "today" in the bookkeeping timezone.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Calendar date of `now` in an IANA timezone like "Europe/Berlin".
pub fn date_in(now: DateTime<Utc>, tz: &str) -> Result<NaiveDate> {
    let tz: Tz = tz
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))?;
    Ok(now.with_timezone(&tz).date_naive())
}

/// Today's date in an IANA timezone.
pub fn today_in(tz: &str) -> Result<NaiveDate> {
    date_in(Utc::now(), tz)
}

/// Parse `YYYY-MM-DD` or `YYYYMMDD`.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y%m%d"))
        .map_err(|e| anyhow::anyhow!("invalid date '{s}': {e}"))
}
