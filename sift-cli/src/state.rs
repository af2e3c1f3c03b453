use anyhow::{Context, Result};
use chrono::NaiveDate;
use sift_core::time::{parse_date, today_in};
use std::fs;
use std::path::PathBuf;

pub fn sift_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".sift"))
}

pub fn ensure_sift_home() -> Result<PathBuf> {
    let dir = sift_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// `--today` if given, otherwise the current date in `timezone`.
pub fn resolve_today(explicit: Option<&str>, timezone: &str) -> Result<NaiveDate> {
    if let Some(s) = explicit {
        return parse_date(s).with_context(|| format!("--today {s:?}"));
    }
    today_in(timezone).context("coverage.timezone in config")
}
