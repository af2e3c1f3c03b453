use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate};
use clap::Args;
use sift_core::{Archive, CoverageSelector, Selection, SelectionPolicy, time::parse_date};
use sift_ingest::{ProcessedMarker, scan_archives};
use std::path::{Path, PathBuf};

use crate::config::{Config, CoverageSection};

/// Which archives to read. Defaults to minimal coverage of `[coverage] months_back`.
#[derive(Args, Debug, Clone, Default)]
pub struct SelectArgs {
    /// Cover this many months back from today
    #[arg(long, conflicts_with_all = ["recent", "from"])]
    pub months_back: Option<u32>,

    /// Take the N archives ending last (default N: [coverage] recent)
    #[arg(long, num_args = 0..=1, conflicts_with = "from")]
    pub recent: Option<Option<usize>>,

    /// Cover an explicit window starting here (YYYY-MM-DD)
    #[arg(long, requires = "to")]
    pub from: Option<String>,

    #[arg(long, requires = "from")]
    pub to: Option<String>,
}

impl SelectArgs {
    pub fn policy(&self, coverage: &CoverageSection) -> Result<SelectionPolicy> {
        if let (Some(from), Some(to)) = (&self.from, &self.to) {
            return Ok(SelectionPolicy::Window {
                start: parse_date(from)?,
                end: parse_date(to)?,
            });
        }
        if let Some(n) = self.recent {
            return Ok(SelectionPolicy::TopRecent {
                n: n.unwrap_or(coverage.recent),
            });
        }
        Ok(SelectionPolicy::MinimalCoverage {
            months_back: self.months_back.unwrap_or(coverage.months_back),
        })
    }
}

pub fn run_archives(dir: &Path, select: &SelectArgs, cfg: &Config, today: NaiveDate) -> Result<()> {
    let files = scan_archives(dir)?;
    if files.is_empty() {
        println!("No camt52v8 archives in {}", dir.display());
        return Ok(());
    }
    let archives: Vec<Archive> = files.iter().map(|f| f.archive.clone()).collect();
    let selection = CoverageSelector::new(select.policy(&cfg.coverage)?).select(&archives, today);
    print_selection(&selection, archives.len());
    Ok(())
}

pub fn print_selection(selection: &Selection, candidates: usize) {
    println!(
        "Selected {} of {} archives ({:?})",
        selection.archives.len(),
        candidates,
        selection.policy
    );
    for a in &selection.archives {
        println!("{}", archive_line(a));
    }
    for gap in &selection.gaps {
        println!("  GAP  {} .. {} ({} days)", gap.from, gap.to, gap.days());
    }
    if !selection.is_empty() && selection.is_complete() {
        println!("Coverage complete.");
    }
}

fn archive_line(a: &Archive) -> String {
    format!("  {}  {} .. {} ({} days)", a.filename, a.start_date, a.end_date, a.span_days())
}

pub fn run_status(dir: &Path, touch: bool) -> Result<()> {
    let files = scan_archives(dir)?;
    let paths: Vec<PathBuf> = files.into_iter().map(|f| f.path).collect();
    let marker = ProcessedMarker::in_dir(dir);

    match marker.last_processed()? {
        Some(t) => println!(
            "Last processed: {}",
            DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M")
        ),
        None => println!("Never processed (no {})", marker.path().display()),
    }

    let newer = marker.newer_files(&paths)?;
    if newer.is_empty() {
        println!("Nothing new in {}", dir.display());
    } else {
        println!("{} new archive(s):", newer.len());
        for p in &newer {
            println!("  {}", p.file_name().map_or(p.display().to_string(), |n| n.to_string_lossy().into_owned()));
        }
    }

    if touch {
        marker.touch()?;
        println!("Marker updated: {}", marker.path().display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_defaults_from_config() {
        let cov = CoverageSection::default();
        assert_eq!(
            SelectArgs::default().policy(&cov).unwrap(),
            SelectionPolicy::MinimalCoverage { months_back: 3 }
        );

        let recent = SelectArgs {
            recent: Some(None),
            ..SelectArgs::default()
        };
        assert_eq!(recent.policy(&cov).unwrap(), SelectionPolicy::TopRecent { n: 2 });

        let recent = SelectArgs {
            recent: Some(Some(5)),
            ..SelectArgs::default()
        };
        assert_eq!(recent.policy(&cov).unwrap(), SelectionPolicy::TopRecent { n: 5 });
    }

    #[test]
    fn test_window_policy() {
        let args = SelectArgs {
            from: Some("2025-01-01".into()),
            to: Some("20250131".into()),
            ..SelectArgs::default()
        };
        assert_eq!(
            args.policy(&CoverageSection::default()).unwrap(),
            SelectionPolicy::Window {
                start: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            }
        );

        let bad = SelectArgs {
            from: Some("gestern".into()),
            to: Some("2025-01-31".into()),
            ..SelectArgs::default()
        };
        assert!(bad.policy(&CoverageSection::default()).is_err());
    }

    #[test]
    fn test_archive_line_shows_span() {
        let a = Archive::from_filename("20250801-20250815-4619086-camt52v8Booked.ZIP");
        assert_eq!(
            archive_line(&a),
            "  20250801-20250815-4619086-camt52v8Booked.ZIP  2025-08-01 .. 2025-08-15 (15 days)"
        );
    }

    #[test]
    fn test_status_touch_creates_marker() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("20250801-20250815-1-camt52v8Booked.ZIP"), b"").unwrap();
        run_status(dir.path(), true).unwrap();
        assert!(ProcessedMarker::in_dir(dir.path()).path().exists());
    }
}
