//! Archive selection: which exports to read for a reporting window.
//!
//! One selector, parameterised by a [`SelectionPolicy`]:
//! - `MinimalCoverage`: fewest archives spanning `[today - N months, latest end]`
//! - `Window`: fewest archives spanning an explicit `[start, end]`
//! - `TopRecent`: the N archives with the latest end dates (no gap guarantee)
//!
//! Coverage uses the classic greedy interval cover:
//! - sort by (start ASC, end DESC)
//! - among archives starting at or before the frontier, take the one reaching furthest
//! - advance the frontier to its end, repeat until the target end is reached
//!
//! When nothing starts at or before the frontier the missing days are
//! recorded as a [`CoverageGap`] and selection resumes at the next archive,
//! so a gapped result is always distinguishable from a complete one.

use crate::archive::Archive;
use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionPolicy {
    MinimalCoverage { months_back: u32 },
    Window { start: NaiveDate, end: NaiveDate },
    TopRecent { n: usize },
}

/// Days inside the target range that no selected archive covers (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageGap {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl CoverageGap {
    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub policy: SelectionPolicy,
    /// Selected archives in selection order
    pub archives: Vec<Archive>,
    /// Uncovered stretches; always empty for `TopRecent`
    pub gaps: Vec<CoverageGap>,
}

impl Selection {
    fn empty(policy: SelectionPolicy) -> Self {
        Self {
            policy,
            archives: Vec::new(),
            gaps: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.gaps.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.archives.is_empty()
    }

    pub fn filenames(&self) -> Vec<&str> {
        self.archives.iter().map(|a| a.filename.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageSelector {
    policy: SelectionPolicy,
}

impl CoverageSelector {
    pub fn new(policy: SelectionPolicy) -> Self {
        Self { policy }
    }

    /// Run the policy. `today` anchors `MinimalCoverage`; other policies ignore it.
    pub fn select(&self, archives: &[Archive], today: NaiveDate) -> Selection {
        match self.policy {
            SelectionPolicy::TopRecent { n } => Selection {
                policy: self.policy,
                archives: top_recent(archives, n),
                gaps: Vec::new(),
            },
            SelectionPolicy::MinimalCoverage { months_back } => {
                let cutoff = months_cutoff(today, months_back);
                let survivors = ending_on_or_after(archives, cutoff);
                let Some(target_end) = survivors.iter().map(|a| a.end_date).max() else {
                    return Selection::empty(self.policy);
                };
                tracing::debug!(%cutoff, %target_end, survivors = survivors.len(), "minimal coverage");
                self.greedy(survivors, cutoff, target_end)
            }
            SelectionPolicy::Window { start, end } => {
                let survivors: Vec<&Archive> = archives
                    .iter()
                    .filter(|a| a.end_date >= start && a.start_date <= end)
                    .collect();
                let Some(max_end) = survivors.iter().map(|a| a.end_date).max() else {
                    return Selection::empty(self.policy);
                };
                self.greedy(survivors, start, max_end.min(end))
            }
        }
    }

    fn greedy(&self, mut survivors: Vec<&Archive>, floor: NaiveDate, target_end: NaiveDate) -> Selection {
        let mut out = Selection::empty(self.policy);
        let Some(min_start) = survivors.iter().map(|a| a.start_date).min() else {
            return out;
        };

        survivors.sort_by(|a, b| {
            a.start_date
                .cmp(&b.start_date)
                .then_with(|| b.end_date.cmp(&a.end_date))
        });

        let mut frontier = floor.max(min_start);

        while frontier < target_end {
            // best = furthest-reaching archive starting at or before the frontier
            let mut best: Option<&Archive> = None;
            for a in survivors.iter().take_while(|a| a.start_date <= frontier) {
                if a.end_date > frontier && best.is_none_or(|b| a.end_date > b.end_date) {
                    best = Some(a);
                }
            }

            if let Some(a) = best {
                out.archives.push(a.clone());
                frontier = a.end_date;
                continue;
            }

            // Gap: resume at the earliest archive that reaches past the frontier.
            let Some(next) = survivors
                .iter()
                .find(|a| a.start_date > frontier && a.end_date > frontier)
            else {
                break;
            };

            let first_missing = frontier + Days::new(1);
            if next.start_date > first_missing {
                let gap = CoverageGap {
                    from: first_missing,
                    to: next.start_date - Days::new(1),
                };
                tracing::warn!(from = %gap.from, to = %gap.to, "coverage gap between archives");
                out.gaps.push(gap);
            }
            // Moves the frontier strictly forward; the next round picks `next` or better.
            frontier = next.start_date;
        }

        out
    }
}

/// `today` minus whole calendar months; a day past the month's end clamps to its last day.
fn months_cutoff(today: NaiveDate, months_back: u32) -> NaiveDate {
    today
        .checked_sub_months(Months::new(months_back))
        .unwrap_or(NaiveDate::MIN)
}

fn ending_on_or_after(archives: &[Archive], cutoff: NaiveDate) -> Vec<&Archive> {
    archives.iter().filter(|a| a.end_date >= cutoff).collect()
}

fn top_recent(archives: &[Archive], n: usize) -> Vec<Archive> {
    let mut sorted: Vec<&Archive> = archives.iter().collect();
    sorted.sort_by(|a, b| b.end_date.cmp(&a.end_date));
    sorted.into_iter().take(n).cloned().collect()
}

/// Fewest archives covering the last `months_back` months up to the latest export.
pub fn select_coverage(archives: &[Archive], months_back: u32, today: NaiveDate) -> Vec<Archive> {
    CoverageSelector::new(SelectionPolicy::MinimalCoverage { months_back })
        .select(archives, today)
        .archives
}

/// The `n` archives with the latest end dates, newest first.
pub fn select_recent(archives: &[Archive], n: usize) -> Vec<Archive> {
    top_recent(archives, n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::SENTINEL_DATE;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn arc(name: &str, start: NaiveDate, end: NaiveDate) -> Archive {
        Archive::new(name, start, end)
    }

    #[test]
    fn excludes_strictly_contained_archive() {
        let today = d(2025, 9, 30);
        let archives = vec![
            arc("a", d(2025, 6, 1), d(2025, 8, 15)),
            arc("inner", d(2025, 7, 1), d(2025, 8, 1)),
            arc("b", d(2025, 8, 10), d(2025, 9, 30)),
        ];
        let picked = select_coverage(&archives, 3, today);
        let names: Vec<_> = picked.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn gap_returns_both_archives_and_reports_missing_days() {
        let archives = vec![
            arc("late", d(2025, 1, 15), d(2025, 1, 31)),
            arc("early", d(2025, 1, 1), d(2025, 1, 10)),
        ];
        let sel = CoverageSelector::new(SelectionPolicy::Window {
            start: d(2025, 1, 1),
            end: d(2025, 1, 31),
        })
        .select(&archives, d(2025, 2, 1));

        assert_eq!(sel.filenames(), vec!["early", "late"]);
        assert!(!sel.is_complete());
        assert_eq!(sel.gaps, vec![CoverageGap { from: d(2025, 1, 11), to: d(2025, 1, 14) }]);
        assert_eq!(sel.gaps[0].days(), 4);
    }

    #[test]
    fn adjacent_archives_have_no_gap() {
        let archives = vec![
            arc("first", d(2025, 1, 1), d(2025, 1, 15)),
            arc("second", d(2025, 1, 16), d(2025, 1, 31)),
        ];
        let sel = CoverageSelector::new(SelectionPolicy::Window {
            start: d(2025, 1, 1),
            end: d(2025, 1, 31),
        })
        .select(&archives, d(2025, 2, 1));
        assert_eq!(sel.filenames(), vec!["first", "second"]);
        assert!(sel.is_complete());
    }

    #[test]
    fn overlapping_chain_picks_furthest_reach() {
        let today = d(2025, 8, 31);
        let archives = vec![
            arc("0717", d(2025, 7, 17), d(2025, 7, 31)),
            arc("0724", d(2025, 7, 24), d(2025, 8, 7)),
            arc("0801", d(2025, 8, 1), d(2025, 8, 14)),
            arc("0807", d(2025, 8, 7), d(2025, 8, 21)),
            arc("0815", d(2025, 8, 15), d(2025, 8, 29)),
        ];
        // cutoff 2025-07-31 falls inside "0717"/"0724"
        let sel = CoverageSelector::new(SelectionPolicy::MinimalCoverage { months_back: 1 })
            .select(&archives, today);
        assert_eq!(sel.filenames(), vec!["0724", "0807", "0815"]);
        assert!(sel.is_complete());
    }

    #[test]
    fn old_and_sentinel_archives_are_discarded() {
        let today = d(2025, 9, 30);
        let archives = vec![
            arc("old", d(2024, 1, 1), d(2024, 1, 31)),
            Archive::from_filename("garbage.zip"),
        ];
        assert!(select_coverage(&archives, 3, today).is_empty());
        assert!(select_coverage(&[], 3, today).is_empty());
        assert_eq!(archives[1].end_date, SENTINEL_DATE);
    }

    #[test]
    fn frontier_starts_at_cutoff_not_earliest_archive() {
        let today = d(2025, 9, 30);
        let archives = vec![
            arc("long-old", d(2025, 1, 1), d(2025, 7, 10)),
            arc("mid", d(2025, 6, 25), d(2025, 8, 31)),
            arc("new", d(2025, 8, 20), d(2025, 9, 30)),
        ];
        // cutoff 2025-06-30: "long-old" reaches it but "mid" reaches further
        let picked = select_coverage(&archives, 3, today);
        let names: Vec<_> = picked.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(names, vec!["mid", "new"]);
    }

    #[test]
    fn month_cutoff_clamps_to_month_end() {
        let cutoff = months_cutoff(d(2025, 3, 31), 1);
        assert_eq!(cutoff, d(2025, 2, 28));
        assert_eq!(months_cutoff(d(2024, 3, 31), 1), d(2024, 2, 29));

        let archives = vec![
            arc("ends-0227", d(2025, 2, 13), d(2025, 2, 27)),
            arc("ends-0228", d(2025, 2, 14), d(2025, 2, 28)),
            arc("march", d(2025, 2, 20), d(2025, 3, 31)),
        ];
        let kept: Vec<_> = ending_on_or_after(&archives, cutoff)
            .iter()
            .map(|a| a.filename.as_str())
            .collect();
        assert_eq!(kept, vec!["ends-0228", "march"]);

        let sel = CoverageSelector::new(SelectionPolicy::MinimalCoverage { months_back: 1 })
            .select(&archives, d(2025, 3, 31));
        assert_eq!(sel.filenames(), vec!["march"]);
        assert!(sel.is_complete());
    }

    #[test]
    fn top_recent_orders_newest_first() {
        let archives = vec![
            arc("a", d(2025, 1, 1), d(2025, 1, 15)),
            Archive::from_filename("broken"),
            arc("c", d(2025, 2, 1), d(2025, 2, 15)),
            arc("b", d(2025, 1, 16), d(2025, 1, 31)),
        ];
        let picked = select_recent(&archives, 2);
        let names: Vec<_> = picked.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(names, vec!["c", "b"]);

        let all = select_recent(&archives, 10);
        assert_eq!(all.last().unwrap().filename, "broken");
    }

    #[test]
    fn window_caps_target_at_window_end() {
        let archives = vec![
            arc("a", d(2025, 1, 1), d(2025, 1, 20)),
            arc("b", d(2025, 1, 10), d(2025, 2, 28)),
            arc("c", d(2025, 3, 1), d(2025, 3, 31)),
        ];
        let sel = CoverageSelector::new(SelectionPolicy::Window {
            start: d(2025, 1, 5),
            end: d(2025, 1, 31),
        })
        .select(&archives, d(2025, 4, 1));
        assert_eq!(sel.filenames(), vec!["a", "b"]);
        assert!(sel.is_complete());
    }
}
