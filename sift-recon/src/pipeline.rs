//! Select archives, extract, match customers, merge.
//!
//! Statement extraction is a collaborator behind [`StatementExtractor`];
//! everything else is the pure sift-core machinery:
//! - `CoverageSelector` decides which archives to read
//! - extracted rows are tagged with their archive
//! - `CustomerMatcher` fills missing customer ids (the id is part of the fingerprint)
//! - duplicates from overlapping archives are dropped, newest bookings first

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sift_core::{
    Archive, CoverageSelector, CustomerMatcher, CustomerRecord, DedupReport, Selection,
    SelectionPolicy, Transaction, catalog, deduplicate_with_report, difference,
};

/// Turns one archive into transactions.
pub trait StatementExtractor {
    fn extract(&mut self, archive: &Archive) -> Result<Vec<Transaction>>;
}

impl<F> StatementExtractor for F
where
    F: FnMut(&Archive) -> Result<Vec<Transaction>>,
{
    fn extract(&mut self, archive: &Archive) -> Result<Vec<Transaction>> {
        self(archive)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub selection: Selection,
    /// Merged, matched and deduplicated; booking date descending
    pub transactions: Vec<Transaction>,
    pub dedup: DedupReport,
}

#[derive(Debug, Clone)]
pub struct Pipeline<E: StatementExtractor> {
    selector: CoverageSelector,
    matcher: CustomerMatcher,
    extractor: E,
}

impl<E: StatementExtractor> Pipeline<E> {
    pub fn new(policy: SelectionPolicy, matcher: CustomerMatcher, extractor: E) -> Self {
        Self {
            selector: CoverageSelector::new(policy),
            matcher,
            extractor,
        }
    }

    pub fn run(
        &mut self,
        archives: &[Archive],
        customers: &[CustomerRecord],
        today: NaiveDate,
    ) -> Result<PipelineOutput> {
        let selection = self.selector.select(archives, today);
        tracing::info!(
            selected = selection.archives.len(),
            candidates = archives.len(),
            complete = selection.is_complete(),
            "archives selected"
        );

        let mut batches = Vec::with_capacity(selection.archives.len());
        for archive in &selection.archives {
            let rows = self
                .extractor
                .extract(archive)
                .with_context(|| format!("extracting {}", archive.filename))?;
            let rows = tag_source(rows, &archive.filename);
            batches.push(self.matcher.assign_customer_ids(&rows, customers));
        }

        let (transactions, dedup) = merge_with_report(&batches);
        Ok(PipelineOutput {
            selection,
            transactions,
            dedup,
        })
    }
}

fn tag_source(rows: Vec<Transaction>, filename: &str) -> Vec<Transaction> {
    rows.into_iter()
        .map(|mut t| {
            if t.source_archive.is_none() {
                t.source_archive = Some(filename.to_string());
            }
            t
        })
        .collect()
}

/// Concatenate per-archive batches, drop duplicates, newest booking first.
pub fn merge_archives(batches: &[Vec<Transaction>]) -> Vec<Transaction> {
    merge_with_report(batches).0
}

fn merge_with_report(batches: &[Vec<Transaction>]) -> (Vec<Transaction>, DedupReport) {
    let all: Vec<Transaction> = batches.iter().flatten().cloned().collect();
    let (mut merged, report) = deduplicate_with_report(&all);
    merged.sort_by(|a, b| b.booking_date.cmp(&a.booking_date));
    (merged, report)
}

/// Transactions first seen in the latest archive.
#[derive(Debug, Clone, PartialEq)]
pub struct NewestBatch {
    pub archive: String,
    /// Archive compared against, if there was one
    pub previous: Option<String>,
    pub transactions: Vec<Transaction>,
}

/// Isolate what the newest archive adds relative to the one before it.
///
/// Archives are ranked by the end date in their filename (unparseable names
/// rank last). Transactions without a source archive are ignored.
pub fn isolate_newest(transactions: &[Transaction]) -> Option<NewestBatch> {
    let mut names: Vec<&str> = Vec::new();
    for name in transactions.iter().filter_map(|t| t.source_archive.as_deref()) {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    let mut archives = catalog(&names);
    archives.sort_by(|a, b| b.end_date.cmp(&a.end_date));

    let mut ranked = archives.into_iter();
    let newest = ranked.next()?.filename;
    let previous = ranked.next().map(|a| a.filename);

    let from = |name: &str| -> Vec<Transaction> {
        transactions
            .iter()
            .filter(|t| t.source_archive.as_deref() == Some(name))
            .cloned()
            .collect()
    };

    let newest_rows = from(&newest);
    let transactions = match &previous {
        Some(prev) => difference(&newest_rows, &from(prev)),
        None => newest_rows,
    };
    tracing::debug!(archive = %newest, new = transactions.len(), "newest archive isolated");

    Some(NewestBatch {
        archive: newest,
        previous,
        transactions,
    })
}
