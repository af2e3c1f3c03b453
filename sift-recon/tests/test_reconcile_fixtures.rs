use anyhow::Result;
use chrono::NaiveDate;
use sift_core::{Archive, CustomerMatcher, MatcherConfig, SelectionPolicy, Transaction};
use sift_ingest::{DirectoryColumns, load_directory, read_transactions};
use sift_recon::{InvoicePattern, Pipeline, by_customer, isolate_newest, open_items};
use std::path::PathBuf;

const FIRST: &str = "20250801-20250815-4619086-camt52v8Booked.ZIP";
const SECOND: &str = "20250808-20250822-4619086-camt52v8Booked.ZIP";

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("fixtures")
}

fn extract(archive: &Archive) -> Result<Vec<Transaction>> {
    read_transactions(fixtures().join("statements").join(format!("{}.csv", archive.filename)))
}

fn matcher() -> CustomerMatcher {
    CustomerMatcher::new(MatcherConfig {
        active_status: "aktiv".to_string(),
        ..MatcherConfig::default()
    })
}

fn archives() -> Vec<Archive> {
    [SECOND, FIRST].iter().map(|n| Archive::from_filename(n)).collect()
}

/// Real-layout regression: BOM directory, two overlapping exports, full merge.
#[test]
fn test_merge_overlapping_exports() {
    let customers = load_directory(fixtures().join("customers.csv"), &DirectoryColumns::default()).unwrap();
    assert_eq!(customers.len(), 4, "nameless row is skipped");

    let today = NaiveDate::from_ymd_opt(2025, 8, 25).unwrap();
    let mut pipeline = Pipeline::new(SelectionPolicy::MinimalCoverage { months_back: 1 }, matcher(), extract);
    let out = pipeline.run(&archives(), &customers, today).unwrap();

    assert_eq!(out.selection.filenames(), vec![FIRST, SECOND]);
    assert!(out.selection.is_complete());
    assert_eq!(out.dedup.dropped, 1);

    let rows: Vec<(String, Option<&str>)> = out
        .transactions
        .iter()
        .map(|t| (t.booking_date.to_string(), t.customer_id.as_deref()))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("2025-08-20".to_string(), None),
            ("2025-08-18".to_string(), Some("10043")),
            ("2025-08-11".to_string(), Some("10045")),
            ("2025-08-04".to_string(), Some("10042")),
        ]
    );

    let weber = by_customer(&out.transactions, "10045");
    assert_eq!(weber.len(), 1);
    assert_eq!(weber[0].source_archive.as_deref(), Some(FIRST));

    let open = open_items(&out.transactions, &["202500466", "202500501.0"], &InvoicePattern::default());
    let payers: Vec<_> = open.iter().map(|t| t.counterparty_name.as_str()).collect();
    assert_eq!(payers, vec!["Unbekannt Zahler", "Schulz + Partner"]);
}

#[test]
fn test_newest_export_without_overlap() {
    let mut raw = Vec::new();
    for archive in archives() {
        let rows = extract(&archive).unwrap();
        raw.extend(rows.into_iter().map(|t| t.with_source_archive(archive.filename.clone())));
    }

    let batch = isolate_newest(&raw).unwrap();
    assert_eq!(batch.archive, SECOND);
    assert_eq!(batch.previous.as_deref(), Some(FIRST));
    let payers: Vec<_> = batch.transactions.iter().map(|t| t.counterparty_name.as_str()).collect();
    assert_eq!(payers, vec!["Schulz + Partner", "Unbekannt Zahler"]);
}
