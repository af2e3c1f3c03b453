//! Duplicate removal across overlapping statement archives.
//!
//! Consecutive exports overlap in time, so the same booking shows up in
//! more than one archive. A transaction's identity is its fingerprint:
//! `booking_date|amount|counterparty_name|trim(remittance_text)|customer_id`.
//! The source archive is not part of it.

use crate::records::Transaction;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(t: &Transaction) -> Self {
        Self(
            [
                t.booking_date.to_string().as_str(),
                t.amount.as_str(),
                t.counterparty_name.as_str(),
                t.remittance_text.trim(),
                t.customer_label(),
            ]
            .join("|"),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn fingerprint(t: &Transaction) -> Fingerprint {
    Fingerprint::of(t)
}

/// Counts from a deduplication pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupReport {
    pub kept: usize,
    pub dropped: usize,
}

/// Drop repeats, keeping the first occurrence and the input order.
pub fn deduplicate(transactions: &[Transaction]) -> Vec<Transaction> {
    deduplicate_with_report(transactions).0
}

pub fn deduplicate_with_report(transactions: &[Transaction]) -> (Vec<Transaction>, DedupReport) {
    let mut seen: HashSet<Fingerprint> = HashSet::with_capacity(transactions.len());
    let out: Vec<Transaction> = transactions
        .iter()
        .filter(|t| seen.insert(Fingerprint::of(t)))
        .cloned()
        .collect();

    let report = DedupReport {
        kept: out.len(),
        dropped: transactions.len() - out.len(),
    };
    if report.dropped > 0 {
        tracing::debug!(kept = report.kept, dropped = report.dropped, "duplicates removed");
    }
    (out, report)
}

/// Transactions of `newer` whose fingerprint does not occur in `older`.
pub fn difference(newer: &[Transaction], older: &[Transaction]) -> Vec<Transaction> {
    let known: HashSet<Fingerprint> = older.iter().map(Fingerprint::of).collect();
    newer
        .iter()
        .filter(|t| !known.contains(&Fingerprint::of(t)))
        .cloned()
        .collect()
}
