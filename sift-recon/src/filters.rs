//! Transaction filters for the reconciliation report.
//!
//! All filters borrow their input and return the kept rows in input order.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use regex::Regex;
use sift_core::Transaction;
use std::collections::HashSet;

pub const DEFAULT_INVOICE_PATTERN: &str = r"(202\d{6})";

/// Bookings with `from <= booking_date <= to`.
pub fn by_period(transactions: &[Transaction], from: NaiveDate, to: NaiveDate) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|t| t.booking_date >= from && t.booking_date <= to)
        .cloned()
        .collect()
}

/// Bookings of at least `min`. Unreadable amounts count as zero.
pub fn by_min_amount(transactions: &[Transaction], min: f64) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|t| t.amount_value().unwrap_or(0.0) >= min)
        .cloned()
        .collect()
}

pub fn by_customer(transactions: &[Transaction], customer_id: &str) -> Vec<Transaction> {
    let wanted = customer_id.trim();
    transactions
        .iter()
        .filter(|t| t.customer_id.as_deref().map(str::trim) == Some(wanted))
        .cloned()
        .collect()
}

/// Finds invoice numbers in remittance text.
#[derive(Debug, Clone)]
pub struct InvoicePattern {
    re: Regex,
}

impl InvoicePattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let re = Regex::new(pattern).with_context(|| format!("invalid invoice pattern {pattern:?}"))?;
        Ok(Self { re })
    }

    /// First invoice number in `text`: capture group 1 if present, else the whole match.
    pub fn find(&self, text: &str) -> Option<String> {
        let caps = self.re.captures(text)?;
        caps.get(1)
            .or_else(|| caps.get(0))
            .map(|m| m.as_str().to_string())
    }
}

impl Default for InvoicePattern {
    fn default() -> Self {
        Self {
            re: Regex::new(DEFAULT_INVOICE_PATTERN).expect("default invoice pattern compiles"),
        }
    }
}

/// Comparable form of an invoice reference: ASCII digits only.
/// Spreadsheet exports write numbers as `202500466.0`, so a zero fraction is dropped first.
pub fn digits_only(reference: &str) -> String {
    let s = reference.trim();
    let s = match s.split_once('.') {
        Some((int, frac)) if !frac.is_empty() && frac.chars().all(|c| c == '0') => int,
        _ => s,
    };
    s.chars().filter(char::is_ascii_digit).collect()
}

/// Credits not yet booked against a known invoice: either no invoice
/// number in the remittance text, or a number missing from `known`.
pub fn open_items<S: AsRef<str>>(
    transactions: &[Transaction],
    known: &[S],
    pattern: &InvoicePattern,
) -> Vec<Transaction> {
    let known: HashSet<String> = known
        .iter()
        .map(|k| digits_only(k.as_ref()))
        .filter(|k| !k.is_empty())
        .collect();

    let open: Vec<Transaction> = transactions
        .iter()
        .filter(|t| match pattern.find(&t.remittance_text) {
            Some(invoice) => !known.contains(&digits_only(&invoice)),
            None => true,
        })
        .cloned()
        .collect();
    tracing::debug!(known = known.len(), open = open.len(), total = transactions.len(), "open items");
    open
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, day).unwrap()
    }

    fn sample() -> Vec<Transaction> {
        vec![
            Transaction::new(d(8, 1), "120.00", "EUR", "RE 202500466 danke", "Acme").with_customer_id("10042"),
            Transaction::new(d(8, 5), "1.234,50", "EUR", "Rechnung 202500999", "Beta"),
            Transaction::new(d(8, 9), "15.00", "EUR", "Mitgliedsbeitrag", "Gamma").with_customer_id("7"),
            Transaction::new(d(8, 12), "n/a", "EUR", "RG202500472", "Delta"),
        ]
    }

    fn payers(txns: &[Transaction]) -> Vec<&str> {
        txns.iter().map(|t| t.counterparty_name.as_str()).collect()
    }

    #[test]
    fn test_by_period_is_inclusive() {
        let txns = sample();
        assert_eq!(payers(&by_period(&txns, d(8, 5), d(8, 9))), vec!["Beta", "Gamma"]);
        assert!(by_period(&txns, d(9, 1), d(9, 30)).is_empty());
    }

    #[test]
    fn test_by_min_amount_handles_german_format() {
        let txns = sample();
        assert_eq!(payers(&by_min_amount(&txns, 100.0)), vec!["Acme", "Beta"]);
        assert_eq!(by_min_amount(&txns, 0.0).len(), 4);
    }

    #[test]
    fn test_by_customer() {
        let txns = sample();
        assert_eq!(payers(&by_customer(&txns, " 7 ")), vec!["Gamma"]);
        assert!(by_customer(&txns, "999").is_empty());
    }

    #[test]
    fn test_invoice_pattern() {
        let p = InvoicePattern::default();
        assert_eq!(p.find("RE 202500466 danke").as_deref(), Some("202500466"));
        assert_eq!(p.find("RG202500472").as_deref(), Some("202500472"));
        assert_eq!(p.find("Mitgliedsbeitrag"), None);

        let no_group = InvoicePattern::new(r"INV-\d+").unwrap();
        assert_eq!(no_group.find("paid INV-42 today").as_deref(), Some("INV-42"));
        assert!(InvoicePattern::new("(unclosed").is_err());
    }

    #[test]
    fn test_digits_only() {
        assert_eq!(digits_only(" 202500466.0 "), "202500466");
        assert_eq!(digits_only("RE-2025/00466"), "202500466");
        assert_eq!(digits_only("12.5"), "125");
        assert_eq!(digits_only("abc"), "");
    }

    #[test]
    fn test_open_items_keeps_unknown_and_unnumbered() {
        let txns = sample();
        let known = ["202500466.0", "202500472", ""];
        let open = open_items(&txns, &known, &InvoicePattern::default());
        assert_eq!(payers(&open), vec!["Beta", "Gamma"]);
    }

    #[test]
    fn test_open_items_with_nothing_known() {
        let txns = sample();
        let open = open_items::<&str>(&txns, &[], &InvoicePattern::default());
        assert_eq!(open.len(), txns.len());
    }
}
