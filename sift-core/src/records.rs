//! Record types flowing through the pipeline: extracted transactions and
//! customer directory entries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Rendered in place of a customer id when no customer could be matched.
pub const UNMATCHED_CUSTOMER: &str = " - - - ";

/// A booked transaction as produced by statement extraction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub booking_date: NaiveDate,
    /// Decimal amount exactly as written in the statement (e.g. "1234.50")
    pub amount: String,
    pub currency: String,
    /// References and unstructured remittance information, space-joined
    pub remittance_text: String,
    /// Payer name, optionally followed by postcode and town
    pub counterparty_name: String,
    /// Customer number resolved by the matcher; `None` until matched
    pub customer_id: Option<String>,
    /// Archive filename the transaction was extracted from
    pub source_archive: Option<String>,
    /// Entry-level additional information (not part of the fingerprint)
    #[serde(default)]
    pub additional_info: Option<String>,
}

impl Transaction {
    /// Create a transaction with no customer id and no source archive.
    pub fn new(
        booking_date: NaiveDate,
        amount: impl Into<String>,
        currency: impl Into<String>,
        remittance_text: impl Into<String>,
        counterparty_name: impl Into<String>,
    ) -> Self {
        Self {
            booking_date,
            amount: amount.into(),
            currency: currency.into(),
            remittance_text: remittance_text.into(),
            counterparty_name: counterparty_name.into(),
            customer_id: None,
            source_archive: None,
            additional_info: None,
        }
    }

    pub fn with_customer_id(mut self, id: impl Into<String>) -> Self {
        self.customer_id = Some(id.into());
        self
    }

    pub fn with_source_archive(mut self, archive: impl Into<String>) -> Self {
        self.source_archive = Some(archive.into());
        self
    }

    /// Customer id, or the unmatched sentinel.
    pub fn customer_label(&self) -> &str {
        self.customer_id.as_deref().unwrap_or(UNMATCHED_CUSTOMER)
    }

    /// Parsed amount; `None` if the statement text is not a number.
    ///
    /// Accepts both `1234.50` and the German `1.234,50` notation.
    pub fn amount_value(&self) -> Option<f64> {
        let raw = self.amount.trim();
        if let Ok(v) = raw.parse::<f64>() {
            return Some(v);
        }
        if raw.contains(',') {
            return raw.replace('.', "").replace(',', ".").parse().ok();
        }
        None
    }
}

/// One row of the customer directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomerRecord {
    /// Customer number
    pub id: String,
    /// Full legal name
    pub name: String,
    pub short_name: String,
    pub status: String,
}

impl CustomerRecord {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        short_name: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            short_name: short_name.into(),
            status: status.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 7).unwrap()
    }

    #[test]
    fn test_customer_label_sentinel() {
        let t = Transaction::new(date(), "10.00", "EUR", "RE 202500466", "Acme GmbH");
        assert_eq!(t.customer_label(), UNMATCHED_CUSTOMER);
        let t = t.with_customer_id("10042");
        assert_eq!(t.customer_label(), "10042");
    }

    #[test]
    fn test_amount_value_formats() {
        let t = Transaction::new(date(), "1234.50", "EUR", "", "");
        assert_eq!(t.amount_value(), Some(1234.50));
        let t = Transaction::new(date(), "1.234,50", "EUR", "", "");
        assert_eq!(t.amount_value(), Some(1234.50));
        let t = Transaction::new(date(), "n/a", "EUR", "", "");
        assert_eq!(t.amount_value(), None);
    }

    #[test]
    fn test_transaction_json_roundtrip_keeps_none() {
        let t = Transaction::new(date(), "5.00", "EUR", "x", "y").with_source_archive("a.ZIP");
        let json = serde_json::to_string(&t).unwrap();
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
        assert!(back.customer_id.is_none());
    }
}
