//! CSV interchange for extracted transactions.
//!
//! Statement extraction writes one row per credit entry:
//!   booking_date,amount,currency,remittance_text,counterparty_name,customer_id,source_archive,additional_info
//!   2025-08-07,120.00,EUR,RE 202500466,Acme GmbH 80331 München,,20250807-20250821-4619086-camt52v8Booked.ZIP,GUTSCHRIFT
//!
//! Empty `customer_id`/`source_archive` cells, and the unmatched sentinel,
//! read back as "not set".

use anyhow::{Context, Result};
use sift_core::{Transaction, UNMATCHED_CUSTOMER};
use std::io::{Read, Write};
use std::path::Path;

pub fn read_transactions(path: impl AsRef<Path>) -> Result<Vec<Transaction>> {
    let path = path.as_ref();
    let rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    read_from(rdr).with_context(|| format!("parsing {}", path.display()))
}

pub fn read_transactions_from<R: Read>(reader: R) -> Result<Vec<Transaction>> {
    read_from(csv::ReaderBuilder::new().flexible(true).from_reader(reader))
}

fn read_from<R: Read>(mut rdr: csv::Reader<R>) -> Result<Vec<Transaction>> {
    let mut txns = Vec::new();
    for (i, result) in rdr.deserialize::<Transaction>().enumerate() {
        let mut t = match result {
            Ok(t) => t,
            Err(e) => {
                // header is line 1
                tracing::warn!(line = i + 2, error = %e, "skipping unparseable transaction row");
                continue;
            }
        };
        t.customer_id = clean(t.customer_id);
        t.source_archive = clean(t.source_archive);
        t.additional_info = clean(t.additional_info);
        txns.push(t);
    }
    Ok(txns)
}

fn clean(field: Option<String>) -> Option<String> {
    field
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && s != UNMATCHED_CUSTOMER.trim())
}

pub fn write_transactions(path: impl AsRef<Path>, txns: &[Transaction]) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path).with_context(|| format!("create {}", path.display()))?;
    write_transactions_to(file, txns).with_context(|| format!("write {}", path.display()))
}

pub fn write_transactions_to<W: Write>(writer: W, txns: &[Transaction]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for t in txns {
        wtr.serialize(t)?;
    }
    wtr.flush()?;
    Ok(())
}
