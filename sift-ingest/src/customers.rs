//! Customer directory loader.
//!
//! The directory is a `;`-separated, `"`-quoted UTF-8 export with a header
//! row, usually written with a leading byte-order mark:
//!
//!   KdNr;Name1;Kurzname;Status
//!   10042;"Müller Bau GmbH";MUELLERBAU;aktiv

use anyhow::{Context, Result, bail};
use csv::StringRecord;
use serde::{Deserialize, Serialize};
use sift_core::CustomerRecord;
use std::fs;
use std::path::Path;

/// Header names to read each field from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryColumns {
    pub id: String,
    pub name: String,
    pub short_name: String,
    pub status: String,
}

impl Default for DirectoryColumns {
    fn default() -> Self {
        Self {
            id: "KdNr".to_string(),
            name: "Name1".to_string(),
            short_name: "Kurzname".to_string(),
            status: "Status".to_string(),
        }
    }
}

/// Spellings of the customer-number column seen in the wild, in priority order.
const ID_COLUMN_CANDIDATES: &[&str] = &[
    "KdNr", "Kdnr", "KDNR", "Kundennummer", "KundenNr", "Kunden-Nr", "Customer-Nr", "CustomerNr",
    "ID", "Nr",
];

/// Load and parse a directory file.
pub fn load_directory(path: impl AsRef<Path>, columns: &DirectoryColumns) -> Result<Vec<CustomerRecord>> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let text = String::from_utf8(bytes)
        .with_context(|| format!("{} is not valid UTF-8", path.display()))?;
    parse_directory(&text, columns).with_context(|| format!("parsing {}", path.display()))
}

/// Parse directory text. A leading BOM is ignored; rows without a name are skipped.
pub fn parse_directory(text: &str, columns: &DirectoryColumns) -> Result<Vec<CustomerRecord>> {
    let text = match text.strip_prefix('\u{feff}') {
        Some(rest) => {
            tracing::debug!("stripped byte-order mark from customer directory");
            rest
        }
        None => text,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b';')
        .quote(b'"')
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = rdr.headers()?.clone();
    let position = |name: &str| headers.iter().position(|h| h.trim() == name);

    let Some(name_idx) = position(&columns.name) else {
        bail!("customer directory has no '{}' column", columns.name);
    };
    let id_idx = position(&columns.id).or_else(|| detect_id_column(&headers));
    let short_idx = position(&columns.short_name);
    let status_idx = position(&columns.status);

    let field = |record: &StringRecord, idx: Option<usize>| -> String {
        idx.and_then(|i| record.get(i))
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };

    let mut customers = Vec::new();
    let mut skipped = 0usize;
    for result in rdr.records() {
        let record = result?;
        let name = field(&record, Some(name_idx));
        if name.is_empty() {
            skipped += 1;
            continue;
        }
        customers.push(CustomerRecord {
            id: field(&record, id_idx),
            name,
            short_name: field(&record, short_idx),
            status: field(&record, status_idx),
        });
    }

    if skipped > 0 {
        tracing::warn!(skipped, "directory rows without a name were skipped");
    }
    tracing::info!(count = customers.len(), "customer directory loaded");
    Ok(customers)
}

/// Find the customer-number column when the configured header is absent:
/// known spellings, then any header mentioning "nr" or "id", then the first column.
fn detect_id_column(headers: &StringRecord) -> Option<usize> {
    let trimmed: Vec<&str> = headers.iter().map(str::trim).collect();

    if let Some(i) = ID_COLUMN_CANDIDATES
        .iter()
        .find_map(|c| trimmed.iter().position(|h| h == c))
    {
        return Some(i);
    }

    trimmed
        .iter()
        .position(|h| {
            let h = h.to_lowercase();
            h.contains("nr") || h.contains("id")
        })
        .or(if trimmed.is_empty() { None } else { Some(0) })
}
