//! sift-recon: merge statement archives into one transaction list and
//! reconcile it against invoices.

pub mod filters;
pub mod pipeline;
pub mod sums;

pub use filters::{InvoicePattern, by_customer, by_min_amount, by_period, digits_only, open_items};
pub use pipeline::{NewestBatch, Pipeline, PipelineOutput, StatementExtractor, isolate_newest, merge_archives};
pub use sums::{MAX_AMOUNTS, SumFinder, SumMatch};
