//! sift-core: archive coverage selection, transaction dedup and fuzzy
//! customer matching for bank-statement exports.
//!
//! Everything here is pure and synchronous: functions borrow their inputs
//! and return new vectors, so independent batches can be processed in
//! parallel by the caller without locking.

pub mod archive;
pub mod coverage;
pub mod dedup;
pub mod matcher;
pub mod records;
pub mod strategies;
pub mod text;
pub mod time;

pub use archive::{Archive, ARCHIVE_FILENAME, SENTINEL_DATE, catalog};
pub use coverage::{
    CoverageGap, CoverageSelector, Selection, SelectionPolicy, select_coverage, select_recent,
};
pub use dedup::{DedupReport, Fingerprint, deduplicate, deduplicate_with_report, difference, fingerprint};
pub use matcher::{
    CustomerMatcher, FallbackHit, Lookup, MatchResult, MatcherConfig, fallback_search, match_score,
    relation_symbol, score, search,
};
pub use records::{CustomerRecord, Transaction, UNMATCHED_CUSTOMER};
pub use strategies::{DEFAULT_STRATEGIES, Strategy, flexible_search};
pub use text::{levenshtein, normalize, tokenize};
