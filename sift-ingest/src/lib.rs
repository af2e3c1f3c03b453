//! sift-ingest: file-system collaborators around sift-core (customer
//! directory, archive discovery, transaction CSV interchange, run marker).

pub mod archives;
pub mod customers;
pub mod marker;
pub mod transactions;

pub use archives::{ArchiveFile, paths_for, scan_archives};
pub use customers::{DirectoryColumns, load_directory, parse_directory};
pub use marker::ProcessedMarker;
pub use transactions::{read_transactions, read_transactions_from, write_transactions, write_transactions_to};
