//! feeledger-recon: fee reconciliation engine.
//!
//! Merges fee-collection entries and ledger entries into one payment list per
//! student, labels each payment, and totals paid, due and expected fees.

pub mod aggregate;
pub mod dedup;
pub mod error;
pub mod expected;
pub mod feeds;
pub mod reconcile;
pub mod status;

pub use aggregate::{summarize_parent, ParentSummary, PaymentLine, ReconciledSummary, Totals};
pub use dedup::{dedup_key, deduplicate};
pub use error::{FeedError, FeedResult, ReconError};
pub use expected::{expected_fees, ExpectedFees, LegacyFeeStructure};
pub use feeds::{DirectoryFeed, FeedSource, HttpFeed, MemoryFeed};
pub use reconcile::{
    fetch_records, reconcile, reconcile_parent, reconcile_records, FetchedRecords,
    ReconcileContext,
};
pub use status::classify;
