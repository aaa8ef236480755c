//! feeledger-ingest: raw fee record families and their normalizers into canonical payments.

pub mod types;
pub mod parsers;

pub use types::{RawAmount, RawCollectionRecord, RawDate, RawTransactionRecord};
pub use parsers::{
    normalize_collection, normalize_collections, normalize_transaction, normalize_transactions,
    parse_fee_rules_csv, parse_fee_rules_reader,
};
