pub mod collection;
pub mod fee_rules_csv;
pub mod transaction;

pub use collection::{normalize_collection, normalize_collections};
pub use fee_rules_csv::{parse_fee_rules_csv, parse_fee_rules_reader};
pub use transaction::{normalize_transaction, normalize_transactions};
