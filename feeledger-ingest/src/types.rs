use chrono::NaiveDate;
use feeledger_core::de::null_as_default;
use feeledger_core::time;
use serde::{Deserialize, Serialize};

/// Date as it appears in the document store: a string, epoch millis, or a
/// `{seconds, nanoseconds}` timestamp object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawDate {
    Text(String),
    Millis(i64),
    Timestamp {
        #[serde(alias = "_seconds")]
        seconds: i64,
        #[serde(default, alias = "_nanoseconds")]
        nanoseconds: u32,
    },
}

impl RawDate {
    pub fn day(&self) -> Option<NaiveDate> {
        match self {
            RawDate::Text(s) => time::parse_day(s),
            RawDate::Millis(ms) => time::day_from_unix_millis(*ms),
            RawDate::Timestamp { seconds, .. } => time::day_from_unix_seconds(*seconds),
        }
    }
}

impl From<&str> for RawDate {
    fn from(s: &str) -> Self {
        RawDate::Text(s.to_string())
    }
}

/// Amounts are usually numbers but older entry forms saved them as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(f64),
    Text(String),
}

impl RawAmount {
    pub fn value(&self) -> Option<f64> {
        match self {
            RawAmount::Number(n) => Some(*n),
            RawAmount::Text(s) => s.trim().replace(',', "").parse().ok(),
        }
    }
}

impl From<f64> for RawAmount {
    fn from(n: f64) -> Self {
        RawAmount::Number(n)
    }
}

pub(crate) fn amount_of(v: &Option<RawAmount>) -> Option<f64> {
    v.as_ref().and_then(RawAmount::value)
}

pub(crate) fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Fee-collection entry (record family A). Already payment-shaped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawCollectionRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default)]
    pub fee_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fee_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub student_id: String,
    #[serde(default)]
    pub amount: Option<RawAmount>,
    #[serde(default)]
    pub donation: Option<RawAmount>,
    #[serde(default)]
    pub payment_date: Option<RawDate>,
    #[serde(default)]
    pub due_date: Option<RawDate>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub transaction_ref: Option<String>,
    /// Set on tuition entries written alongside a monthly ledger entry
    #[serde(default)]
    pub month: Option<String>,
    #[serde(default)]
    pub school_id: Option<String>,
}

/// Generic ledger entry (record family B). Only `income` entries with a
/// fee category are payments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawTransactionRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default)]
    pub amount: Option<RawAmount>,
    #[serde(default)]
    pub paid_amount: Option<RawAmount>,
    #[serde(default)]
    pub donation: Option<RawAmount>,
    #[serde(default)]
    pub date: Option<RawDate>,
    #[serde(default)]
    pub due_date: Option<RawDate>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub voucher_number: Option<String>,
    #[serde(default)]
    pub month: Option<String>,
    /// Zero-based month (0 = January) written by the monthly tuition form
    #[serde(default)]
    pub month_index: Option<u32>,
    #[serde(default)]
    pub school_id: Option<String>,
}
