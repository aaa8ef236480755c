//! Fee-collection entries (family A) into canonical payments.
//!
//! These are already payment-shaped: resolve the student, fold the donation
//! into the total and tag the source.

use feeledger_core::{
    amount_parts, CanonicalPayment, IdentifierIndex, PaymentSource, PaymentStatus,
};
use tracing::debug;

use crate::types::{amount_of, non_empty, RawCollectionRecord};

/// Collection entries use either `paid` or the ledger's `completed`.
fn collection_status(raw: &str) -> PaymentStatus {
    let s = raw.trim();
    if s.eq_ignore_ascii_case("paid") || s.eq_ignore_ascii_case("completed") {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Pending
    }
}

/// `None` when the entry's student is unknown to this run.
pub fn normalize_collection(
    raw: &RawCollectionRecord,
    index: &IdentifierIndex,
) -> Option<CanonicalPayment> {
    let Some(student) = index.resolve(&raw.student_id) else {
        debug!(record = %raw.id, student = %raw.student_id, "collection entry for unknown student");
        return None;
    };

    let (amount, donation, total_amount) =
        amount_parts(amount_of(&raw.amount).unwrap_or(0.0), amount_of(&raw.donation));

    Some(CanonicalPayment {
        id: raw.id.clone(),
        fee_name: raw.fee_name.trim().to_string(),
        student_id: student.primary_id.clone(),
        class_name: student.class_id.clone(),
        amount,
        donation,
        total_amount,
        payment_date: raw.payment_date.as_ref().and_then(|d| d.day()),
        due_date: raw.due_date.as_ref().and_then(|d| d.day()),
        status: collection_status(&raw.status),
        payment_method: non_empty(&raw.payment_method).unwrap_or_default().to_string(),
        transaction_ref: non_empty(&raw.transaction_ref).unwrap_or_default().to_string(),
        month: non_empty(&raw.month).map(str::to_string),
        source: PaymentSource::Collection,
    })
}

pub fn normalize_collections(
    raws: &[RawCollectionRecord],
    index: &IdentifierIndex,
) -> Vec<CanonicalPayment> {
    raws.iter()
        .filter_map(|r| normalize_collection(r, index))
        .collect()
}
