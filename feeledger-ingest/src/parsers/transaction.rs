//! Ledger entries (family B) into canonical payments.
//!
//! Steps, in order: fee-income filter, student resolution, fee naming,
//! status, amounts (entries totalling zero are dropped), reference.

use feeledger_core::{
    amount_parts, fee_category, CanonicalPayment, IdentifierIndex, PaymentSource, PaymentStatus,
};
use tracing::debug;

use crate::types::{amount_of, non_empty, RawTransactionRecord};

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Month label: explicit `month`, else derived from the zero-based `monthIndex`.
fn month_label(raw: &RawTransactionRecord) -> Option<String> {
    if let Some(m) = non_empty(&raw.month) {
        return Some(m.to_string());
    }
    raw.month_index
        .and_then(|i| MONTHS.get(i as usize))
        .map(|m| m.to_string())
}

pub fn normalize_transaction(
    raw: &RawTransactionRecord,
    index: &IdentifierIndex,
) -> Option<CanonicalPayment> {
    if !raw.kind.trim().eq_ignore_ascii_case("income") {
        return None;
    }
    let category = fee_category(&raw.category)?;

    let Some(student) = index.resolve_any([
        raw.student_id.as_deref(),
        raw.uid.as_deref(),
        Some(raw.id.as_str()),
    ]) else {
        debug!(record = %raw.id, "ledger entry does not belong to a known student");
        return None;
    };

    let month = month_label(raw);
    let fee_name = category.fee_name_for(month.as_deref());

    let status = if raw.status.trim().eq_ignore_ascii_case("completed") {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Pending
    };

    let base = amount_of(&raw.paid_amount)
        .or_else(|| amount_of(&raw.amount))
        .unwrap_or(0.0);
    let donation = if category.includes_donation {
        amount_of(&raw.donation)
    } else {
        None
    };
    let (amount, donation, total_amount) = amount_parts(base, donation);
    if total_amount <= 0.0 {
        debug!(record = %raw.id, "ledger entry with no positive amount");
        return None;
    }

    let transaction_ref = non_empty(&raw.reference)
        .or_else(|| non_empty(&raw.voucher_number))
        .unwrap_or(raw.id.as_str())
        .to_string();

    Some(CanonicalPayment {
        id: raw.id.clone(),
        fee_name,
        student_id: student.primary_id.clone(),
        class_name: student.class_id.clone(),
        amount,
        donation,
        total_amount,
        payment_date: raw.date.as_ref().and_then(|d| d.day()),
        due_date: raw.due_date.as_ref().and_then(|d| d.day()),
        status,
        payment_method: non_empty(&raw.payment_method).unwrap_or_default().to_string(),
        transaction_ref,
        month,
        source: PaymentSource::Transaction,
    })
}

pub fn normalize_transactions(
    raws: &[RawTransactionRecord],
    index: &IdentifierIndex,
) -> Vec<CanonicalPayment> {
    raws.iter()
        .filter_map(|r| normalize_transaction(r, index))
        .collect()
}
