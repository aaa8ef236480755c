//! Collapse payments that appear in both record families into one entry.
//!
//! Key construction, most specific first:
//! - tuition with a month: `student|tuition|month|ref` (ref falls back to id),
//!   so separate installments for one month stay separate;
//! - with a reference: `student|fee|day|ref`;
//! - otherwise `student|fee|day`. Two different payments of the same fee on
//!   the same day for one student merge under this key.
//!
//! On collision a collection entry replaces a transaction entry; any other
//! collision keeps the entry seen first.

use feeledger_core::{fee_names, CanonicalPayment, PaymentSource};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

pub fn dedup_key(p: &CanonicalPayment) -> String {
    if let Some(month) = p.month.as_deref().filter(|m| !m.is_empty()) {
        if fee_names::is_tuition(&p.fee_name) {
            let reference = if p.transaction_ref.is_empty() {
                p.id.as_str()
            } else {
                p.transaction_ref.as_str()
            };
            return format!("{}|tuition|{}|{}", p.student_id, month, reference);
        }
    }

    let day = p
        .effective_date()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    if p.transaction_ref.is_empty() {
        format!("{}|{}|{}", p.student_id, p.fee_name, day)
    } else {
        format!("{}|{}|{}|{}", p.student_id, p.fee_name, day, p.transaction_ref)
    }
}

fn replaces(existing: &CanonicalPayment, incoming: &CanonicalPayment) -> bool {
    existing.source == PaymentSource::Transaction && incoming.source == PaymentSource::Collection
}

/// Undated entries sort last.
fn by_effective_date(a: &CanonicalPayment, b: &CanonicalPayment) -> Ordering {
    match (a.effective_date(), b.effective_date()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Merge both families into one list sorted by due (else payment) date.
///
/// Insertion order is kept for entries on the same day, so the output is a
/// pure function of the input order.
pub fn deduplicate<I>(payments: I) -> Vec<CanonicalPayment>
where
    I: IntoIterator<Item = CanonicalPayment>,
{
    let mut kept: Vec<CanonicalPayment> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();

    for incoming in payments {
        let key = dedup_key(&incoming);
        match slots.get(&key).copied() {
            Some(i) => {
                if replaces(&kept[i], &incoming) {
                    debug!(
                        key = %key,
                        kept = %incoming.id,
                        dropped = %kept[i].id,
                        "collection entry supersedes ledger entry"
                    );
                    kept[i] = incoming;
                } else {
                    debug!(
                        key = %key,
                        kept = %kept[i].id,
                        dropped = %incoming.id,
                        "duplicate payment"
                    );
                }
            }
            None => {
                slots.insert(key, kept.len());
                kept.push(incoming);
            }
        }
    }

    kept.sort_by(by_effective_date);
    kept
}
