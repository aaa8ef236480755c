//! Paid / pending / overdue labels. Derived for display; `status` is untouched.

use chrono::NaiveDate;
use feeledger_core::{CanonicalPayment, DisplayStatus};

/// Unpaid with a due day strictly before today.
pub fn is_overdue(p: &CanonicalPayment, today: NaiveDate) -> bool {
    !p.is_paid() && p.due_date.is_some_and(|due| due < today)
}

pub fn classify(p: &CanonicalPayment, today: NaiveDate) -> DisplayStatus {
    if p.is_paid() {
        DisplayStatus::Paid
    } else if is_overdue(p, today) {
        DisplayStatus::Overdue
    } else {
        DisplayStatus::Pending
    }
}
