//! Paid / due totals per student and rolled up across a parent's children.

use chrono::NaiveDate;
use feeledger_core::{CanonicalPayment, DisplayStatus, StudentRef};
use serde::Serialize;

use crate::status::classify;

/// A reconciled payment with its display label
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentLine {
    #[serde(flatten)]
    pub payment: CanonicalPayment,
    pub display_status: DisplayStatus,
}

pub fn classify_all(payments: Vec<CanonicalPayment>, today: NaiveDate) -> Vec<PaymentLine> {
    payments
        .into_iter()
        .map(|payment| {
            let display_status = classify(&payment, today);
            PaymentLine {
                payment,
                display_status,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub paid: f64,
    /// Pending plus overdue
    pub due: f64,
    pub overdue: f64,
}

pub fn totals(lines: &[PaymentLine]) -> Totals {
    let mut t = Totals::default();
    for line in lines {
        let amount = line.payment.total_amount;
        match line.display_status {
            DisplayStatus::Paid => t.paid += amount,
            DisplayStatus::Pending => t.due += amount,
            DisplayStatus::Overdue => {
                t.due += amount;
                t.overdue += amount;
            }
        }
    }
    t
}

/// Derived per-student view. Rebuilt on every run, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledSummary {
    pub student_id: String,
    pub student_name: String,
    pub class_name: String,
    pub total_paid: f64,
    pub total_due: f64,
    pub total_overdue: f64,
    /// Annualized catalog figure; 0 when it could not be computed
    pub total_expected: f64,
    /// What the parent sees as "total fees": expected, else paid + due
    pub total_fees: f64,
    pub payments: Vec<PaymentLine>,
}

pub fn summarize(
    student: &StudentRef,
    lines: Vec<PaymentLine>,
    total_expected: f64,
) -> ReconciledSummary {
    let t = totals(&lines);
    let total_fees = if total_expected > 0.0 {
        total_expected
    } else {
        t.due + t.paid
    };
    ReconciledSummary {
        student_id: student.primary_id.clone(),
        student_name: student.name.clone(),
        class_name: student.class_id.clone(),
        total_paid: t.paid,
        total_due: t.due,
        total_overdue: t.overdue,
        total_expected,
        total_fees,
        payments: lines,
    }
}

/// Fee overview across all of a parent's children
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentSummary {
    pub total_paid: f64,
    pub total_due: f64,
    pub total_overdue: f64,
    pub total_fees: f64,
    pub children: Vec<ReconciledSummary>,
}

pub fn summarize_parent(children: Vec<ReconciledSummary>) -> ParentSummary {
    let mut out = ParentSummary::default();
    for child in &children {
        out.total_paid += child.total_paid;
        out.total_due += child.total_due;
        out.total_overdue += child.total_overdue;
        out.total_fees += child.total_fees;
    }
    out.children = children;
    out
}
