//! Plain-text tables for the terminal.

use chrono::NaiveDate;
use feeledger_core::FeeRule;
use feeledger_recon::{ExpectedFees, ParentSummary, ReconciledSummary};
use std::fmt::Write;

fn day(d: Option<NaiveDate>) -> String {
    d.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn render_summary(s: &ReconciledSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({}) class {}", s.student_name, s.student_id, s.class_name);
    let _ = writeln!(
        out,
        "  total fees {:.2} | paid {:.2} | due {:.2} (overdue {:.2})",
        s.total_fees, s.total_paid, s.total_due, s.total_overdue
    );
    if s.total_expected <= 0.0 {
        let _ = writeln!(out, "  (no expected-fee figure, total is paid + due)");
    }

    if s.payments.is_empty() {
        let _ = writeln!(out, "  no payments on record");
        return out;
    }

    let _ = writeln!(
        out,
        "  {:<28} {:>10} {:>10} {:<10} {:<8} {:<12}",
        "fee", "amount", "total", "date", "status", "ref"
    );
    for line in &s.payments {
        let p = &line.payment;
        let _ = writeln!(
            out,
            "  {:<28} {:>10.2} {:>10.2} {:<10} {:<8} {:<12}",
            p.fee_name,
            p.amount,
            p.total_amount,
            day(p.effective_date()),
            line.display_status,
            if p.transaction_ref.is_empty() { "-" } else { &p.transaction_ref },
        );
    }
    out
}

pub fn render_parent(parent_identity: &str, p: &ParentSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Parent {}: {} child(ren) | total fees {:.2} | paid {:.2} | due {:.2} (overdue {:.2})\n",
        parent_identity,
        p.children.len(),
        p.total_fees,
        p.total_paid,
        p.total_due,
        p.total_overdue
    );
    for child in &p.children {
        out.push_str(&render_summary(child));
        out.push('\n');
    }
    out
}

pub fn render_rules(rules: &[FeeRule]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<28} {:<10} {:>10} {:>12} {:<6} {}",
        "fee", "type", "amount", "annualized", "active", "classes"
    );
    for r in rules {
        let classes = if r.applicable_classes.is_empty() {
            "-".to_string()
        } else {
            r.applicable_classes.iter().cloned().collect::<Vec<_>>().join(";")
        };
        let _ = writeln!(
            out,
            "{:<28} {:<10} {:>10.2} {:>12.2} {:<6} {}",
            r.fee_name,
            r.fee_type,
            r.amount,
            r.annualized_amount(),
            if r.is_active { "yes" } else { "no" },
            classes
        );
    }
    out
}

pub fn render_expected(class_id: &str, fees: &ExpectedFees) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Expected yearly fees for class {class_id}: {:.2}", fees.total());
    let _ = writeln!(out, "  once per student  {:>10.2}", fees.once_per_student);
    let _ = writeln!(out, "  class rules       {:>10.2}", fees.class_annual);
    if fees.from_legacy_structure {
        let _ = writeln!(out, "  legacy tuition    {:>10.2}", fees.legacy_annual);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use feeledger_core::{FeeType, Student, StudentRef};
    use feeledger_recon::aggregate::summarize;

    #[test]
    fn test_summary_without_payments() {
        let student = StudentRef::from_student(&Student::new("d1", "Rafi", "Five")).unwrap();
        let s = summarize(&student, Vec::new(), 7000.0);
        let text = render_summary(&s);
        assert!(text.contains("Rafi (d1) class Five"));
        assert!(text.contains("total fees 7000.00"));
        assert!(text.contains("no payments on record"));
    }

    #[test]
    fn test_rules_table() {
        let rules = vec![
            FeeRule::new("Tuition Fee", FeeType::Monthly, 500.0).with_classes(["Five", "Six"]),
            FeeRule::new("Admission Fee", FeeType::OneTime, 1000.0).inactive(),
        ];
        let text = render_rules(&rules);
        assert!(text.contains("6000.00"));
        assert!(text.contains("Five;Six"));
        assert!(text.lines().nth(2).unwrap().contains("no"));
    }
}
