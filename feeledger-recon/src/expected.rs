//! Annualized "total fees" a student is expected to pay in a year.
//!
//! Enrolment fees (admission/session/registration, charged once) count for
//! every student. Class rules are annualized by their fee type. Missing
//! catalog data falls back to paid enrolment entries and to the legacy
//! per-class monthly tuition.

use feeledger_core::{is_enrolment_fee, CanonicalPayment, FeeRule};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::ReconError;

/// Pre-catalog fee structure: one monthly tuition figure per class.
pub trait LegacyFeeStructure {
    fn monthly_tuition(&self, class_id: &str) -> Option<f64>;
}

impl LegacyFeeStructure for BTreeMap<String, f64> {
    fn monthly_tuition(&self, class_id: &str) -> Option<f64> {
        self.get(class_id.trim()).copied()
    }
}

impl LegacyFeeStructure for HashMap<String, f64> {
    fn monthly_tuition(&self, class_id: &str) -> Option<f64> {
        self.get(class_id.trim()).copied()
    }
}

/// No legacy structure available
impl LegacyFeeStructure for () {
    fn monthly_tuition(&self, _class_id: &str) -> Option<f64> {
        None
    }
}

/// Breakdown of one student's expected yearly fees
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedFees {
    /// Enrolment fees from the catalog, or from paid entries when the catalog has none
    pub once_per_student: f64,
    pub class_annual: f64,
    pub legacy_annual: f64,
    pub from_paid_enrolment: bool,
    pub from_legacy_structure: bool,
}

impl ExpectedFees {
    pub fn total(&self) -> f64 {
        self.once_per_student + self.class_annual + self.legacy_annual
    }
}

fn checked(fee_name: &str, amount: f64) -> Result<f64, ReconError> {
    if !amount.is_finite() {
        return Err(ReconError::NonFiniteAmount {
            fee_name: fee_name.to_string(),
        });
    }
    if amount < 0.0 {
        return Err(ReconError::NegativeAmount {
            fee_name: fee_name.to_string(),
            amount,
        });
    }
    Ok(amount)
}

/// Active enrolment rules charged once per student, regardless of class
pub fn enrolment_rules(catalog: &[FeeRule]) -> impl Iterator<Item = &FeeRule> {
    catalog.iter().filter(|r| {
        r.is_active && r.fee_type.is_once_per_student() && is_enrolment_fee(&r.fee_name)
    })
}

/// `payments` are the student's reconciled entries, used only when the
/// catalog carries no enrolment rule.
pub fn expected_fees<L>(
    catalog: &[FeeRule],
    class_id: &str,
    payments: &[CanonicalPayment],
    legacy: &L,
) -> Result<ExpectedFees, ReconError>
where
    L: LegacyFeeStructure + ?Sized,
{
    let mut out = ExpectedFees::default();

    let global: Vec<&FeeRule> = enrolment_rules(catalog).collect();
    for rule in &global {
        out.once_per_student += checked(&rule.fee_name, rule.amount)?;
    }
    if global.is_empty() {
        out.once_per_student = payments
            .iter()
            .filter(|p| is_enrolment_fee(&p.fee_name))
            .map(|p| p.total_amount)
            .sum();
        out.from_paid_enrolment = out.once_per_student > 0.0;
    }

    // same fee name = same fee
    let counted: HashSet<&str> = global.iter().map(|r| r.fee_name.as_str()).collect();
    let class_rules: Vec<&FeeRule> = catalog
        .iter()
        .filter(|r| r.is_active && r.applies_to(class_id) && !counted.contains(r.fee_name.as_str()))
        .collect();

    for rule in &class_rules {
        let amount = checked(&rule.fee_name, rule.amount)?;
        out.class_annual += amount * rule.fee_type.annual_multiplier();
    }

    if class_rules.is_empty() {
        if let Some(monthly) = legacy.monthly_tuition(class_id) {
            let monthly = checked(&format!("legacy tuition for {}", class_id.trim()), monthly)?;
            out.legacy_annual = monthly * 12.0;
            out.from_legacy_structure = true;
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use feeledger_core::{FeeType, PaymentSource, PaymentStatus};

    fn catalog() -> Vec<FeeRule> {
        vec![
            FeeRule::new("Admission Fee", FeeType::OneTime, 1000.0),
            FeeRule::new("Tuition Fee", FeeType::Monthly, 500.0).with_classes(["Five"]),
        ]
    }

    fn paid(fee: &str, total: f64) -> CanonicalPayment {
        CanonicalPayment {
            id: fee.into(),
            fee_name: fee.into(),
            student_id: "s1".into(),
            class_name: "Five".into(),
            amount: total,
            donation: 0.0,
            total_amount: total,
            payment_date: None,
            due_date: None,
            status: PaymentStatus::Paid,
            payment_method: String::new(),
            transaction_ref: String::new(),
            month: None,
            source: PaymentSource::Collection,
        }
    }

    #[test]
    fn test_enrolment_plus_annualized_class_rules() {
        let fees = expected_fees(&catalog(), "Five", &[], &()).unwrap();
        assert_eq!(fees.once_per_student, 1000.0);
        assert_eq!(fees.class_annual, 6000.0);
        assert_eq!(fees.total(), 7000.0);
        assert!(!fees.from_legacy_structure);
    }

    #[test]
    fn test_multipliers_per_fee_type() {
        let rules = vec![
            FeeRule::new("Transport", FeeType::Quarterly, 100.0).with_classes(["Five"]),
            FeeRule::new("Term Exam", FeeType::Exam, 50.0).with_classes(["Five"]),
            FeeRule::new("Library", FeeType::Yearly, 70.0).with_classes(["Five"]),
            FeeRule::new("Uniform", FeeType::Other, 30.0).with_classes(["Five"]),
        ];
        let fees = expected_fees(&rules, "Five", &[], &()).unwrap();
        assert_eq!(fees.class_annual, 400.0 + 200.0 + 70.0 + 30.0);
    }

    #[test]
    fn test_inactive_and_other_class_rules_ignored() {
        let mut rules = catalog();
        rules.push(
            FeeRule::new("Lab Fee", FeeType::Yearly, 999.0)
                .with_classes(["Five"])
                .inactive(),
        );
        rules.push(FeeRule::new("Hostel", FeeType::Monthly, 999.0).with_classes(["Six"]));
        assert_eq!(expected_fees(&rules, "Five", &[], &()).unwrap().total(), 7000.0);
    }

    #[test]
    fn test_enrolment_rule_not_counted_twice() {
        let rules = vec![
            FeeRule::new("Admission Fee", FeeType::Admission, 1000.0).with_classes(["Five"]),
            FeeRule::new("Tuition Fee", FeeType::Monthly, 500.0).with_classes(["Five"]),
        ];
        assert_eq!(expected_fees(&rules, "Five", &[], &()).unwrap().total(), 7000.0);
    }

    #[test]
    fn test_enrolment_name_with_periodic_type_is_a_class_rule() {
        let rules =
            vec![FeeRule::new("Session Fee", FeeType::Yearly, 800.0).with_classes(["Five"])];
        let fees = expected_fees(&rules, "Five", &[], &()).unwrap();
        assert_eq!(fees.once_per_student, 0.0);
        assert_eq!(fees.class_annual, 800.0);
    }

    #[test]
    fn test_paid_enrolment_fallback() {
        let rules =
            vec![FeeRule::new("Tuition Fee", FeeType::Monthly, 500.0).with_classes(["Five"])];
        let payments = vec![paid("Admission Fee", 1200.0), paid("Exam Fee", 300.0)];
        let fees = expected_fees(&rules, "Five", &payments, &()).unwrap();
        assert_eq!(fees.once_per_student, 1200.0);
        assert!(fees.from_paid_enrolment);
        assert_eq!(fees.total(), 7200.0);
    }

    #[test]
    fn test_paid_fallback_follows_category_table() {
        let payments = vec![
            paid("Registration Fee", 400.0),
            paid("Session Fee", 250.0),
            paid("Other Fee", 90.0),
            paid("Tuition Fee - Jan", 500.0),
        ];
        let fees = expected_fees(&[], "Five", &payments, &()).unwrap();
        assert_eq!(fees.once_per_student, 650.0);
    }

    #[test]
    fn test_legacy_fallback_when_no_class_rules() {
        let legacy: BTreeMap<String, f64> = [("Five".to_string(), 450.0)].into_iter().collect();
        let rules = vec![FeeRule::new("Admission Fee", FeeType::OneTime, 1000.0)];
        let fees = expected_fees(&rules, "Five", &[], &legacy).unwrap();
        assert_eq!(fees.legacy_annual, 5400.0);
        assert!(fees.from_legacy_structure);
        assert_eq!(fees.total(), 6400.0);

        let fees = expected_fees(&rules, "Nine", &[], &legacy).unwrap();
        assert_eq!(fees.total(), 1000.0);
    }

    #[test]
    fn test_bad_amount_is_an_error() {
        let rules =
            vec![FeeRule::new("Tuition Fee", FeeType::Monthly, f64::NAN).with_classes(["Five"])];
        assert_eq!(
            expected_fees(&rules, "Five", &[], &()),
            Err(ReconError::NonFiniteAmount { fee_name: "Tuition Fee".into() })
        );

        let rules = vec![FeeRule::new("Admission Fee", FeeType::OneTime, -5.0)];
        assert!(matches!(
            expected_fees(&rules, "Five", &[], &()),
            Err(ReconError::NegativeAmount { .. })
        ));
    }

    #[test]
    fn test_empty_everything_is_zero() {
        assert_eq!(expected_fees(&[], "Five", &[], &()).unwrap().total(), 0.0);
    }
}
