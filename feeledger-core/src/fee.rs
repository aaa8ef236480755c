//! Fee catalog and payment types shared by the normalizers and the engine

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::de::null_as_default;
use crate::fee_names;

/// Billing cadence of a fee rule
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FeeType {
    #[serde(rename = "monthly")]
    Monthly,
    #[serde(rename = "quarterly")]
    Quarterly,
    #[serde(rename = "yearly")]
    Yearly,
    #[serde(rename = "one-time", alias = "one_time", alias = "onetime")]
    OneTime,
    #[serde(rename = "admission")]
    Admission,
    #[serde(rename = "exam")]
    Exam,
    /// Anything the catalog carries that we don't recognise. Counted once.
    #[serde(rename = "other", other)]
    Other,
}

impl FeeType {
    /// How many times per year a fee of this type is charged.
    ///
    /// Exams are estimated at four cycles a year.
    pub fn annual_multiplier(&self) -> f64 {
        match self {
            FeeType::Monthly => 12.0,
            FeeType::Quarterly => 4.0,
            FeeType::Exam => 4.0,
            FeeType::Yearly | FeeType::OneTime | FeeType::Admission | FeeType::Other => 1.0,
        }
    }

    /// Charged once per student rather than per period
    pub fn is_once_per_student(&self) -> bool {
        matches!(self, FeeType::OneTime | FeeType::Admission)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeeType::Monthly => "monthly",
            FeeType::Quarterly => "quarterly",
            FeeType::Yearly => "yearly",
            FeeType::OneTime => "one-time",
            FeeType::Admission => "admission",
            FeeType::Exam => "exam",
            FeeType::Other => "other",
        }
    }
}

impl FromStr for FeeType {
    type Err = std::convert::Infallible;

    /// Lenient: unknown labels become `FeeType::Other`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_lowercase().replace(['_', ' '], "-");
        Ok(match norm.as_str() {
            "monthly" => FeeType::Monthly,
            "quarterly" => FeeType::Quarterly,
            "yearly" | "annual" => FeeType::Yearly,
            "one-time" | "onetime" => FeeType::OneTime,
            "admission" => FeeType::Admission,
            "exam" => FeeType::Exam,
            _ => FeeType::Other,
        })
    }
}

impl fmt::Display for FeeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A staff-maintained fee definition. Read-only to the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeeRule {
    pub fee_name: String,
    pub fee_type: FeeType,
    pub amount: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub applicable_classes: BTreeSet<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl FeeRule {
    pub fn new(fee_name: impl Into<String>, fee_type: FeeType, amount: f64) -> Self {
        Self {
            fee_name: fee_name.into(),
            fee_type,
            amount,
            applicable_classes: BTreeSet::new(),
            is_active: true,
        }
    }

    pub fn with_classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.applicable_classes = classes.into_iter().map(Into::into).collect();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn applies_to(&self, class_id: &str) -> bool {
        self.applicable_classes.contains(class_id.trim())
    }

    /// Expected yearly contribution of this rule for one student
    pub fn annualized_amount(&self) -> f64 {
        self.amount * self.fee_type.annual_multiplier()
    }
}

/// One row of the transaction-category table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeCategory {
    /// Category code as stored on ledger entries (e.g. `tuition_fee`)
    pub code: &'static str,
    /// Canonical fee name shown to parents and used for matching
    pub display_name: &'static str,
    /// Cadence used when annualizing
    pub fee_type: FeeType,
    /// Donation addend is part of the payment total
    pub includes_donation: bool,
    /// Installments are labelled by month (`Tuition Fee - Jan`)
    pub monthly_installments: bool,
}

impl FeeCategory {
    /// Display name for one payment, suffixed with the month for installment fees
    pub fn fee_name_for(&self, month: Option<&str>) -> String {
        match month.map(str::trim).filter(|m| !m.is_empty()) {
            Some(m) if self.monthly_installments => format!("{} - {}", self.display_name, m),
            _ => self.display_name.to_string(),
        }
    }

    /// Charged once per student (admission, session, registration)
    pub fn is_once_per_student(&self) -> bool {
        self.fee_type.is_once_per_student()
    }
}

const fn category(
    code: &'static str,
    display_name: &'static str,
    fee_type: FeeType,
    includes_donation: bool,
    monthly_installments: bool,
) -> FeeCategory {
    FeeCategory {
        code,
        display_name,
        fee_type,
        includes_donation,
        monthly_installments,
    }
}

/// Ledger categories that count as school fees.
pub const FEE_CATEGORIES: &[FeeCategory] = &[
    category("admission_fee", "Admission Fee", FeeType::Admission, false, false),
    category("session_fee", "Session Fee", FeeType::OneTime, false, false),
    category("registration_fee", "Registration Fee", FeeType::OneTime, false, false),
    category("tuition_fee", "Tuition Fee", FeeType::Monthly, true, true),
    category("exam_fee", "Exam Fee", FeeType::Exam, false, false),
    category("transport_fee", "Transport Fee", FeeType::Monthly, false, false),
    category("hostel_fee", "Hostel Fee", FeeType::Monthly, false, false),
    category("library_fee", "Library Fee", FeeType::Yearly, false, false),
    category("lab_fee", "Lab Fee", FeeType::Yearly, false, false),
    category("sports_fee", "Sports Fee", FeeType::Yearly, false, false),
    category("development_fee", "Development Fee", FeeType::Yearly, false, false),
    category("other_fee", "Other Fee", FeeType::Other, false, false),
];

/// Look up a ledger category code. Case and surrounding whitespace are ignored.
pub fn fee_category(code: &str) -> Option<&'static FeeCategory> {
    let code = code.trim();
    FEE_CATEGORIES
        .iter()
        .find(|c| c.code.eq_ignore_ascii_case(code))
}

/// Category whose display name a fee name starts with, so month-suffixed
/// installments (`Tuition Fee - Jan`) find their row.
pub fn category_for_fee_name(fee_name: &str) -> Option<&'static FeeCategory> {
    let name = fee_name.trim().to_lowercase();
    FEE_CATEGORIES
        .iter()
        .find(|c| name.starts_with(&c.display_name.to_lowercase()))
}

/// Enrolment fee by the category table; free-text names outside the table
/// fall back to the admission/session/registration pattern.
pub fn is_enrolment_fee(fee_name: &str) -> bool {
    match category_for_fee_name(fee_name) {
        Some(category) => category.is_once_per_student(),
        None => fee_names::is_enrolment(fee_name),
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Pending,
}

/// Which raw record family a canonical payment came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PaymentSource {
    Collection,
    Transaction,
}

/// Presentation label derived from status and due date
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DisplayStatus {
    Paid,
    Pending,
    Overdue,
}

impl DisplayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayStatus::Paid => "paid",
            DisplayStatus::Pending => "pending",
            DisplayStatus::Overdue => "overdue",
        }
    }
}

impl fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Unified payment shape both raw families normalize into.
///
/// `total_amount == amount + donation` and `total_amount >= amount >= 0`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalPayment {
    pub id: String,
    pub fee_name: String,
    pub student_id: String,
    pub class_name: String,
    pub amount: f64,
    pub donation: f64,
    pub total_amount: f64,
    pub payment_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub status: PaymentStatus,
    pub payment_method: String,
    pub transaction_ref: String,
    pub month: Option<String>,
    pub source: PaymentSource,
}

impl CanonicalPayment {
    /// Date used for ordering and dedup keys
    pub fn effective_date(&self) -> Option<NaiveDate> {
        self.due_date.or(self.payment_date)
    }

    pub fn is_paid(&self) -> bool {
        self.status == PaymentStatus::Paid
    }
}

/// Split a raw amount and optional donation into the canonical
/// `(amount, donation, total)` triple. Negative or non-finite parts count as zero.
pub fn amount_parts(amount: f64, donation: Option<f64>) -> (f64, f64, f64) {
    let clean = |v: f64| if v.is_finite() && v > 0.0 { v } else { 0.0 };
    let amount = clean(amount);
    let donation = clean(donation.unwrap_or(0.0));
    (amount, donation, amount + donation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annual_multipliers() {
        assert_eq!(FeeType::Monthly.annual_multiplier(), 12.0);
        assert_eq!(FeeType::Quarterly.annual_multiplier(), 4.0);
        assert_eq!(FeeType::Exam.annual_multiplier(), 4.0);
        assert_eq!(FeeType::Yearly.annual_multiplier(), 1.0);
        assert_eq!(FeeType::Other.annual_multiplier(), 1.0);
    }

    #[test]
    fn test_monthly_rule_annualizes_to_twelve() {
        let rule = FeeRule::new("Tuition Fee", FeeType::Monthly, 500.0).with_classes(["Five"]);
        assert_eq!(rule.annualized_amount(), 6000.0);
        assert!(rule.applies_to("Five"));
        assert!(!rule.applies_to("Six"));
    }

    #[test]
    fn test_fee_type_deserialize_unknown_is_other() {
        let t: FeeType = serde_json::from_str("\"semester\"").unwrap();
        assert_eq!(t, FeeType::Other);
        let t: FeeType = serde_json::from_str("\"one-time\"").unwrap();
        assert_eq!(t, FeeType::OneTime);
    }

    #[test]
    fn test_fee_type_from_str_lenient() {
        assert_eq!("One Time".parse::<FeeType>().unwrap(), FeeType::OneTime);
        assert_eq!("MONTHLY".parse::<FeeType>().unwrap(), FeeType::Monthly);
        assert_eq!("weird".parse::<FeeType>().unwrap(), FeeType::Other);
    }

    #[test]
    fn test_fee_rule_json_defaults() {
        let rule: FeeRule = serde_json::from_str(
            r#"{"feeName":"Exam Fee","feeType":"exam","amount":300}"#,
        )
        .unwrap();
        assert!(rule.is_active);
        assert!(rule.applicable_classes.is_empty());
    }

    #[test]
    fn test_category_table_lookup() {
        let tuition = fee_category("TUITION_FEE").unwrap();
        assert_eq!(tuition.display_name, "Tuition Fee");
        assert!(tuition.includes_donation);
        assert_eq!(tuition.fee_name_for(Some("Jan")), "Tuition Fee - Jan");
        assert_eq!(tuition.fee_name_for(Some("  ")), "Tuition Fee");

        let admission = fee_category("admission_fee").unwrap();
        assert_eq!(admission.fee_name_for(Some("Jan")), "Admission Fee");
        assert!(fee_category("salary").is_none());
    }

    #[test]
    fn test_amount_parts_clamps() {
        assert_eq!(amount_parts(500.0, Some(50.0)), (500.0, 50.0, 550.0));
        assert_eq!(amount_parts(-10.0, None), (0.0, 0.0, 0.0));
        assert_eq!(amount_parts(f64::NAN, Some(20.0)), (0.0, 20.0, 20.0));
    }

    #[test]
    fn test_once_per_student_rows_are_the_enrolment_fees() {
        let once: Vec<_> = FEE_CATEGORIES
            .iter()
            .filter(|c| c.is_once_per_student())
            .map(|c| c.code)
            .collect();
        assert_eq!(once, vec!["admission_fee", "session_fee", "registration_fee"]);
    }

    #[test]
    fn test_enrolment_fee_by_table_then_pattern() {
        assert!(is_enrolment_fee("Admission Fee"));
        assert!(is_enrolment_fee("registration fee"));
        assert!(!is_enrolment_fee("Tuition Fee - Jan"));
        assert!(!is_enrolment_fee("Other Fee"));
        assert_eq!(category_for_fee_name("Tuition Fee - Jan").map(|c| c.code), Some("tuition_fee"));
        // not in the table
        assert!(is_enrolment_fee("Annual Session Charge"));
        assert!(!is_enrolment_fee("Picnic"));
    }
}
