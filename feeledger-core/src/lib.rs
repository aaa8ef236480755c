//! feeledger-core: Core types for school fee reconciliation

pub mod fee;
pub mod student;
pub mod time;

pub use fee::{
    amount_parts, category_for_fee_name, fee_category, is_enrolment_fee, CanonicalPayment,
    DisplayStatus, FeeCategory, FeeRule, FeeType, PaymentSource, PaymentStatus, FEE_CATEGORIES,
};
pub use student::{IdentifierIndex, Student, StudentRef};

/// Fee-name classification shared by the dedup key builder and the
/// expected-fee calculator.
pub mod fee_names {
    use regex::Regex;
    use std::sync::LazyLock;

    static TUITION: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)tuition").expect("tuition pattern"));

    static ENROLMENT: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)\b(admission|session|registration)\b").expect("enrolment pattern")
    });

    /// Tuition fees, including month-suffixed installments
    pub fn is_tuition(fee_name: &str) -> bool {
        TUITION.is_match(fee_name)
    }

    /// Admission, session and registration fees: charged once per student
    pub fn is_enrolment(fee_name: &str) -> bool {
        ENROLMENT.is_match(fee_name)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_tuition_marker() {
            assert!(is_tuition("Tuition Fee"));
            assert!(is_tuition("Tuition Fee - Jan"));
            assert!(is_tuition("monthly TUITION"));
            assert!(!is_tuition("Exam Fee"));
        }

        #[test]
        fn test_enrolment_pattern() {
            assert!(is_enrolment("Admission Fee"));
            assert!(is_enrolment("Session Fee 2026"));
            assert!(is_enrolment("registration"));
            assert!(!is_enrolment("Tuition Fee"));
            // whole words only
            assert!(!is_enrolment("Sessional Exam"));
        }
    }
}

/// Serde helpers for document-store exports.
pub mod de {
    use serde::{Deserialize, Deserializer};

    /// Explicit `null` reads as the type's default, like a missing field.
    pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Default + Deserialize<'de>,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[derive(Deserialize, Default)]
        struct Doc {
            #[serde(default, deserialize_with = "null_as_default")]
            status: String,
        }

        #[test]
        fn test_null_and_missing_read_as_default() {
            let doc: Doc = serde_json::from_str(r#"{"status": null}"#).unwrap();
            assert_eq!(doc.status, "");
            let doc: Doc = serde_json::from_str("{}").unwrap();
            assert_eq!(doc.status, "");
            let doc: Doc = serde_json::from_str(r#"{"status": "paid"}"#).unwrap();
            assert_eq!(doc.status, "paid");
        }
    }
}
