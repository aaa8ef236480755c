//! Read-only feeds owned by other subsystems: the fee-rule catalog, both raw
//! record families and the parent's student roster.

pub mod directory;
pub mod http;

use feeledger_core::{FeeRule, Student};
use feeledger_ingest::{RawCollectionRecord, RawTransactionRecord};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use tracing::warn;

use crate::error::FeedResult;

pub use directory::DirectoryFeed;
pub use http::HttpFeed;

pub trait FeedSource {
    fn fee_rule_catalog(
        &self,
        school_id: &str,
    ) -> impl Future<Output = FeedResult<Vec<FeeRule>>> + Send;

    /// Fee-collection entries filed under one student id
    fn collection_records(
        &self,
        student_id: &str,
    ) -> impl Future<Output = FeedResult<Vec<RawCollectionRecord>>> + Send;

    /// Every ledger entry of the school; callers filter by student
    fn transaction_records(
        &self,
        school_id: &str,
    ) -> impl Future<Output = FeedResult<Vec<RawTransactionRecord>>> + Send;

    fn student_roster(
        &self,
        parent_identity: &str,
    ) -> impl Future<Output = FeedResult<Vec<Student>>> + Send;

    /// Every student enrolled in the school
    fn school_roster(
        &self,
        school_id: &str,
    ) -> impl Future<Output = FeedResult<Vec<Student>>> + Send;
}

/// Decode documents one at a time; a document that does not fit is skipped.
pub(crate) fn decode_documents<T: DeserializeOwned>(origin: &str, docs: Vec<Value>) -> Vec<T> {
    docs.into_iter()
        .filter_map(|doc| {
            let id = doc.get("id").and_then(Value::as_str).unwrap_or("?").to_string();
            match serde_json::from_value(doc) {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!(origin, id = %id, error = %e, "skipping malformed document");
                    None
                }
            }
        })
        .collect()
}

/// `true` when a document is unscoped or scoped to `school_id`
pub(crate) fn in_school(doc_school: Option<&str>, school_id: &str) -> bool {
    match doc_school.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s == school_id.trim(),
        None => true,
    }
}

/// Roster membership by parent id or parent email
pub(crate) fn is_child_of(student: &Student, parent_identity: &str) -> bool {
    let who = parent_identity.trim();
    if who.is_empty() {
        return false;
    }
    student.parent_id.as_deref().map(str::trim) == Some(who)
        || student
            .parent_email
            .as_deref()
            .is_some_and(|e| e.trim().eq_ignore_ascii_case(who))
}

/// Everything held in memory. Used by tests and by embedders that already
/// have the documents loaded.
#[derive(Debug, Clone, Default)]
pub struct MemoryFeed {
    pub students: Vec<Student>,
    pub fee_rules: Vec<FeeRule>,
    pub collections: Vec<RawCollectionRecord>,
    pub transactions: Vec<RawTransactionRecord>,
}

impl FeedSource for MemoryFeed {
    async fn fee_rule_catalog(&self, _school_id: &str) -> FeedResult<Vec<FeeRule>> {
        Ok(self.fee_rules.clone())
    }

    async fn collection_records(&self, student_id: &str) -> FeedResult<Vec<RawCollectionRecord>> {
        Ok(self
            .collections
            .iter()
            .filter(|r| r.student_id.trim() == student_id.trim())
            .cloned()
            .collect())
    }

    async fn transaction_records(&self, school_id: &str) -> FeedResult<Vec<RawTransactionRecord>> {
        Ok(self
            .transactions
            .iter()
            .filter(|r| in_school(r.school_id.as_deref(), school_id))
            .cloned()
            .collect())
    }

    async fn student_roster(&self, parent_identity: &str) -> FeedResult<Vec<Student>> {
        Ok(self
            .students
            .iter()
            .filter(|s| is_child_of(s, parent_identity))
            .cloned()
            .collect())
    }

    async fn school_roster(&self, school_id: &str) -> FeedResult<Vec<Student>> {
        Ok(self
            .students
            .iter()
            .filter(|s| in_school(s.school_id.as_deref(), school_id))
            .cloned()
            .collect())
    }
}
