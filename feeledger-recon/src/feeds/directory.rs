//! Document-store export on disk.
//!
//! Layout:
//!   students.json           roster
//!   fee_rules.json | .csv   catalog (JSON preferred when both exist)
//!   fee_collections.json    record family A
//!   transactions.json       record family B
//!
//! Each JSON file is either an array of documents or an object keyed by
//! document id (the id is copied into the document when it has none).

use feeledger_core::{FeeRule, Student};
use feeledger_ingest::{parse_fee_rules_csv, RawCollectionRecord, RawTransactionRecord};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{decode_documents, in_school, is_child_of, FeedSource};
use crate::error::{FeedError, FeedResult};

pub const STUDENTS_FILE: &str = "students.json";
pub const FEE_RULES_FILE: &str = "fee_rules.json";
pub const FEE_RULES_CSV: &str = "fee_rules.csv";
pub const COLLECTIONS_FILE: &str = "fee_collections.json";
pub const TRANSACTIONS_FILE: &str = "transactions.json";

#[derive(Debug, Clone)]
pub struct DirectoryFeed {
    root: PathBuf,
}

impl DirectoryFeed {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn documents(&self, file: &str) -> FeedResult<Vec<Value>> {
        let path = self.root.join(file);
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| FeedError::Io {
                path: path.display().to_string(),
                source,
            })?;
        let value: Value = serde_json::from_str(&text).map_err(|source| FeedError::Json {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), "read document export");
        Ok(flatten_documents(value))
    }

    /// Documents of one collection, keeping those `keep` accepts
    async fn load<T, F>(&self, file: &str, keep: F) -> FeedResult<Vec<T>>
    where
        T: DeserializeOwned,
        F: Fn(&Value) -> bool,
    {
        let docs: Vec<Value> = self
            .documents(file)
            .await?
            .into_iter()
            .filter(|doc| keep(doc))
            .collect();
        Ok(decode_documents(file, docs))
    }
}

/// Array export, or `{ "<docId>": { ... } }` export.
fn flatten_documents(value: Value) -> Vec<Value> {
    match value {
        Value::Array(docs) => docs,
        Value::Object(map) => map
            .into_iter()
            .filter_map(|(id, mut doc)| {
                let obj = doc.as_object_mut()?;
                obj.entry("id").or_insert(Value::String(id));
                Some(doc)
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn school_of(doc: &Value) -> Option<&str> {
    doc.get("schoolId").and_then(Value::as_str)
}

fn str_field<'a>(doc: &'a Value, field: &str) -> Option<&'a str> {
    doc.get(field).and_then(Value::as_str)
}

impl FeedSource for DirectoryFeed {
    async fn fee_rule_catalog(&self, school_id: &str) -> FeedResult<Vec<FeeRule>> {
        if self.root.join(FEE_RULES_FILE).exists() || !self.root.join(FEE_RULES_CSV).exists() {
            return self
                .load(FEE_RULES_FILE, |doc| in_school(school_of(doc), school_id))
                .await;
        }

        let path = self.root.join(FEE_RULES_CSV);
        let shown = path.display().to_string();
        tokio::task::spawn_blocking(move || parse_fee_rules_csv(&path))
            .await
            .map_err(|e| FeedError::Parse {
                path: shown.clone(),
                message: e.to_string(),
            })?
            .map_err(|e| FeedError::Parse {
                path: shown,
                message: format!("{e:#}"),
            })
    }

    async fn collection_records(&self, student_id: &str) -> FeedResult<Vec<RawCollectionRecord>> {
        let wanted = student_id.trim();
        self.load(COLLECTIONS_FILE, |doc| {
            str_field(doc, "studentId").map(str::trim) == Some(wanted)
        })
        .await
    }

    async fn transaction_records(&self, school_id: &str) -> FeedResult<Vec<RawTransactionRecord>> {
        self.load(TRANSACTIONS_FILE, |doc| in_school(school_of(doc), school_id))
            .await
    }

    async fn student_roster(&self, parent_identity: &str) -> FeedResult<Vec<Student>> {
        let students: Vec<Student> = self.load(STUDENTS_FILE, |_| true).await?;
        Ok(students
            .into_iter()
            .filter(|s| is_child_of(s, parent_identity))
            .collect())
    }

    async fn school_roster(&self, school_id: &str) -> FeedResult<Vec<Student>> {
        self.load(STUDENTS_FILE, |doc| in_school(school_of(doc), school_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Fresh scratch directory under the system temp dir
    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("feeledger-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write(dir: &Path, file: &str, value: Value) {
        std::fs::write(dir.join(file), serde_json::to_string_pretty(&value).unwrap()).unwrap();
    }

    #[test]
    fn test_flatten_keyed_export() {
        let docs = flatten_documents(json!({
            "abc": {"feeName": "X"},
            "def": {"id": "kept", "feeName": "Y"},
            "bad": 3
        }));
        assert_eq!(docs.len(), 2);
        let ids: Vec<_> = docs.iter().filter_map(|d| d["id"].as_str()).collect();
        assert!(ids.contains(&"abc"));
        assert!(ids.contains(&"kept"));
    }

    #[tokio::test]
    async fn test_directory_feed_reads_and_filters() {
        let dir = scratch("read");
        write(&dir, STUDENTS_FILE, json!([
            {"id": "d1", "name": "Rafi", "classId": "Five", "parentId": "p-1"},
            {"id": "d2", "name": "Mita", "classId": "Six", "parentId": "p-2"}
        ]));
        write(&dir, FEE_RULES_FILE, json!([
            {"feeName": "Admission Fee", "feeType": "one-time", "amount": 1000},
            {"feeName": "Elsewhere", "feeType": "yearly", "amount": 1, "schoolId": "sch-2"}
        ]));
        write(&dir, COLLECTIONS_FILE, json!({
            "fc-1": {"studentId": "d1", "feeName": "Exam Fee", "amount": 300, "status": "paid"},
            "fc-2": {"studentId": "d2", "feeName": "Exam Fee", "amount": 300, "status": "paid"}
        }));
        write(&dir, TRANSACTIONS_FILE, json!([
            {"id": "t1", "studentId": "d1", "type": "income", "category": "tuition_fee",
             "schoolId": "sch-1"},
            {"id": "t2", "studentId": "d1", "type": "income", "category": "tuition_fee",
             "schoolId": "sch-2"}
        ]));

        let feed = DirectoryFeed::new(&dir);
        let roster = feed.student_roster("p-1").await.unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].name, "Rafi");
        assert_eq!(feed.school_roster("sch-1").await.unwrap().len(), 2);

        let rules = feed.fee_rule_catalog("sch-1").await.unwrap();
        assert_eq!(rules.len(), 1);

        let collections = feed.collection_records("d1").await.unwrap();
        assert_eq!(collections.len(), 1);
        assert_eq!(collections[0].id, "fc-1");

        let txns = feed.transaction_records("sch-1").await.unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].id, "t1");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_directory_feed_csv_catalog() {
        let dir = scratch("csv");
        std::fs::write(
            dir.join(FEE_RULES_CSV),
            "feeName,feeType,amount,applicableClasses\nTuition Fee,monthly,500,Five\n",
        )
        .unwrap();
        let rules = DirectoryFeed::new(&dir).fee_rule_catalog("sch-1").await.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].annualized_amount(), 6000.0);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_bad_document_does_not_sink_the_feed() {
        use crate::reconcile::{reconcile, ReconcileContext};
        use chrono::NaiveDate;

        let dir = scratch("malformed");
        write(&dir, STUDENTS_FILE, json!([
            {"id": "d1", "name": "Rafi", "classId": "Five", "parentId": null}
        ]));
        write(&dir, TRANSACTIONS_FILE, json!([
            {"id": "t1", "studentId": "d1", "type": "income", "category": "tuition_fee",
             "paidAmount": 500, "status": "completed", "month": "Jan", "reference": "R1",
             "date": "2026-01-05"},
            {"id": "t2", "studentId": "d1", "type": "income", "category": "exam_fee",
             "amount": 300, "status": null, "dueDate": "2026-04-01"},
            {"id": "t3", "studentId": "d1", "type": "income", "category": "lab_fee",
             "amount": [1, 2], "status": "completed"}
        ]));

        let feed = DirectoryFeed::new(&dir);
        let txns = feed.transaction_records("sch-1").await.unwrap();
        let ids: Vec<_> = txns.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2"]);
        assert_eq!(txns[1].status, "");

        let roster = feed.school_roster("sch-1").await.unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let out = reconcile(&feed, &ReconcileContext::new("sch-1", today), &roster).await;
        assert_eq!(out[0].total_paid, 500.0);
        assert_eq!(out[0].total_due, 300.0);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_missing_file_is_an_io_error() {
        let dir = scratch("missing");
        let err = DirectoryFeed::new(&dir).transaction_records("sch-1").await.unwrap_err();
        assert!(matches!(err, FeedError::Io { .. }));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
