//! One reconciliation run: fetch the three feeds concurrently, join, then
//! normalize → dedup → classify → aggregate per student.
//!
//! Nothing here returns an error. A failed feed counts as empty and a failed
//! expected-fee calculation falls back to paid + due.

use chrono::NaiveDate;
use feeledger_core::{CanonicalPayment, FeeRule, IdentifierIndex, Student, StudentRef};
use feeledger_ingest::{
    normalize_collections, normalize_transactions, RawCollectionRecord, RawTransactionRecord,
};
use futures_util::future::join_all;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{info, warn};

use crate::aggregate::{classify_all, summarize, summarize_parent, ParentSummary, ReconciledSummary};
use crate::dedup::deduplicate;
use crate::error::FeedResult;
use crate::expected::expected_fees;
use crate::feeds::FeedSource;

#[derive(Debug, Clone)]
pub struct ReconcileContext {
    pub school_id: String,
    /// Calendar day overdue status is judged against
    pub today: NaiveDate,
    /// Class → monthly tuition, used when the catalog has no rule for a class
    pub legacy_fees: BTreeMap<String, f64>,
}

impl ReconcileContext {
    pub fn new(school_id: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            school_id: school_id.into(),
            today,
            legacy_fees: BTreeMap::new(),
        }
    }

    pub fn with_legacy_fees(mut self, legacy_fees: BTreeMap<String, f64>) -> Self {
        self.legacy_fees = legacy_fees;
        self
    }
}

/// Raw inputs of one run, as delivered by the feeds
#[derive(Debug, Clone, Default)]
pub struct FetchedRecords {
    pub fee_rules: Vec<FeeRule>,
    pub collections: Vec<RawCollectionRecord>,
    pub transactions: Vec<RawTransactionRecord>,
}

fn or_empty<T>(feed: &str, result: FeedResult<Vec<T>>) -> Vec<T> {
    match result {
        Ok(v) => v,
        Err(e) => {
            warn!(feed, error = %e, "feed unavailable, continuing without it");
            Vec::new()
        }
    }
}

/// Fan out the catalog, ledger and per-id collection fetches and join them.
///
/// Collection entries are requested under every known id of every student;
/// an entry returned twice is kept once.
pub async fn fetch_records<F: FeedSource>(
    feeds: &F,
    index: &IdentifierIndex,
    school_id: &str,
) -> FetchedRecords {
    let ids: Vec<&str> = index
        .students()
        .iter()
        .flat_map(|s| s.alternate_ids.iter().map(String::as_str))
        .collect();

    let (fee_rules, transactions, per_id) = tokio::join!(
        feeds.fee_rule_catalog(school_id),
        feeds.transaction_records(school_id),
        join_all(ids.iter().map(|id| feeds.collection_records(id))),
    );

    let mut seen: HashSet<String> = HashSet::new();
    let collections = per_id
        .into_iter()
        .flat_map(|r| or_empty("fee collections", r))
        .filter(|r| r.id.is_empty() || seen.insert(r.id.clone()))
        .collect();

    FetchedRecords {
        fee_rules: or_empty("fee rule catalog", fee_rules),
        collections,
        transactions: or_empty("transactions", transactions),
    }
}

fn reconcile_student(
    student: &StudentRef,
    payments: Vec<CanonicalPayment>,
    catalog: &[FeeRule],
    ctx: &ReconcileContext,
) -> ReconciledSummary {
    let payments = deduplicate(payments);

    let expected = expected_fees(catalog, &student.class_id, &payments, &ctx.legacy_fees);
    let total_expected = match expected {
        Ok(fees) => fees.total(),
        Err(e) => {
            warn!(
                student = %student.primary_id,
                error = %e,
                "expected fees unavailable, using paid + due"
            );
            0.0
        }
    };

    summarize(student, classify_all(payments, ctx.today), total_expected)
}

/// Synchronous core over already-fetched records. Same input, same output.
pub fn reconcile_records(
    index: &IdentifierIndex,
    records: &FetchedRecords,
    ctx: &ReconcileContext,
) -> Vec<ReconciledSummary> {
    let mut by_student: HashMap<String, Vec<CanonicalPayment>> = HashMap::new();
    let normalized = normalize_collections(&records.collections, index)
        .into_iter()
        .chain(normalize_transactions(&records.transactions, index));
    for p in normalized {
        by_student.entry(p.student_id.clone()).or_default().push(p);
    }

    index
        .students()
        .iter()
        .map(|s| {
            let payments = by_student.remove(&s.primary_id).unwrap_or_default();
            reconcile_student(s, payments, &records.fee_rules, ctx)
        })
        .collect()
}

/// One summary per student, in roster order.
pub async fn reconcile<F: FeedSource>(
    feeds: &F,
    ctx: &ReconcileContext,
    students: &[Student],
) -> Vec<ReconciledSummary> {
    let index = IdentifierIndex::build(students);
    if index.is_empty() {
        return Vec::new();
    }

    let records = fetch_records(feeds, &index, &ctx.school_id).await;
    let summaries = reconcile_records(&index, &records, ctx);

    info!(
        school = %ctx.school_id,
        students = summaries.len(),
        fee_rules = records.fee_rules.len(),
        collections = records.collections.len(),
        transactions = records.transactions.len(),
        "reconciled fee summaries"
    );
    summaries
}

/// Roster lookup, then a summary across all of the parent's children.
pub async fn reconcile_parent<F: FeedSource>(
    feeds: &F,
    ctx: &ReconcileContext,
    parent_identity: &str,
) -> ParentSummary {
    let roster = or_empty("student roster", feeds.student_roster(parent_identity).await);
    summarize_parent(reconcile(feeds, ctx, &roster).await)
}
