//! REST gateway in front of the school's document store.
//!
//!   GET {base}/schools/{school}/fee-rules
//!   GET {base}/students/{student}/fee-collections
//!   GET {base}/schools/{school}/transactions
//!   GET {base}/parents/{parent}/students
//!   GET {base}/schools/{school}/students
//!
//! Every endpoint answers with a JSON array of documents.

use feeledger_core::{FeeRule, Student};
use feeledger_ingest::{RawCollectionRecord, RawTransactionRecord};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{decode_documents, FeedSource};
use crate::error::{FeedError, FeedResult};

#[derive(Debug, Clone)]
pub struct HttpFeed {
    client: reqwest::Client,
    base: Url,
}

impl HttpFeed {
    pub fn new(base_url: &str, timeout: Duration, token: Option<&str>) -> FeedResult<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| FeedError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(FeedError::InvalidUrl(base_url.to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| FeedError::Config("token contains invalid header characters".into()))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(Self { client, base })
    }

    /// Base URL joined with percent-encoded path segments
    pub fn endpoint(&self, segments: &[&str]) -> FeedResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| FeedError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_documents<T: DeserializeOwned>(&self, segments: &[&str]) -> FeedResult<Vec<T>> {
        let url = self.endpoint(segments)?;
        debug!(url = %url, "fetching documents");
        let resp = self.client.get(url.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let docs: Vec<Value> = resp.json().await?;
        Ok(decode_documents(url.path(), docs))
    }
}

impl FeedSource for HttpFeed {
    async fn fee_rule_catalog(&self, school_id: &str) -> FeedResult<Vec<FeeRule>> {
        self.get_documents(&["schools", school_id, "fee-rules"]).await
    }

    async fn collection_records(&self, student_id: &str) -> FeedResult<Vec<RawCollectionRecord>> {
        self.get_documents(&["students", student_id, "fee-collections"]).await
    }

    async fn transaction_records(&self, school_id: &str) -> FeedResult<Vec<RawTransactionRecord>> {
        self.get_documents(&["schools", school_id, "transactions"]).await
    }

    async fn student_roster(&self, parent_identity: &str) -> FeedResult<Vec<Student>> {
        self.get_documents(&["parents", parent_identity, "students"]).await
    }

    async fn school_roster(&self, school_id: &str) -> FeedResult<Vec<Student>> {
        self.get_documents(&["schools", school_id, "students"]).await
    }
}
