use anyhow::{bail, Context, Result};
use feeledger_core::{FeeRule, Student};
use feeledger_ingest::{RawCollectionRecord, RawTransactionRecord};
use feeledger_recon::{DirectoryFeed, FeedResult, FeedSource, HttpFeed};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{Config, FeedKind};

/// Whichever feed the config selects
#[derive(Debug, Clone)]
pub enum AnyFeed {
    Directory(DirectoryFeed),
    Http(HttpFeed),
}

/// `--data` forces a directory feed; otherwise `[feed]` decides.
pub fn build_feed(cfg: &Config, data: Option<PathBuf>) -> Result<AnyFeed> {
    if let Some(dir) = data {
        return directory(dir);
    }

    match cfg.feed.kind {
        FeedKind::Directory => {
            let Some(dir) = cfg.feed.path.clone() else {
                bail!("[feed] kind = \"directory\" needs a path (or pass --data <DIR>)");
            };
            directory(dir)
        }
        FeedKind::Http => {
            let Some(base_url) = cfg.feed.base_url.as_deref() else {
                bail!("[feed] kind = \"http\" needs a base_url");
            };
            let token = cfg
                .feed
                .token_env
                .as_deref()
                .and_then(|var| std::env::var(var).ok())
                .filter(|t| !t.trim().is_empty());
            if token.is_none() {
                warn!("no gateway token found, requests go out unauthenticated");
            }
            let feed = HttpFeed::new(
                base_url,
                Duration::from_secs(cfg.feed.timeout_secs),
                token.as_deref(),
            )
            .with_context(|| format!("http feed at {base_url}"))?;
            debug!(base_url, "using http feed");
            Ok(AnyFeed::Http(feed))
        }
    }
}

fn directory(dir: PathBuf) -> Result<AnyFeed> {
    if !dir.is_dir() {
        bail!("data directory not found: {}", dir.display());
    }
    debug!(dir = %dir.display(), "using directory feed");
    Ok(AnyFeed::Directory(DirectoryFeed::new(dir)))
}

impl FeedSource for AnyFeed {
    async fn fee_rule_catalog(&self, school_id: &str) -> FeedResult<Vec<FeeRule>> {
        match self {
            AnyFeed::Directory(f) => f.fee_rule_catalog(school_id).await,
            AnyFeed::Http(f) => f.fee_rule_catalog(school_id).await,
        }
    }

    async fn collection_records(&self, student_id: &str) -> FeedResult<Vec<RawCollectionRecord>> {
        match self {
            AnyFeed::Directory(f) => f.collection_records(student_id).await,
            AnyFeed::Http(f) => f.collection_records(student_id).await,
        }
    }

    async fn transaction_records(&self, school_id: &str) -> FeedResult<Vec<RawTransactionRecord>> {
        match self {
            AnyFeed::Directory(f) => f.transaction_records(school_id).await,
            AnyFeed::Http(f) => f.transaction_records(school_id).await,
        }
    }

    async fn student_roster(&self, parent_identity: &str) -> FeedResult<Vec<Student>> {
        match self {
            AnyFeed::Directory(f) => f.student_roster(parent_identity).await,
            AnyFeed::Http(f) => f.student_roster(parent_identity).await,
        }
    }

    async fn school_roster(&self, school_id: &str) -> FeedResult<Vec<Student>> {
        match self {
            AnyFeed::Directory(f) => f.school_roster(school_id).await,
            AnyFeed::Http(f) => f.school_roster(school_id).await,
        }
    }
}
