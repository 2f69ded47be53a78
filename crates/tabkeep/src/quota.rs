//! Storage budget accounting and eviction policies.
//!
//! The quota manager only measures. Eviction itself is a pair of pure functions
//! over the in-memory collection; the page store decides when to call them and
//! takes the snapshot first.

use crate::error::Result;
use crate::model::SavedPage;
use crate::store::backend::KvBackend;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Usage above this percentage marks the store as near its limit.
pub const NEAR_LIMIT_PERCENT: f64 = 80.0;

/// Usage above this percentage triggers emergency cleanup before a save.
pub const OVER_LIMIT_PERCENT: f64 = 95.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaStatus {
    pub bytes_in_use: u64,
    pub quota_bytes: u64,
    pub available_space: u64,
    pub usage_percentage: f64,
    pub is_near_limit: bool,
    pub is_over_limit: bool,
}

impl QuotaStatus {
    pub fn classify(bytes_in_use: u64, quota_bytes: u64) -> Self {
        let usage_percentage = if quota_bytes == 0 {
            100.0
        } else {
            bytes_in_use as f64 / quota_bytes as f64 * 100.0
        };
        Self {
            bytes_in_use,
            quota_bytes,
            available_space: quota_bytes.saturating_sub(bytes_in_use),
            usage_percentage,
            is_near_limit: usage_percentage > NEAR_LIMIT_PERCENT,
            is_over_limit: usage_percentage > OVER_LIMIT_PERCENT,
        }
    }
}

pub struct QuotaManager<B: KvBackend> {
    backend: Arc<B>,
    quota_bytes: u64,
}

impl<B: KvBackend> QuotaManager<B> {
    pub fn new(backend: Arc<B>, quota_bytes: u64) -> Self {
        Self {
            backend,
            quota_bytes,
        }
    }

    pub async fn check(&self) -> Result<QuotaStatus> {
        let used = self.backend.bytes_in_use().await?;
        let status = QuotaStatus::classify(used, self.quota_bytes);
        debug!(
            used,
            quota = self.quota_bytes,
            percent = status.usage_percentage,
            "quota check"
        );
        Ok(status)
    }
}

/// Pages that survive an emergency cleanup of `len` pages.
pub fn emergency_keep_count(len: usize) -> usize {
    len * 3 / 4
}

/// Pages kept when a write is retried after `QuotaExceeded`.
pub fn retry_keep_count(len: usize) -> usize {
    len * 9 / 10
}

/// Keep the head of the collection, returning how many entries were dropped.
pub fn keep_head<T>(pages: &mut Vec<T>, keep: usize) -> usize {
    let dropped = pages.len().saturating_sub(keep);
    pages.truncate(keep);
    dropped
}

/// Drop pages created before `cutoff`, returning how many went.
pub fn evict_older_than(pages: &mut Vec<SavedPage>, cutoff: DateTime<Utc>) -> usize {
    let before = pages.len();
    pages.retain(|p| p.timestamp >= cutoff);
    before - pages.len()
}
