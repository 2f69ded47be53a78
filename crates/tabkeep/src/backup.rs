//! # Backup Snapshots
//!
//! Every destructive operation first copies pages and settings into an immutable
//! snapshot stored under `backup_<unix-millis>`. Snapshots are self-contained:
//! recovering from one never needs another.
//!
//! ```text
//! backup_1718000000000 = {
//!   "reason": "before_delete",
//!   "timestamp": "2024-06-10T06:13:20Z",
//!   "pages": [ ... ],
//!   "settings": { ... } | null
//! }
//! ```
//!
//! Age is judged by the id suffix, not the embedded timestamp, so pruning works
//! even when a snapshot body no longer decodes.

use crate::error::{Result, StoreError};
use crate::store::backend::KvBackend;
use crate::store::{metadata, read_key, BACKUP_PREFIX, PAGES_KEY, SETTINGS_KEY};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(String);

impl SnapshotId {
    fn from_millis(millis: i64) -> Self {
        SnapshotId(format!("{}{}", BACKUP_PREFIX, millis))
    }

    /// Parse a storage key. Returns `None` for keys outside the backup namespace.
    pub fn parse(key: &str) -> Option<Self> {
        key.starts_with(BACKUP_PREFIX)
            .then(|| SnapshotId(key.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Creation time encoded in the id, if the suffix is a number.
    pub fn timestamp_millis(&self) -> Option<i64> {
        self.0.strip_prefix(BACKUP_PREFIX)?.parse().ok()
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupSnapshot {
    pub reason: String,
    pub timestamp: DateTime<Utc>,
    pub pages: Vec<Value>,
    #[serde(default)]
    pub settings: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotInfo {
    pub id: SnapshotId,
    pub reason: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub page_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryReport {
    pub snapshot_id: SnapshotId,
    pub recovered_page_count: usize,
    pub snapshot_timestamp: Option<DateTime<Utc>>,
}

pub struct BackupManager<B: KvBackend> {
    backend: Arc<B>,
    retention: Duration,
}

impl<B: KvBackend> BackupManager<B> {
    pub fn new(backend: Arc<B>, retention_days: u32) -> Self {
        Self {
            backend,
            retention: Duration::days(i64::from(retention_days)),
        }
    }

    /// All snapshot ids, newest first. Ids without a numeric suffix sort last.
    pub async fn snapshot_ids(&self) -> Result<Vec<SnapshotId>> {
        let mut ids: Vec<SnapshotId> = self
            .backend
            .keys()
            .await?
            .iter()
            .filter_map(|k| SnapshotId::parse(k))
            .collect();
        ids.sort_by(|a, b| {
            b.timestamp_millis()
                .cmp(&a.timestamp_millis())
                .then_with(|| b.cmp(a))
        });
        Ok(ids)
    }

    /// Copy the current pages and settings into a new snapshot.
    pub async fn snapshot(&self, reason: &str) -> Result<SnapshotId> {
        let mut current = self
            .backend
            .get(&[PAGES_KEY, SETTINGS_KEY])
            .await
            .map_err(|e| StoreError::Backup(format!("cannot read current data: {}", e)))?;

        let pages = match current.remove(PAGES_KEY) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(pages)) => pages,
            Some(_) => {
                return Err(StoreError::Backup(
                    "page collection is not a list; refusing to snapshot it".to_string(),
                ))
            }
        };
        let settings = current.remove(SETTINGS_KEY).filter(|v| !v.is_null());

        let now = Utc::now();
        let taken: HashSet<SnapshotId> = self.snapshot_ids().await?.into_iter().collect();
        let mut millis = now.timestamp_millis();
        while taken.contains(&SnapshotId::from_millis(millis)) {
            millis += 1;
        }
        let id = SnapshotId::from_millis(millis);

        let snapshot = BackupSnapshot {
            reason: reason.to_string(),
            timestamp: now,
            pages,
            settings,
        };
        let page_count = snapshot.pages.len();
        self.backend
            .set(HashMap::from([(
                id.to_string(),
                serde_json::to_value(&snapshot)?,
            )]))
            .await
            .map_err(|e| StoreError::Backup(format!("cannot write {}: {}", id, e)))?;
        info!(snapshot = %id, reason, pages = page_count, "snapshot created");

        metadata::touch(self.backend.as_ref(), |m| m.last_backup = Some(now)).await;
        if let Err(e) = self.prune().await {
            warn!("failed to prune expired snapshots: {}", e);
        }
        Ok(id)
    }

    /// Delete snapshots older than the retention window. Returns how many went.
    pub async fn prune(&self) -> Result<usize> {
        let cutoff = (Utc::now() - self.retention).timestamp_millis();
        let expired: Vec<SnapshotId> = self
            .snapshot_ids()
            .await?
            .into_iter()
            .filter(|id| id.timestamp_millis().is_some_and(|ms| ms < cutoff))
            .collect();
        if expired.is_empty() {
            return Ok(0);
        }
        let keys: Vec<&str> = expired.iter().map(SnapshotId::as_str).collect();
        self.backend.remove(&keys).await?;
        info!(count = expired.len(), "pruned expired snapshots");
        Ok(expired.len())
    }

    pub async fn load(&self, id: &SnapshotId) -> Result<BackupSnapshot> {
        let raw = read_key(self.backend.as_ref(), id.as_str()).await?;
        if raw.is_null() {
            return Err(StoreError::Recovery(format!("snapshot {} not found", id)));
        }
        let obj = raw
            .as_object()
            .ok_or_else(|| StoreError::Recovery(format!("snapshot {} is not an object", id)))?;
        let pages = obj
            .get("pages")
            .and_then(Value::as_array)
            .cloned()
            .ok_or_else(|| StoreError::Recovery(format!("snapshot {} has no page list", id)))?;
        let timestamp = obj
            .get("timestamp")
            .cloned()
            .and_then(|v| serde_json::from_value::<DateTime<Utc>>(v).ok())
            .or_else(|| id.timestamp_millis().and_then(DateTime::from_timestamp_millis))
            .unwrap_or_else(Utc::now);
        Ok(BackupSnapshot {
            reason: obj
                .get("reason")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            timestamp,
            pages,
            settings: obj.get("settings").cloned().filter(|v| !v.is_null()),
        })
    }

    /// Newest first. Snapshots that cannot be read are skipped.
    pub async fn list(&self) -> Result<Vec<SnapshotInfo>> {
        let mut infos = Vec::new();
        for id in self.snapshot_ids().await? {
            match self.load(&id).await {
                Ok(snapshot) => infos.push(SnapshotInfo {
                    id,
                    reason: snapshot.reason,
                    timestamp: Some(snapshot.timestamp),
                    page_count: snapshot.pages.len(),
                }),
                Err(e) => debug!(snapshot = %id, "skipping unreadable snapshot: {}", e),
            }
        }
        Ok(infos)
    }

    /// Restore pages and settings from `id`, or from the newest snapshot.
    pub async fn recover(&self, id: Option<&str>) -> Result<RecoveryReport> {
        let id = match id {
            Some(raw) => SnapshotId::parse(raw)
                .ok_or_else(|| StoreError::Recovery(format!("'{}' is not a snapshot id", raw)))?,
            None => self
                .snapshot_ids()
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| StoreError::Recovery("no backup snapshot available".to_string()))?,
        };
        let snapshot = self.load(&id).await?;
        let recovered = snapshot.pages.len();

        let mut items = HashMap::from([(PAGES_KEY.to_string(), Value::Array(snapshot.pages))]);
        if let Some(settings) = snapshot.settings {
            items.insert(SETTINGS_KEY.to_string(), settings);
        }
        self.backend.set(items).await.map_err(|e| {
            StoreError::Recovery(format!("cannot restore from {}: {}", id, e))
        })?;

        metadata::touch(self.backend.as_ref(), |m| {
            m.last_recovery = Some(Utc::now());
            m.total_pages = recovered;
        })
        .await;
        info!(snapshot = %id, pages = recovered, "recovered from snapshot");

        Ok(RecoveryReport {
            snapshot_id: id,
            recovered_page_count: recovered,
            snapshot_timestamp: Some(snapshot.timestamp),
        })
    }
}
