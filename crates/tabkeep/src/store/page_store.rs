//! # Page Store
//!
//! [`PageStore`] owns the saved page collection. It is the only component that
//! writes `savedPages`, and every write funnels through the same few steps:
//!
//! 1. **Load healthy**: read the raw collection, run the corruption detector,
//!    recover from the newest snapshot on wholesale corruption, and drop (then
//!    write back) individual records that no longer parse.
//! 2. **Snapshot**: destructive operations copy pages and settings first. Under
//!    [`BackupPolicy::Required`] a failed snapshot aborts the operation.
//! 3. **Mutate in memory and persist** the whole collection.
//! 4. **Touch metadata** (best effort).
//!
//! The collection is stored newest first. New pages are inserted at the head, so
//! "oldest" always means the tail, which is what eviction trims.
//!
//! ## Serialization
//!
//! A store handle holds an async mutex. Every operation that reads the collection
//! takes it for the whole read-modify-write, so two saves racing on one handle
//! can no longer drop each other's page. Reads take it too because a read can heal.

use super::backend::KvBackend;
use super::settings_store::SettingsStore;
use super::{metadata, read_key, write_key, PAGES_KEY, QUARANTINE_KEY};
use crate::backup::{BackupManager, RecoveryReport, SnapshotId, SnapshotInfo};
use crate::config::{BackupPolicy, StoreConfig};
use crate::corruption;
use crate::error::{Result, StoreError};
use crate::migration::{self, CURRENT_SCHEMA_VERSION};
use crate::model::{
    ExtensionSettings, PageDraft, PagePatch, SavedPage, StoreMetadata, FORMAT_VERSION,
};
use crate::query::{self, PageQuery, QueryResult};
use crate::quota::{self, QuotaManager, QuotaStatus};
use crate::tags::normalize_tag;
use crate::validation::{lacks_times, parse_page, parse_settings, sanitize_page, validate_page};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "page", rename_all = "camelCase")]
pub enum DeleteOutcome {
    Deleted(SavedPage),
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    Delete,
    AddTag(String),
    RemoveTag(String),
}

impl BatchOperation {
    pub fn name(&self) -> &'static str {
        match self {
            BatchOperation::Delete => "delete",
            BatchOperation::AddTag(_) => "addTag",
            BatchOperation::RemoveTag(_) => "removeTag",
        }
    }

    fn normalized(self) -> Result<Self> {
        let normalize = |tag: String| {
            normalize_tag(&tag).ok_or_else(|| StoreError::validation("tag is required"))
        };
        Ok(match self {
            BatchOperation::Delete => BatchOperation::Delete,
            BatchOperation::AddTag(tag) => BatchOperation::AddTag(normalize(tag)?),
            BatchOperation::RemoveTag(tag) => BatchOperation::RemoveTag(normalize(tag)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub operation: String,
    pub requested: usize,
    pub affected: usize,
    /// Requested ids that matched no page.
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub version: String,
    pub export_date: DateTime<Utc>,
    pub pages: Vec<SavedPage>,
    pub settings: ExtensionSettings,
}

/// An import payload. Pages stay raw JSON so each one is validated on its own.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportBundle {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub pages: Vec<Value>,
    #[serde(default)]
    pub settings: Option<Value>,
}

impl ImportBundle {
    pub fn from_export(bundle: &ExportBundle) -> Result<Self> {
        Ok(serde_json::from_value(serde_json::to_value(bundle)?)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidEntry {
    pub index: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub imported: usize,
    /// Incoming pages skipped because their url is already stored.
    pub duplicates: usize,
    pub invalid: Vec<InvalidEntry>,
    pub settings_imported: bool,
    pub settings_errors: Vec<String>,
    pub total_pages: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageInfo {
    pub quota: QuotaStatus,
    pub page_count: usize,
    pub snapshot_count: usize,
    pub metadata: Option<StoreMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceReport {
    pub pruned_snapshots: usize,
    pub light_cleanup_removed: usize,
    pub auto_cleanup_removed: usize,
    pub limit_removed: usize,
    pub quota: QuotaStatus,
}

pub struct PageStore<B: KvBackend> {
    backend: Arc<B>,
    backups: BackupManager<B>,
    quota: QuotaManager<B>,
    settings: SettingsStore<B>,
    config: StoreConfig,
    lock: Mutex<()>,
}

impl<B: KvBackend> PageStore<B> {
    /// Build a store over `backend` without touching it. See [`PageStore::open`].
    pub fn with_backend(backend: Arc<B>, config: StoreConfig) -> Self {
        Self {
            backups: BackupManager::new(backend.clone(), config.backup_retention_days),
            quota: QuotaManager::new(backend.clone(), config.quota_bytes),
            settings: SettingsStore::with_backend(backend.clone()),
            backend,
            config,
            lock: Mutex::new(()),
        }
    }

    /// Build a store and bring the persisted data up to the current schema.
    pub async fn open(backend: Arc<B>, config: StoreConfig) -> Result<Self> {
        let store = Self::with_backend(backend, config);
        store.migrate().await?;
        Ok(store)
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn settings(&self) -> &SettingsStore<B> {
        &self.settings
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    async fn migrate(&self) -> Result<()> {
        let _guard = self.lock.lock().await;

        let stored = metadata::load(self.backend.as_ref()).await?;
        let raw = match self.read_raw_pages().await {
            Ok(raw) => Some(raw),
            Err(e) if e.is_corruption() => None,
            Err(e) => return Err(e),
        };
        let version = match &stored {
            Some(meta) => meta.schema_version,
            // Data without metadata was written before versioning existed.
            None if raw.as_ref().and_then(Value::as_array).is_some_and(|p| !p.is_empty()) => 1,
            None => CURRENT_SCHEMA_VERSION,
        };

        if version > CURRENT_SCHEMA_VERSION {
            warn!(
                version,
                supported = CURRENT_SCHEMA_VERSION,
                "store schema is newer than this build; leaving it untouched"
            );
            return Ok(());
        }

        if version < CURRENT_SCHEMA_VERSION {
            let pages = match raw {
                Some(Value::Array(pages)) => pages,
                Some(Value::Null) => Vec::new(),
                _ => {
                    warn!(version, "page collection unreadable, postponing migration");
                    return Ok(());
                }
            };
            if !pages.is_empty() {
                self.snapshot_before("before_migration").await?;
                let (migrated, reached) = migration::apply(pages, version);
                write_key(self.backend.as_ref(), PAGES_KEY, Value::Array(migrated)).await?;
                info!(from = version, to = reached, "migrated page collection");
            }
            metadata::update(self.backend.as_ref(), |m| {
                m.schema_version = CURRENT_SCHEMA_VERSION
            })
            .await?;
        } else if stored.is_none() {
            let total = raw
                .as_ref()
                .and_then(Value::as_array)
                .map_or(0, Vec::len);
            metadata::update(self.backend.as_ref(), move |m| m.total_pages = total).await?;
        }
        Ok(())
    }

    // --- Internals. Callers hold `self.lock`. ---

    async fn read_raw_pages(&self) -> Result<Value> {
        read_key(self.backend.as_ref(), PAGES_KEY).await
    }

    async fn write_pages(&self, pages: &[SavedPage]) -> Result<()> {
        write_key(self.backend.as_ref(), PAGES_KEY, serde_json::to_value(pages)?).await?;
        debug!(count = pages.len(), "wrote page collection");
        Ok(())
    }

    /// Write, and on `QuotaExceeded` trim the tail to 90% and try once more.
    async fn write_pages_with_retry(&self, pages: &mut Vec<SavedPage>) -> Result<()> {
        match self.write_pages(pages).await {
            Err(e) if e.is_quota_exceeded() => {
                let keep = quota::retry_keep_count(pages.len());
                let dropped = quota::keep_head(pages, keep);
                warn!(dropped, "write rejected for quota, retrying trimmed: {}", e);
                self.write_pages(pages).await
            }
            other => other,
        }
    }

    async fn record_count(&self, total: usize) {
        metadata::touch(self.backend.as_ref(), move |m| m.total_pages = total).await;
    }

    async fn record_cleanup(&self, total: usize) {
        let now = Utc::now();
        metadata::touch(self.backend.as_ref(), move |m| {
            m.total_pages = total;
            m.last_cleanup = Some(now);
        })
        .await;
    }

    async fn snapshot_before(&self, reason: &str) -> Result<Option<SnapshotId>> {
        match self.backups.snapshot(reason).await {
            Ok(id) => Ok(Some(id)),
            Err(e) => match self.config.backup_policy {
                BackupPolicy::Required => Err(match e {
                    StoreError::Backup(_) => e,
                    other => StoreError::Backup(other.to_string()),
                }),
                BackupPolicy::BestEffort => {
                    warn!(reason, "snapshot failed, continuing without one: {}", e);
                    Ok(None)
                }
            },
        }
    }

    async fn recover_from_corruption(&self, issues: Vec<String>) -> Result<RecoveryReport> {
        warn!(issues = issues.len(), "page collection corrupted, recovering");
        match self.backups.recover(None).await {
            Ok(report) => Ok(report),
            Err(e) => {
                error!("no usable snapshot to repair corrupted pages: {}", e);
                Err(StoreError::UnrecoverableCorruption {
                    reason: e.to_string(),
                    issues,
                })
            }
        }
    }

    /// Load the collection in stored order, repairing it on the way.
    async fn load_healthy(&self) -> Result<Vec<SavedPage>> {
        // 1. Read, recovering if the stored value cannot even be decoded
        let raw = match self.read_raw_pages().await {
            Ok(raw) => raw,
            Err(e) if e.is_corruption() => {
                self.recover_from_corruption(vec![e.to_string()]).await?;
                self.read_raw_pages().await?
            }
            Err(e) => return Err(e),
        };

        // 2. Wholesale corruption: replace with the newest snapshot
        let report = corruption::detect(&raw);
        let raw = if report.is_corrupted {
            self.recover_from_corruption(report.issues).await?;
            self.read_raw_pages().await?
        } else {
            raw
        };

        let entries = match raw {
            Value::Array(entries) => entries,
            _ => Vec::new(),
        };

        // 3. Drop individual records that no longer parse
        let mut pages = Vec::with_capacity(entries.len());
        let mut dropped = Vec::new();
        let mut filled = 0;
        for (idx, entry) in entries.iter().enumerate() {
            match parse_page(entry) {
                Ok(page) => {
                    if lacks_times(entry) {
                        filled += 1;
                    }
                    pages.push(page);
                }
                Err(report) => dropped.push(format!("entry {}: {}", idx, report.errors.join(", "))),
            }
        }

        if !dropped.is_empty() {
            warn!(count = dropped.len(), "dropping invalid pages: {}", dropped.join("; "));
            self.snapshot_before("before_cleanup").await?;
            self.write_pages(&pages).await?;
            self.record_count(pages.len()).await;
        } else if filled > 0 {
            // 4. Persist timestamps filled in while parsing
            warn!(count = filled, "filling missing page timestamps");
            self.write_pages(&pages).await?;
        }
        Ok(pages)
    }

    async fn emergency_cleanup(&self) -> Result<usize> {
        let mut pages = self.load_healthy().await?;
        let keep = quota::emergency_keep_count(pages.len());
        if keep == pages.len() {
            return Ok(0);
        }
        self.snapshot_before("before_emergency_cleanup").await?;
        let dropped = quota::keep_head(&mut pages, keep);
        self.write_pages(&pages).await?;
        self.record_cleanup(pages.len()).await;
        info!(dropped, kept = pages.len(), "emergency cleanup");
        Ok(dropped)
    }

    async fn evict_older_than(
        &self,
        pages: &mut Vec<SavedPage>,
        cutoff: DateTime<Utc>,
        reason: &str,
    ) -> Result<usize> {
        if !pages.iter().any(|p| p.timestamp < cutoff) {
            return Ok(0);
        }
        self.snapshot_before(reason).await?;
        let removed = quota::evict_older_than(pages, cutoff);
        self.write_pages(pages).await?;
        self.record_cleanup(pages.len()).await;
        info!(removed, reason, "evicted old pages");
        Ok(removed)
    }

    async fn truncate(&self, pages: &mut Vec<SavedPage>, max: usize) -> Result<usize> {
        if pages.len() <= max {
            return Ok(0);
        }
        self.snapshot_before("before_enforce_limit").await?;
        let removed = quota::keep_head(pages, max);
        self.write_pages(pages).await?;
        self.record_cleanup(pages.len()).await;
        info!(removed, max, "enforced page limit");
        Ok(removed)
    }

    async fn save_locked(&self, mut page: SavedPage) -> Result<SavedPage> {
        if self.quota.check().await?.is_over_limit {
            warn!("storage over limit, running emergency cleanup before save");
            self.emergency_cleanup().await?;
        }

        let mut pages = self.load_healthy().await?;
        match pages.iter().position(|p| p.url == page.url) {
            Some(idx) => {
                page.id = pages[idx].id.clone();
                page.created_at = pages[idx].created_at;
                pages[idx] = page.clone();
                debug!(id = %page.id, "replaced page with the same url");
            }
            None => pages.insert(0, page.clone()),
        }
        self.write_pages_with_retry(&mut pages).await?;

        let total = pages.len();
        let now = Utc::now();
        metadata::touch(self.backend.as_ref(), move |m| {
            m.total_pages = total;
            m.last_page_added = Some(now);
        })
        .await;
        Ok(page)
    }

    // --- Operations ---

    /// Save a page. A page whose url is already stored replaces it, keeping the
    /// stored `id` and `createdAt`.
    pub async fn save(&self, draft: PageDraft) -> Result<SavedPage> {
        let mut page = draft.into_page();
        sanitize_page(&mut page);
        let report = validate_page(&page);
        if !report.is_valid() {
            return Err(StoreError::Validation(report.errors));
        }
        for warning in &report.warnings {
            warn!(url = %page.url, "{}", warning);
        }

        let _guard = self.lock.lock().await;
        match self.save_locked(page.clone()).await {
            Err(e) if e.is_corruption() => {
                warn!("save hit corrupted storage, recovering and retrying once: {}", e);
                self.recover_from_corruption(vec![e.to_string()]).await?;
                self.save_locked(page).await
            }
            other => other,
        }
    }

    /// All pages, newest first.
    pub async fn get_all(&self) -> Result<Vec<SavedPage>> {
        let _guard = self.lock.lock().await;
        let mut pages = self.load_healthy().await?;
        pages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(pages)
    }

    pub async fn get(&self, id: &str) -> Result<Option<SavedPage>> {
        let _guard = self.lock.lock().await;
        Ok(self.load_healthy().await?.into_iter().find(|p| p.id == id))
    }

    pub async fn delete(&self, id: &str) -> Result<DeleteOutcome> {
        let _guard = self.lock.lock().await;
        let mut pages = self.load_healthy().await?;
        let Some(idx) = pages.iter().position(|p| p.id == id) else {
            return Ok(DeleteOutcome::NotFound);
        };
        self.snapshot_before("before_delete").await?;
        let removed = pages.remove(idx);
        self.write_pages(&pages).await?;
        self.record_count(pages.len()).await;
        info!(id, "deleted page");
        Ok(DeleteOutcome::Deleted(removed))
    }

    pub async fn update(&self, id: &str, patch: PagePatch) -> Result<SavedPage> {
        let _guard = self.lock.lock().await;
        let mut pages = self.load_healthy().await?;
        let idx = pages
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let mut page = pages[idx].clone();
        patch.apply(&mut page);
        sanitize_page(&mut page);
        let report = validate_page(&page);
        if !report.is_valid() {
            return Err(StoreError::Validation(report.errors));
        }
        for warning in &report.warnings {
            warn!(id, "{}", warning);
        }

        self.snapshot_before("before_update").await?;
        pages[idx] = page.clone();
        self.write_pages_with_retry(&mut pages).await?;
        self.record_count(pages.len()).await;
        Ok(page)
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SavedPage>> {
        Ok(query::search(self.get_all().await?, query))
    }

    pub async fn filtered_query(&self, query: &PageQuery) -> Result<QueryResult> {
        Ok(query::run(self.get_all().await?, query))
    }

    pub async fn batch_operation(
        &self,
        operation: BatchOperation,
        ids: &[String],
    ) -> Result<BatchReport> {
        let operation = operation.normalized()?;

        let _guard = self.lock.lock().await;
        let mut pages = self.load_healthy().await?;
        self.snapshot_before(&format!("before_batch_{}", operation.name()))
            .await?;

        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let found: HashSet<String> = pages
            .iter()
            .filter(|p| wanted.contains(p.id.as_str()))
            .map(|p| p.id.clone())
            .collect();
        let now = Utc::now();

        let affected = match &operation {
            BatchOperation::Delete => {
                let before = pages.len();
                pages.retain(|p| !wanted.contains(p.id.as_str()));
                before - pages.len()
            }
            BatchOperation::AddTag(tag) => {
                let mut count = 0;
                for page in pages
                    .iter_mut()
                    .filter(|p| wanted.contains(p.id.as_str()) && !p.has_tag(tag))
                {
                    page.tags.push(tag.clone());
                    page.updated_at = now;
                    count += 1;
                }
                count
            }
            BatchOperation::RemoveTag(tag) => {
                let mut count = 0;
                for page in pages
                    .iter_mut()
                    .filter(|p| wanted.contains(p.id.as_str()) && p.has_tag(tag))
                {
                    page.tags.retain(|t| t != tag);
                    page.updated_at = now;
                    count += 1;
                }
                count
            }
        };

        if affected > 0 {
            self.write_pages(&pages).await?;
            self.record_count(pages.len()).await;
        }
        info!(operation = operation.name(), affected, "batch operation");

        let mut seen = HashSet::new();
        let missing = ids
            .iter()
            .filter(|id| !found.contains(id.as_str()) && seen.insert(id.as_str()))
            .cloned()
            .collect();
        Ok(BatchReport {
            operation: operation.name().to_string(),
            requested: ids.len(),
            affected,
            missing,
        })
    }

    /// Keep only the newest `max` pages. Returns how many were dropped.
    pub async fn enforce_limit(&self, max: usize) -> Result<usize> {
        let _guard = self.lock.lock().await;
        let mut pages = self.load_healthy().await?;
        self.truncate(&mut pages, max).await
    }

    pub async fn export_all(&self) -> Result<ExportBundle> {
        let _guard = self.lock.lock().await;
        let mut pages = self.load_healthy().await?;
        pages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(ExportBundle {
            version: FORMAT_VERSION.to_string(),
            export_date: Utc::now(),
            pages,
            settings: self.settings.get().await?,
        })
    }

    /// Merge an import into the store. Stored urls win over incoming ones.
    pub async fn import_all(&self, bundle: ImportBundle) -> Result<ImportReport> {
        let _guard = self.lock.lock().await;
        let mut pages = self.load_healthy().await?;
        self.snapshot_before("before_import").await?;

        let mut report = ImportReport::default();
        let mut urls: HashSet<String> = pages.iter().map(|p| p.url.clone()).collect();
        let mut ids: HashSet<String> = pages.iter().map(|p| p.id.clone()).collect();

        for (index, raw) in bundle.pages.into_iter().enumerate() {
            let raw = migration::upgrade_entry(raw);
            let mut page = match parse_page(&raw) {
                Ok(page) => page,
                Err(validation) => {
                    report.invalid.push(InvalidEntry {
                        index,
                        errors: validation.errors,
                    });
                    continue;
                }
            };
            let updated_at = page.updated_at;
            sanitize_page(&mut page);
            page.updated_at = updated_at;

            if !urls.insert(page.url.clone()) {
                report.duplicates += 1;
                continue;
            }
            if !ids.insert(page.id.clone()) {
                page.id = Uuid::new_v4().to_string();
                ids.insert(page.id.clone());
            }
            pages.push(page);
            report.imported += 1;
        }

        if report.imported > 0 {
            pages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            self.write_pages_with_retry(&mut pages).await?;
            self.record_count(pages.len()).await;
        }
        report.total_pages = pages.len();

        if let Some(raw) = &bundle.settings {
            match parse_settings(raw) {
                Ok(settings) => match self.settings.save(settings).await {
                    Ok(_) => report.settings_imported = true,
                    Err(e) => report.settings_errors.push(e.to_string()),
                },
                Err(validation) => report.settings_errors = validation.errors,
            }
        }

        info!(
            imported = report.imported,
            duplicates = report.duplicates,
            invalid = report.invalid.len(),
            "import finished"
        );
        Ok(report)
    }

    /// Remove every page. Snapshots and settings stay.
    ///
    /// This is also the way out of a collection that is not a list and has no
    /// snapshot to recover from: such a value cannot be snapshotted, so it is
    /// moved to [`QUARANTINE_KEY`] instead.
    pub async fn clear_all(&self) -> Result<usize> {
        let _guard = self.lock.lock().await;
        let raw = match self.read_raw_pages().await {
            Ok(raw) => Some(raw),
            Err(e) if e.is_corruption() => None,
            Err(e) => return Err(e),
        };
        let count = raw
            .as_ref()
            .map_or(0, |raw| corruption::detect(raw).total_count);

        match raw {
            Some(Value::Null) | Some(Value::Array(_)) => {
                self.snapshot_before("before_clear_all").await?;
            }
            Some(other) => {
                warn!("page collection is not a list, moving it to {}", QUARANTINE_KEY);
                write_key(self.backend.as_ref(), QUARANTINE_KEY, other).await?;
            }
            None => warn!("page collection cannot be decoded, clearing without a snapshot"),
        }
        self.backend.remove(&[PAGES_KEY]).await?;
        self.record_cleanup(0).await;
        info!(count, "cleared all pages");
        Ok(count)
    }

    pub async fn storage_info(&self) -> Result<StorageInfo> {
        let _guard = self.lock.lock().await;
        let page_count = match self.read_raw_pages().await {
            Ok(raw) => corruption::detect(&raw).total_count,
            Err(e) if e.is_corruption() => 0,
            Err(e) => return Err(e),
        };
        Ok(StorageInfo {
            quota: self.quota.check().await?,
            page_count,
            snapshot_count: self.backups.snapshot_ids().await?.len(),
            metadata: metadata::load(self.backend.as_ref()).await?,
        })
    }

    /// Routine housekeeping: prune snapshots, then apply the age and size limits.
    pub async fn maintenance(&self) -> Result<MaintenanceReport> {
        let _guard = self.lock.lock().await;
        let pruned_snapshots = match self.backups.prune().await {
            Ok(count) => count,
            Err(e) => {
                warn!("failed to prune snapshots: {}", e);
                0
            }
        };

        let settings = self.settings.get().await?;
        let mut pages = self.load_healthy().await?;
        let now = Utc::now();

        let light_cleanup_removed = if self.quota.check().await?.is_near_limit {
            let cutoff = now - Duration::days(i64::from(self.config.light_cleanup_days));
            self.evict_older_than(&mut pages, cutoff, "before_light_cleanup")
                .await?
        } else {
            0
        };

        let auto_cleanup_removed = if settings.auto_cleanup {
            let cutoff = now - Duration::days(i64::from(settings.cleanup_days));
            self.evict_older_than(&mut pages, cutoff, "before_auto_cleanup")
                .await?
        } else {
            0
        };

        let limit_removed = self
            .truncate(&mut pages, settings.max_storage_items as usize)
            .await?;

        Ok(MaintenanceReport {
            pruned_snapshots,
            light_cleanup_removed,
            auto_cleanup_removed,
            limit_removed,
            quota: self.quota.check().await?,
        })
    }

    pub async fn recover(&self, snapshot_id: Option<&str>) -> Result<RecoveryReport> {
        let _guard = self.lock.lock().await;
        self.backups.recover(snapshot_id).await
    }

    pub async fn list_backups(&self) -> Result<Vec<SnapshotInfo>> {
        self.backups.list().await
    }
}
