//! # API Facade
//!
//! The API layer is a **thin facade** over the page and settings stores. It is the
//! single entry point for UI and messaging layers, and the place where typed
//! errors turn into the uniform response envelope those layers expect:
//!
//! ```text
//! { "success": true,  "data": ... }
//! { "success": false, "error": "Page not found: 3f2a..." }
//! ```
//!
//! ## What the API Does NOT Do
//!
//! - **Business logic**: That belongs in [`crate::store`].
//! - **I/O formatting**: No stdout, stderr, or pretty printing.
//!
//! `TabkeepApi<B: KvBackend>` is generic over the backend, so the API is tested
//! against [`crate::store::mem_backend::MemBackend`] without touching disk.

use crate::backup::{RecoveryReport, SnapshotInfo};
use crate::config::StoreConfig;
use crate::error::Result;
use crate::model::{ExtensionSettings, PageDraft, PagePatch, SavedPage};
use crate::query::{PageQuery, QueryResult};
use crate::store::backend::KvBackend;
use crate::store::page_store::{
    BatchOperation, BatchReport, DeleteOutcome, ExportBundle, ImportBundle, ImportReport,
    MaintenanceReport, PageStore, StorageInfo,
};
use crate::store::settings_store::SettingsStore;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Uniform response envelope. Exactly one of `data` / `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

impl<T> From<Result<T>> for ApiResponse<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => ApiResponse::ok(data),
            Err(e) => {
                debug!("operation failed: {}", e);
                ApiResponse::err(e.to_string())
            }
        }
    }
}

/// The main API facade for tabkeep operations.
pub struct TabkeepApi<B: KvBackend> {
    pages: PageStore<B>,
    settings: SettingsStore<B>,
}

impl<B: KvBackend> TabkeepApi<B> {
    /// Open the stores over `backend`, running pending schema migrations.
    pub async fn open(backend: Arc<B>, config: StoreConfig) -> Result<Self> {
        let pages = PageStore::open(backend, config).await?;
        let settings = pages.settings().clone();
        Ok(Self { pages, settings })
    }

    pub fn pages(&self) -> &PageStore<B> {
        &self.pages
    }

    pub async fn save(&self, draft: PageDraft) -> ApiResponse<SavedPage> {
        self.pages.save(draft).await.into()
    }

    pub async fn get_all(&self) -> ApiResponse<Vec<SavedPage>> {
        self.pages.get_all().await.into()
    }

    pub async fn get(&self, id: &str) -> ApiResponse<Option<SavedPage>> {
        self.pages.get(id).await.into()
    }

    pub async fn delete(&self, id: &str) -> ApiResponse<DeleteOutcome> {
        self.pages.delete(id).await.into()
    }

    pub async fn update(&self, id: &str, patch: PagePatch) -> ApiResponse<SavedPage> {
        self.pages.update(id, patch).await.into()
    }

    pub async fn search(&self, query: &str) -> ApiResponse<Vec<SavedPage>> {
        self.pages.search(query).await.into()
    }

    pub async fn filtered_query(&self, query: &PageQuery) -> ApiResponse<QueryResult> {
        self.pages.filtered_query(query).await.into()
    }

    pub async fn batch_operation(
        &self,
        operation: BatchOperation,
        ids: &[String],
    ) -> ApiResponse<BatchReport> {
        self.pages.batch_operation(operation, ids).await.into()
    }

    pub async fn enforce_limit(&self, max: usize) -> ApiResponse<usize> {
        self.pages.enforce_limit(max).await.into()
    }

    pub async fn export_all(&self) -> ApiResponse<ExportBundle> {
        self.pages.export_all().await.into()
    }

    pub async fn import_all(&self, bundle: ImportBundle) -> ApiResponse<ImportReport> {
        self.pages.import_all(bundle).await.into()
    }

    pub async fn clear_all(&self) -> ApiResponse<usize> {
        self.pages.clear_all().await.into()
    }

    pub async fn storage_info(&self) -> ApiResponse<StorageInfo> {
        self.pages.storage_info().await.into()
    }

    pub async fn maintenance(&self) -> ApiResponse<MaintenanceReport> {
        self.pages.maintenance().await.into()
    }

    pub async fn recover(&self, snapshot_id: Option<&str>) -> ApiResponse<RecoveryReport> {
        self.pages.recover(snapshot_id).await.into()
    }

    pub async fn list_backups(&self) -> ApiResponse<Vec<SnapshotInfo>> {
        self.pages.list_backups().await.into()
    }

    pub async fn get_settings(&self) -> ApiResponse<ExtensionSettings> {
        self.settings.get().await.into()
    }

    pub async fn save_settings(&self, settings: ExtensionSettings) -> ApiResponse<ExtensionSettings> {
        self.settings.save(settings).await.into()
    }

    pub async fn update_settings(&self, patch: Value) -> ApiResponse<ExtensionSettings> {
        self.settings.update(patch).await.into()
    }

    pub async fn reset_settings(&self) -> ApiResponse<ExtensionSettings> {
        self.settings.reset().await.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mem_backend::MemBackend;
    use serde_json::json;

    async fn api() -> TabkeepApi<MemBackend> {
        TabkeepApi::open(Arc::new(MemBackend::new()), StoreConfig::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_success_envelope() {
        let api = api().await;
        let response = api.save(PageDraft::new("https://example.com", "Example")).await;
        assert!(response.success);
        assert!(response.error.is_none());

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["data"]["url"], "https://example.com");
        assert!(value.get("error").is_none());
    }

    #[tokio::test]
    async fn test_errors_become_failure_envelope() {
        let api = api().await;
        let response = api.update("missing", PagePatch::default()).await;
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.error.as_deref(), Some("Page not found: missing"));

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value, json!({"success": false, "error": "Page not found: missing"}));
    }

    #[tokio::test]
    async fn test_validation_failure_lists_errors() {
        let api = api().await;
        let response = api.save(PageDraft::new("", "")).await;
        assert!(!response.success);
        let error = response.error.unwrap();
        assert!(error.contains("url is required"));
        assert!(error.contains("title is required"));
    }

    #[tokio::test]
    async fn test_settings_round_trip_through_api() {
        let api = api().await;
        let updated = api.update_settings(json!({"theme": "dark"})).await;
        assert!(updated.success);
        let fetched = api.get_settings().await;
        assert_eq!(fetched.data, updated.data);

        let reset = api.reset_settings().await;
        assert_eq!(serde_json::to_value(reset.data.unwrap()).unwrap()["theme"], "auto");
    }

    #[tokio::test]
    async fn test_settings_validation_error() {
        let api = api().await;
        let bad = ExtensionSettings {
            thumbnail_quality: 2.0,
            ..Default::default()
        };
        let response = api.save_settings(bad).await;
        assert!(!response.success);
        assert!(response.error.unwrap().contains("thumbnailQuality"));
    }
}
