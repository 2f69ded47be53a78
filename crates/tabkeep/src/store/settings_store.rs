use super::backend::KvBackend;
use super::{read_key, write_key, SETTINGS_KEY};
use crate::error::{Result, StoreError};
use crate::model::ExtensionSettings;
use crate::validation::{parse_settings, validate_settings};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// The singleton settings record.
///
/// Settings never go through the backup path on their own; they ride along in
/// every page snapshot instead.
pub struct SettingsStore<B: KvBackend> {
    backend: Arc<B>,
}

impl<B: KvBackend> Clone for SettingsStore<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: KvBackend> SettingsStore<B> {
    pub fn with_backend(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Current settings. Defaults when nothing is stored; an invalid stored record
    /// is replaced by defaults.
    pub async fn get(&self) -> Result<ExtensionSettings> {
        let raw = match read_key(self.backend.as_ref(), SETTINGS_KEY).await {
            Ok(raw) => raw,
            Err(e) if e.is_corruption() => {
                warn!("stored settings unreadable, resetting to defaults: {}", e);
                return self.reset().await;
            }
            Err(e) => return Err(e),
        };
        if raw.is_null() {
            return Ok(ExtensionSettings::default());
        }
        match parse_settings(&raw) {
            Ok(settings) => Ok(settings),
            Err(report) => {
                warn!(
                    "stored settings invalid, resetting to defaults: {}",
                    report.errors.join("; ")
                );
                self.reset().await
            }
        }
    }

    pub async fn save(&self, mut settings: ExtensionSettings) -> Result<ExtensionSettings> {
        let report = validate_settings(&settings);
        if !report.is_valid() {
            return Err(StoreError::Validation(report.errors));
        }
        for warning in &report.warnings {
            warn!("settings: {}", warning);
        }
        settings.updated_at = Utc::now();
        write_key(
            self.backend.as_ref(),
            SETTINGS_KEY,
            serde_json::to_value(&settings)?,
        )
        .await?;
        debug!("settings saved");
        Ok(settings)
    }

    /// Merge the keys of a JSON object over the current settings, then save.
    /// `createdAt` and `updatedAt` in the patch are ignored.
    pub async fn update(&self, patch: Value) -> Result<ExtensionSettings> {
        let Value::Object(mut patch) = patch else {
            return Err(StoreError::validation("settings patch must be a JSON object"));
        };
        patch.remove("createdAt");
        patch.remove("updatedAt");

        let current = self.get().await?;
        let mut merged = serde_json::to_value(&current)?;
        if let Value::Object(fields) = &mut merged {
            fields.extend(patch);
        }
        let settings: ExtensionSettings = serde_json::from_value(merged)
            .map_err(|e| StoreError::validation(format!("malformed settings: {}", e)))?;
        self.save(settings).await
    }

    pub async fn reset(&self) -> Result<ExtensionSettings> {
        let defaults = ExtensionSettings::default();
        write_key(
            self.backend.as_ref(),
            SETTINGS_KEY,
            serde_json::to_value(&defaults)?,
        )
        .await?;
        Ok(defaults)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Theme;
    use crate::store::mem_backend::MemBackend;
    use serde_json::json;

    fn store() -> (Arc<MemBackend>, SettingsStore<MemBackend>) {
        let backend = Arc::new(MemBackend::new());
        (backend.clone(), SettingsStore::with_backend(backend))
    }

    #[tokio::test]
    async fn test_get_defaults_when_absent() {
        let (backend, settings) = store();
        let got = settings.get().await.unwrap();
        assert_eq!(got.max_storage_items, 1000);
        assert!(backend.raw(SETTINGS_KEY).is_none());
    }

    #[tokio::test]
    async fn test_invalid_stored_settings_are_replaced() {
        let (backend, settings) = store();
        backend.insert_raw(SETTINGS_KEY, json!({"maxStorageItems": 5}));

        let got = settings.get().await.unwrap();
        assert_eq!(got.max_storage_items, 1000);
        assert_eq!(backend.raw(SETTINGS_KEY).unwrap()["maxStorageItems"], 1000);
    }

    #[tokio::test]
    async fn test_save_reports_every_violation() {
        let (backend, settings) = store();
        let bad = ExtensionSettings {
            max_storage_items: 1,
            grid_columns: 9,
            ..Default::default()
        };
        match settings.save(bad).await {
            Err(StoreError::Validation(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(backend.raw(SETTINGS_KEY).is_none());
    }

    #[tokio::test]
    async fn test_save_bumps_updated_at() {
        let (_backend, settings) = store();
        let before = ExtensionSettings::default();
        let stamp = before.updated_at;
        let saved = settings.save(before).await.unwrap();
        assert!(saved.updated_at >= stamp);
        assert_eq!(settings.get().await.unwrap(), saved);
    }

    #[tokio::test]
    async fn test_update_merges_patch() {
        let (_backend, settings) = store();
        let updated = settings
            .update(json!({"theme": "dark", "gridColumns": 2}))
            .await
            .unwrap();
        assert_eq!(updated.theme, Theme::Dark);
        assert_eq!(updated.grid_columns, 2);
        assert_eq!(updated.max_storage_items, 1000);
    }

    #[tokio::test]
    async fn test_update_rejects_out_of_range_values() {
        let (_backend, settings) = store();
        let err = settings.update(json!({"cleanupDays": 0})).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_reset_persists_defaults() {
        let (backend, settings) = store();
        settings.update(json!({"theme": "light"})).await.unwrap();
        let reset = settings.reset().await.unwrap();
        assert_eq!(reset.theme, Theme::Auto);
        assert_eq!(backend.raw(SETTINGS_KEY).unwrap()["theme"], "auto");
    }
}
