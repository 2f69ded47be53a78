//! # Configuration
//!
//! Store tuning is managed by [`confique`], which handles layered loading from
//! environment variables, an optional TOML file, and compiled defaults.
//!
//! ## Resolution Order
//!
//! 1. **Environment variables**: `TABKEEP_QUOTA_BYTES`, `TABKEEP_BACKUP_POLICY`, etc.
//! 2. **Config file**: `tabkeep.toml` in the data directory, if it exists.
//! 3. **Compiled Defaults**: Built-in fallbacks via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `quota_bytes` | `5242880` | Storage budget the quota manager measures against |
//! | `backup_retention_days` | `7` | Snapshots older than this are pruned |
//! | `light_cleanup_days` | `180` | Age limit applied by maintenance when near the quota |
//! | `backup_policy` | `required` | `required` blocks destructive operations when the snapshot fails; `best_effort` logs and continues |
//!
//! User-facing preferences (AI provider, theme, auto cleanup) are not here: they
//! are [`crate::model::ExtensionSettings`], persisted in the store itself.

use crate::error::{Result, StoreError};
use confique::Config;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "tabkeep.toml";

/// What to do when the snapshot guarding a destructive operation cannot be written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupPolicy {
    /// Abort the operation with [`StoreError::Backup`].
    #[default]
    Required,
    /// Log a warning and carry on without a snapshot.
    BestEffort,
}

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Storage budget in bytes (browser local storage allows 5 MiB).
    #[config(default = 5242880, env = "TABKEEP_QUOTA_BYTES")]
    pub quota_bytes: u64,

    /// Days a snapshot is kept before pruning.
    #[config(default = 7, env = "TABKEEP_BACKUP_RETENTION_DAYS")]
    pub backup_retention_days: u32,

    /// Pages older than this many days go when maintenance finds the store near its quota.
    #[config(default = 180, env = "TABKEEP_LIGHT_CLEANUP_DAYS")]
    pub light_cleanup_days: u32,

    #[config(default = "required", env = "TABKEEP_BACKUP_POLICY")]
    pub backup_policy: BackupPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            quota_bytes: 5 * 1024 * 1024,
            backup_retention_days: 7,
            light_cleanup_days: 180,
            backup_policy: BackupPolicy::Required,
        }
    }
}

impl StoreConfig {
    /// Load from the environment, then `file` (ignored when missing), then defaults.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = StoreConfig::builder().env();
        if let Some(path) = file {
            builder = builder.file(path);
        }
        builder
            .load()
            .map_err(|e| StoreError::Config(e.to_string()))
    }

    pub fn with_quota_bytes(mut self, quota_bytes: u64) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    pub fn with_backup_policy(mut self, policy: BackupPolicy) -> Self {
        self.backup_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.quota_bytes, 5_242_880);
        assert_eq!(config.backup_retention_days, 7);
        assert_eq!(config.light_cleanup_days, 180);
        assert_eq!(config.backup_policy, BackupPolicy::Required);
    }

    #[test]
    fn test_builders() {
        let config = StoreConfig::default()
            .with_quota_bytes(1024)
            .with_backup_policy(BackupPolicy::BestEffort);
        assert_eq!(config.quota_bytes, 1024);
        assert_eq!(config.backup_policy, BackupPolicy::BestEffort);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            "backup_retention_days = 3\nbackup_policy = \"best_effort\"\n",
        )
        .unwrap();

        let config = StoreConfig::load(Some(&path)).unwrap();
        assert_eq!(config.backup_retention_days, 3);
        assert_eq!(config.backup_policy, BackupPolicy::BestEffort);
        assert_eq!(config.light_cleanup_days, 180);
    }

    #[test]
    fn test_load_with_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = StoreConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.light_cleanup_days, 180);
    }

    #[test]
    fn test_policy_serializes_snake_case() {
        let value = serde_json::to_value(BackupPolicy::BestEffort).unwrap();
        assert_eq!(value, "best_effort");
    }
}
