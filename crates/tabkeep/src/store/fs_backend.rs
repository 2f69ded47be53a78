use super::backend::KvBackend;
use crate::error::{Result, StoreError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// Filesystem backend: one pretty-printed JSON file per key under a root directory.
///
/// ```text
/// <root>/
/// ├── savedPages.json
/// ├── extensionSettings.json
/// ├── storageMetadata.json
/// └── backup_<millis>.json
/// ```
///
/// Every file is written atomically (tmp file + rename), so a crash leaves either
/// the old or the new value, never half of one. A multi-key `set` is not atomic
/// as a whole.
pub struct FsBackend {
    root: PathBuf,
    capacity: Option<u64>,
}

impl FsBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            capacity: None,
        }
    }

    /// Reject writes that would grow the directory beyond `capacity` bytes.
    pub fn with_capacity(mut self, capacity: u64) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        if !is_valid_key(key) {
            return Err(StoreError::Backend(format!("invalid key '{}'", key)));
        }
        Ok(self.root.join(format!("{}.json", key)))
    }

    async fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    async fn file_len(path: &Path) -> Result<u64> {
        match fs::metadata(path).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[async_trait]
impl KvBackend for FsBackend {
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>> {
        let mut out = HashMap::new();
        for key in keys {
            let path = self.key_path(key)?;
            let content = match fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(StoreError::Io(e)),
            };
            let value: Value = serde_json::from_str(&content).map_err(|e| {
                StoreError::Corruption(format!("{} cannot be decoded: {}", path.display(), e))
            })?;
            out.insert(key.to_string(), value);
        }
        Ok(out)
    }

    async fn set(&self, items: HashMap<String, Value>) -> Result<()> {
        self.ensure_root().await?;

        let mut encoded = Vec::with_capacity(items.len());
        for (key, value) in &items {
            let path = self.key_path(key)?;
            let content = serde_json::to_string_pretty(value)?;
            encoded.push((path, content));
        }

        if let Some(capacity) = self.capacity {
            let mut projected = self.bytes_in_use().await?;
            for (path, content) in &encoded {
                projected = projected.saturating_sub(Self::file_len(path).await?);
                projected += content.len() as u64;
            }
            if projected > capacity {
                return Err(StoreError::QuotaExceeded(format!(
                    "write needs {} bytes, capacity is {}",
                    projected, capacity
                )));
            }
        }

        for (path, content) in encoded {
            // Atomic write
            let tmp_path = self.root.join(format!(".kv-{}.tmp", Uuid::new_v4()));
            let written = match fs::write(&tmp_path, content).await {
                Ok(()) => fs::rename(&tmp_path, &path).await,
                Err(e) => Err(e),
            };
            if let Err(e) = written {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(StoreError::Io(e));
            }
        }
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            let path = self.key_path(key)?;
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::Io(e)),
            }
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(keys),
            Err(e) => return Err(StoreError::Io(e)),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if is_valid_key(stem) {
                    keys.push(stem.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    async fn bytes_in_use(&self) -> Result<u64> {
        let mut total = 0;
        for key in self.keys().await? {
            total += Self::file_len(&self.key_path(&key)?).await?;
        }
        Ok(total)
    }
}
