use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

/// Abstract interface for the flat key-value store underneath tabkeep.
///
/// This trait handles the "how" of storage (filesystem vs memory), while the
/// page and settings stores handle the "what" (validation, healing, backups).
///
/// The store assumes nothing beyond per-key read-your-writes: no transactions,
/// no compare-and-swap, no ordering across keys. A `set` touching several keys
/// may land partially.
#[async_trait]
pub trait KvBackend: Send + Sync {
    /// Fetch the given keys. Absent keys are simply missing from the map.
    /// A stored value that cannot be decoded is reported as `StoreError::Corruption`.
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>>;

    /// Write every entry of `items`.
    /// Fails with `StoreError::QuotaExceeded` when the backend is out of space.
    async fn set(&self, items: HashMap<String, Value>) -> Result<()>;

    /// Delete keys. Removing an absent key is not an error.
    async fn remove(&self, keys: &[&str]) -> Result<()>;

    /// Every key currently stored (used to enumerate snapshots).
    async fn keys(&self) -> Result<Vec<String>>;

    /// Total bytes consumed by all stored entries.
    async fn bytes_in_use(&self) -> Result<u64>;
}
