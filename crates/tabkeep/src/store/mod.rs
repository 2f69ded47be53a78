//! # Storage Layer
//!
//! This module defines the storage abstraction for tabkeep. The [`backend::KvBackend`]
//! trait is a flat key-value contract modelled on a browser extension's local
//! storage area: `get`, `set`, `remove`, and a byte count. Nothing more.
//!
//! ## Self-Healing Store
//!
//! The backing store is assumed to be hostile:
//! 1. **Writes can fail midway** (quota, I/O), and multi-key writes are not atomic.
//! 2. **A crashed session can leave garbage** in the page collection.
//! 3. **Space runs out**, and the browser rejects the write.
//!
//! The store never trusts what it reads. Every read path runs the corruption
//! detector; a few bad records are filtered out and the survivors written back,
//! while wholesale corruption triggers recovery from the newest snapshot.
//!
//! ### Philosophy
//! - **Snapshot before destroy**: Deletes, updates, batch operations, evictions
//!   and imports all snapshot pages + settings first.
//! - **No silent data loss**: If corruption is found and no snapshot can repair it,
//!   the caller gets `UnrecoverableCorruption` and the data stays where it is.
//! - **No cache**: Every operation re-reads the backend.
//!
//! ## Storage Layout
//!
//! ```text
//! savedPages          # Array of SavedPage, newest first
//! extensionSettings   # ExtensionSettings singleton
//! storageMetadata     # StoreMetadata sidecar
//! backup_<millis>     # One immutable snapshot per destructive operation
//! savedPagesQuarantine  # Last unsnapshottable collection removed by clear_all
//! ```
//!
//! ## Implementations
//!
//! - [`fs_backend::FsBackend`]: One JSON file per key, atomic writes.
//! - [`mem_backend::MemBackend`]: In memory, with fault injection for tests.

use crate::error::Result;
use serde_json::Value;
use std::collections::HashMap;

pub mod backend;
pub mod fs_backend;
pub mod mem_backend;
pub mod metadata;
pub mod page_store;
pub mod settings_store;

use backend::KvBackend;

pub const PAGES_KEY: &str = "savedPages";
pub const SETTINGS_KEY: &str = "extensionSettings";
pub const METADATA_KEY: &str = "storageMetadata";
pub const BACKUP_PREFIX: &str = "backup_";
/// Where `clear_all` parks a page collection too broken to snapshot.
pub const QUARANTINE_KEY: &str = "savedPagesQuarantine";

/// Read one key, returning `Value::Null` when it is absent.
pub(crate) async fn read_key<B: KvBackend + ?Sized>(backend: &B, key: &str) -> Result<Value> {
    let mut values = backend.get(&[key]).await?;
    Ok(values.remove(key).unwrap_or(Value::Null))
}

pub(crate) async fn write_key<B: KvBackend + ?Sized>(
    backend: &B,
    key: &str,
    value: Value,
) -> Result<()> {
    backend
        .set(HashMap::from([(key.to_string(), value)]))
        .await
}
