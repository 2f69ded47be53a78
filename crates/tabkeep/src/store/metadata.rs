//! Store metadata sidecar: page count, cleanup/backup/recovery timestamps and the
//! schema version.
//!
//! Metadata is bookkeeping. A failure to update it after a successful page write
//! is logged and swallowed: the primary write already happened and failing the
//! call would misreport it.

use super::backend::KvBackend;
use super::{read_key, write_key, METADATA_KEY};
use crate::error::Result;
use crate::migration::CURRENT_SCHEMA_VERSION;
use crate::model::StoreMetadata;
use tracing::warn;

/// Load the metadata record. An undecodable record is treated as absent.
pub async fn load<B: KvBackend + ?Sized>(backend: &B) -> Result<Option<StoreMetadata>> {
    let raw = match read_key(backend, METADATA_KEY).await {
        Ok(raw) => raw,
        Err(e) if e.is_corruption() => {
            warn!("store metadata unreadable, rebuilding: {}", e);
            return Ok(None);
        }
        Err(e) => return Err(e),
    };
    if raw.is_null() {
        return Ok(None);
    }
    match serde_json::from_value::<StoreMetadata>(raw) {
        Ok(meta) => Ok(Some(meta)),
        Err(e) => {
            warn!("store metadata malformed, rebuilding: {}", e);
            Ok(None)
        }
    }
}

pub async fn save<B: KvBackend + ?Sized>(backend: &B, meta: &StoreMetadata) -> Result<()> {
    write_key(backend, METADATA_KEY, serde_json::to_value(meta)?).await
}

/// Apply `f` to the current metadata (created fresh if missing) and write it back.
pub async fn update<B, F>(backend: &B, f: F) -> Result<StoreMetadata>
where
    B: KvBackend + ?Sized,
    F: FnOnce(&mut StoreMetadata) + Send,
{
    let mut meta = load(backend)
        .await?
        .unwrap_or_else(|| StoreMetadata::new(CURRENT_SCHEMA_VERSION));
    f(&mut meta);
    save(backend, &meta).await?;
    Ok(meta)
}

/// Best-effort variant of [`update`].
pub async fn touch<B, F>(backend: &B, f: F)
where
    B: KvBackend + ?Sized,
    F: FnOnce(&mut StoreMetadata) + Send,
{
    if let Err(e) = update(backend, f).await {
        warn!("failed to update store metadata: {}", e);
    }
}
