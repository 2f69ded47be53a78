use super::backend::KvBackend;
use crate::error::{Result, StoreError};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Default)]
struct Faults {
    fail_all_writes: bool,
    fail_write_prefix: Option<String>,
    unreadable: HashSet<String>,
    capacity: Option<u64>,
    reported_usage: Option<u64>,
    /// (needle, remaining): writes whose values mention `needle` fail as corrupt.
    corrupt_writes: Option<(String, usize)>,
}

/// In-memory backend for tests and ephemeral stores.
///
/// Besides plain storage it can simulate the failures a real browser storage
/// area produces: write errors, a hard capacity (`QuotaExceeded`), entries that
/// no longer decode or cannot be encoded (`Corruption`), and a faked byte count
/// for quota tests.
#[derive(Default)]
pub struct MemBackend {
    entries: Mutex<BTreeMap<String, Value>>,
    faults: Mutex<Faults>,
}

fn entry_size(key: &str, value: &Value) -> u64 {
    (key.len() + value.to_string().len()) as u64
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes once the stored bytes would exceed `capacity`.
    pub fn with_capacity(capacity: u64) -> Self {
        let backend = Self::default();
        backend.faults.lock().capacity = Some(capacity);
        backend
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.faults.lock().fail_all_writes = simulate;
    }

    /// Fail only writes whose key starts with `prefix` (e.g. `"backup_"`).
    pub fn set_fail_writes_with_prefix(&self, prefix: Option<&str>) {
        self.faults.lock().fail_write_prefix = prefix.map(str::to_string);
    }

    /// Make reads of `key` fail as if the stored bytes were garbage.
    /// Cleared by the next successful write to that key.
    pub fn set_unreadable(&self, key: &str) {
        self.faults.lock().unreadable.insert(key.to_string());
    }

    /// Fail the next `times` writes whose values contain `needle` with `Corruption`.
    pub fn set_corrupt_writes_containing(&self, needle: &str, times: usize) {
        self.faults.lock().corrupt_writes = Some((needle.to_string(), times));
    }

    pub fn set_capacity(&self, capacity: Option<u64>) {
        self.faults.lock().capacity = capacity;
    }

    /// Report a fixed `bytes_in_use` instead of measuring.
    pub fn set_reported_usage(&self, usage: Option<u64>) {
        self.faults.lock().reported_usage = usage;
    }

    /// Test helper: store a value directly, bypassing capacity and fault checks.
    pub fn insert_raw(&self, key: &str, value: Value) {
        self.entries.lock().insert(key.to_string(), value);
    }

    /// Test helper: read a value directly, ignoring unreadable markers.
    pub fn raw(&self, key: &str) -> Option<Value> {
        self.entries.lock().get(key).cloned()
    }

    fn measured_usage(entries: &BTreeMap<String, Value>) -> u64 {
        entries.iter().map(|(k, v)| entry_size(k, v)).sum()
    }
}

#[async_trait]
impl KvBackend for MemBackend {
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>> {
        let faults = self.faults.lock();
        let entries = self.entries.lock();
        let mut out = HashMap::new();
        for key in keys {
            if faults.unreadable.contains(*key) && entries.contains_key(*key) {
                return Err(StoreError::Corruption(format!(
                    "stored value for '{}' cannot be decoded",
                    key
                )));
            }
            if let Some(value) = entries.get(*key) {
                out.insert(key.to_string(), value.clone());
            }
        }
        Ok(out)
    }

    async fn set(&self, items: HashMap<String, Value>) -> Result<()> {
        let mut faults = self.faults.lock();
        if faults.fail_all_writes {
            return Err(StoreError::Backend("Simulated write error".to_string()));
        }
        if let Some(prefix) = &faults.fail_write_prefix {
            if items.keys().any(|k| k.starts_with(prefix.as_str())) {
                return Err(StoreError::Backend(format!(
                    "Simulated write error for '{}*'",
                    prefix
                )));
            }
        }

        if let Some((needle, remaining)) = faults.corrupt_writes.as_mut() {
            if *remaining > 0 && items.values().any(|v| v.to_string().contains(needle.as_str())) {
                *remaining -= 1;
                return Err(StoreError::Corruption(
                    "stored value could not be encoded".to_string(),
                ));
            }
        }

        let mut entries = self.entries.lock();
        if let Some(capacity) = faults.capacity {
            let mut projected = entries.clone();
            for (k, v) in &items {
                projected.insert(k.clone(), v.clone());
            }
            let needed = Self::measured_usage(&projected);
            if needed > capacity {
                return Err(StoreError::QuotaExceeded(format!(
                    "write needs {} bytes, capacity is {}",
                    needed, capacity
                )));
            }
        }

        for (k, v) in items {
            faults.unreadable.remove(&k);
            entries.insert(k, v);
        }
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<()> {
        let mut faults = self.faults.lock();
        if faults.fail_all_writes {
            return Err(StoreError::Backend("Simulated write error".to_string()));
        }
        let mut entries = self.entries.lock();
        for key in keys {
            entries.remove(*key);
            faults.unreadable.remove(*key);
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.lock().keys().cloned().collect())
    }

    async fn bytes_in_use(&self) -> Result<u64> {
        if let Some(usage) = self.faults.lock().reported_usage {
            return Ok(usage);
        }
        Ok(Self::measured_usage(&self.entries.lock()))
    }
}
