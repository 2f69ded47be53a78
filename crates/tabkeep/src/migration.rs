//! # Schema Migrations
//!
//! Persisted pages carry no per-record version; the schema version lives in the
//! store metadata. Migrations are an ordered list of `(from_version, transform)`
//! steps. Opening a store applies every step whose `from_version` is at or above
//! the stored version, in order, then stamps [`CURRENT_SCHEMA_VERSION`].
//!
//! Adding a version means appending one step; existing steps never change.
//!
//! ## Versions
//!
//! | Version | Shape |
//! |---------|-------|
//! | 1 | Written by the JavaScript extension. Timestamps are epoch milliseconds; `tags`, `isArchived`, `createdAt`, `updatedAt` may be missing. |
//! | 2 | RFC 3339 timestamps, every field present. |
//!
//! Transforms work on raw JSON and leave entries they do not understand alone;
//! the corruption detector and validator deal with those afterwards.

use chrono::{DateTime, SecondsFormat};
use serde_json::{Map, Value};

pub const CURRENT_SCHEMA_VERSION: u32 = 2;

pub struct Migration {
    pub from_version: u32,
    pub description: &'static str,
    pub transform: fn(Vec<Value>) -> Vec<Value>,
}

const MIGRATIONS: &[Migration] = &[Migration {
    from_version: 1,
    description: "epoch-millisecond timestamps to RFC 3339, fill missing fields",
    transform: v1_to_v2,
}];

pub fn migrations() -> &'static [Migration] {
    MIGRATIONS
}

/// Steps that still need to run for data at `version`, in order.
pub fn pending(version: u32) -> impl Iterator<Item = &'static Migration> {
    MIGRATIONS.iter().filter(move |m| m.from_version >= version)
}

/// Run all pending steps. Returns the migrated pages and the resulting version.
pub fn apply(mut pages: Vec<Value>, version: u32) -> (Vec<Value>, u32) {
    let mut current = version;
    for step in pending(version) {
        pages = (step.transform)(pages);
        current = step.from_version + 1;
    }
    (pages, current.max(version))
}

/// Bring one entry of unknown vintage up to the current shape.
///
/// Imports carry no schema version, and exports from the JavaScript extension
/// hold version 1 entries, so every imported entry goes through here. The
/// step is a no-op on entries that already have the current shape.
pub fn upgrade_entry(entry: Value) -> Value {
    match entry {
        Value::Object(obj) => Value::Object(upgrade_v1_page(obj)),
        other => other,
    }
}

fn millis_to_rfc3339(value: &Value) -> Option<Value> {
    let millis = value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))?;
    let dt = DateTime::from_timestamp_millis(millis)?;
    Some(Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true)))
}

fn v1_to_v2(pages: Vec<Value>) -> Vec<Value> {
    pages.into_iter().map(upgrade_entry).collect()
}

fn upgrade_v1_page(mut obj: Map<String, Value>) -> Map<String, Value> {
    for key in ["timestamp", "createdAt", "updatedAt"] {
        if let Some(converted) = obj.get(key).filter(|v| v.is_number()).and_then(millis_to_rfc3339)
        {
            obj.insert(key.to_string(), converted);
        }
    }

    if !obj.get("createdAt").is_some_and(Value::is_string) {
        if let Some(ts) = obj.get("timestamp").filter(|v| v.is_string()).cloned() {
            obj.insert("createdAt".to_string(), ts);
        }
    }
    if !obj.get("updatedAt").is_some_and(Value::is_string) {
        if let Some(created) = obj.get("createdAt").filter(|v| v.is_string()).cloned() {
            obj.insert("updatedAt".to_string(), created);
        }
    }
    if !obj.get("tags").is_some_and(Value::is_array) {
        obj.insert("tags".to_string(), Value::Array(Vec::new()));
    }
    if !obj.get("isArchived").is_some_and(Value::is_boolean) {
        obj.insert("isArchived".to_string(), Value::Bool(false));
    }
    obj
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::parse_page;
    use serde_json::json;

    #[test]
    fn test_steps_are_ordered_and_contiguous() {
        let mut expected = 1;
        for step in migrations() {
            assert_eq!(step.from_version, expected, "{}", step.description);
            expected += 1;
        }
        assert_eq!(expected, CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn test_nothing_pending_at_current_version() {
        assert_eq!(pending(CURRENT_SCHEMA_VERSION).count(), 0);
        let pages = vec![json!({"id": "a"})];
        let (out, version) = apply(pages.clone(), CURRENT_SCHEMA_VERSION);
        assert_eq!(out, pages);
        assert_eq!(version, CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn test_v1_page_becomes_parseable() {
        let v1 = json!({
            "id": "legacy",
            "url": "https://example.com",
            "title": "Legacy",
            "timestamp": 1_700_000_000_000_i64
        });
        let (out, version) = apply(vec![v1], 1);
        assert_eq!(version, 2);

        let page = parse_page(&out[0]).unwrap();
        assert_eq!(page.timestamp.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(page.created_at, page.timestamp);
        assert_eq!(page.updated_at, page.timestamp);
        assert!(page.tags.is_empty());
    }

    #[test]
    fn test_v1_keeps_existing_fields() {
        let v1 = json!({
            "id": "a",
            "url": "https://example.com",
            "title": "A",
            "timestamp": 1_700_000_000_000_i64,
            "createdAt": 1_600_000_000_000_i64,
            "tags": ["x"],
            "isArchived": true
        });
        let (out, _) = apply(vec![v1], 1);
        assert_eq!(out[0]["tags"], json!(["x"]));
        assert_eq!(out[0]["isArchived"], true);
        assert_eq!(out[0]["createdAt"], "2020-09-13T12:26:40.000Z");
    }

    #[test]
    fn test_upgrade_entry_leaves_current_entries_unchanged() {
        let current = json!({
            "id": "a",
            "url": "https://example.com",
            "title": "A",
            "tags": ["x"],
            "isArchived": false,
            "timestamp": "2024-01-01T00:00:00.000Z",
            "createdAt": "2023-12-31T00:00:00.000Z",
            "updatedAt": "2024-01-02T00:00:00.000Z"
        });
        assert_eq!(upgrade_entry(current.clone()), current);
    }

    #[test]
    fn test_v1_leaves_non_objects_alone() {
        let (out, _) = apply(vec![json!(7), json!(null)], 1);
        assert_eq!(out, vec![json!(7), json!(null)]);
    }
}
