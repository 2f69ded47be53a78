//! Structural corruption detection for the persisted page collection.
//!
//! A single bad entry is a nuisance the store heals by filtering it out. A
//! collection where more than [`CORRUPTION_THRESHOLD_PERCENT`] of entries are
//! broken, or that is not a list at all, is treated as wholesale corruption and
//! triggers recovery from a snapshot. Detection itself never writes anything.

use serde::Serialize;
use serde_json::Value;

/// More than this share of structurally invalid entries means the collection is corrupted.
pub const CORRUPTION_THRESHOLD_PERCENT: usize = 10;

const REQUIRED_FIELDS: [&str; 3] = ["id", "url", "title"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorruptionReport {
    pub is_corrupted: bool,
    pub issues: Vec<String>,
    pub corrupted_count: usize,
    pub total_count: usize,
}

fn structural_issue(entry: &Value) -> Option<String> {
    let Some(obj) = entry.as_object() else {
        return Some("entry is not an object".to_string());
    };
    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|f| obj.get(*f).map_or(true, Value::is_null))
        .collect();
    if missing.is_empty() {
        None
    } else {
        Some(format!("missing {}", missing.join(", ")))
    }
}

/// Scans a raw collection. `Value::Null` (nothing stored yet) is an empty, healthy collection.
pub fn detect(raw: &Value) -> CorruptionReport {
    let entries = match raw {
        Value::Null => return CorruptionReport::default(),
        Value::Array(entries) => entries,
        other => {
            return CorruptionReport {
                is_corrupted: true,
                issues: vec![format!(
                    "page collection is not a list (found {})",
                    json_kind(other)
                )],
                corrupted_count: 0,
                total_count: 0,
            }
        }
    };

    let mut issues = Vec::new();
    for (idx, entry) in entries.iter().enumerate() {
        if let Some(issue) = structural_issue(entry) {
            issues.push(format!("entry {}: {}", idx, issue));
        }
    }

    let corrupted_count = issues.len();
    let total_count = entries.len();
    CorruptionReport {
        is_corrupted: corrupted_count * 100 > total_count * CORRUPTION_THRESHOLD_PERCENT,
        issues,
        corrupted_count,
        total_count,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
