//! # Record Validation and Sanitization
//!
//! Validation is pure and total: every function here takes a reference, never
//! panics, and reports problems as data in a [`ValidationReport`].
//!
//! - **Errors** block persistence. A record with errors is never written.
//! - **Warnings** are advisory. The store logs them and carries on.
//!
//! [`sanitize_page`] is the one place a page is mutated in memory before a
//! write: it trims strings, recomputes `domain`, normalizes tags and bumps
//! `updatedAt`.
//!
//! Untrusted JSON (the persisted collection, import bundles) goes through
//! [`parse_page`] / [`parse_settings`], which check the shape first, then
//! deserialize, then validate.

use crate::model::{
    domain_of, ApiProvider, ExtensionSettings, SavedPage, DEFAULT_SUMMARY, MAX_SUMMARY_CHARS,
    MAX_TITLE_CHARS,
};
use crate::tags::normalize_tags;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

fn is_http_url(value: &str) -> bool {
    match url::Url::parse(value) {
        Ok(u) => u.scheme() == "http" || u.scheme() == "https",
        Err(_) => false,
    }
}

fn is_image_ref(value: &str) -> bool {
    value.starts_with("data:image/") || is_http_url(value)
}

pub fn validate_page(page: &SavedPage) -> ValidationReport {
    let mut report = ValidationReport::default();

    if page.id.trim().is_empty() {
        report.error("id is required");
    }

    let url = page.url.trim();
    if url.is_empty() {
        report.error("url is required");
    } else {
        match url::Url::parse(url) {
            Ok(u) if u.scheme() == "http" || u.scheme() == "https" => {}
            Ok(u) => report.error(format!("url must use http or https, got '{}'", u.scheme())),
            Err(_) => report.error(format!("url is not a valid URL: '{}'", url)),
        }
    }

    let title = page.title.trim();
    if title.is_empty() {
        report.error("title is required");
    } else if title.chars().count() > MAX_TITLE_CHARS {
        report.warn(format!("title is longer than {} characters", MAX_TITLE_CHARS));
    }

    if page.summary.chars().count() > MAX_SUMMARY_CHARS {
        report.warn(format!(
            "summary is longer than {} characters",
            MAX_SUMMARY_CHARS
        ));
    }

    let thumbnail = page.thumbnail.trim();
    if !thumbnail.is_empty() && !is_image_ref(thumbnail) {
        report.warn("thumbnail is neither a data URI nor an http(s) URL");
    }

    for (name, value) in [("ogImage", &page.og_image), ("favicon", &page.favicon)] {
        if let Some(v) = value.as_deref().map(str::trim) {
            if !v.is_empty() && !is_image_ref(v) {
                report.warn(format!("{} is not a usable URL", name));
            }
        }
    }

    if page.updated_at < page.created_at {
        report.warn("updatedAt is earlier than createdAt");
    }

    report
}

fn trim_optional(value: &mut Option<String>) {
    *value = value
        .take()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
}

pub fn sanitize_page(page: &mut SavedPage) {
    page.url = page.url.trim().to_string();
    page.title = page.title.trim().to_string();
    page.summary = page.summary.trim().to_string();
    if page.summary.is_empty() {
        page.summary = DEFAULT_SUMMARY.to_string();
    }
    page.thumbnail = page.thumbnail.trim().to_string();
    trim_optional(&mut page.description);
    trim_optional(&mut page.og_image);
    trim_optional(&mut page.favicon);
    page.domain = domain_of(&page.url);
    page.tags = normalize_tags(&page.tags);
    page.updated_at = Utc::now();
}

fn parse_page_inner(raw: &Value) -> (Option<SavedPage>, ValidationReport) {
    let mut report = ValidationReport::default();

    let Some(obj) = raw.as_object() else {
        report.error("record is not an object");
        return (None, report);
    };

    for field in ["id", "url", "title"] {
        if !obj.get(field).is_some_and(Value::is_string) {
            report.error(format!("missing or non-string field '{}'", field));
        }
    }
    if !report.is_valid() {
        return (None, report);
    }

    // Older writers stored explicit nulls for fields that now have defaults.
    let mut cleaned: serde_json::Map<String, Value> = obj
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    fill_missing_times(&mut cleaned);

    match serde_json::from_value::<SavedPage>(Value::Object(cleaned)) {
        Ok(page) => {
            let typed = validate_page(&page);
            report.errors.extend(typed.errors);
            report.warnings.extend(typed.warnings);
            (Some(page), report)
        }
        Err(e) => {
            report.error(format!("malformed record: {}", e));
            (None, report)
        }
    }
}

/// Fill an absent lifecycle timestamp from its siblings, so a record that lacks
/// one keeps a stable position instead of reading as "now" on every load.
fn fill_missing_times(obj: &mut serde_json::Map<String, Value>) {
    const ORDER: [&str; 3] = ["timestamp", "createdAt", "updatedAt"];
    for field in ORDER {
        if obj.contains_key(field) {
            continue;
        }
        let fallback = ORDER
            .iter()
            .filter(|other| **other != field)
            .find_map(|other| obj.get(*other).filter(|v| v.is_string()).cloned());
        if let Some(value) = fallback {
            obj.insert(field.to_string(), value);
        }
    }
}

/// True when a stored record lacks a lifecycle timestamp, i.e. parsing it had
/// to invent or borrow one and the record should be written back.
pub fn lacks_times(raw: &Value) -> bool {
    raw.as_object().is_some_and(|obj| {
        ["timestamp", "createdAt", "updatedAt"]
            .iter()
            .any(|field| !obj.get(*field).is_some_and(Value::is_string))
    })
}

/// Parses an untrusted JSON page. Warnings are discarded on success; call
/// [`validate_page`] on the result to see them.
pub fn parse_page(raw: &Value) -> Result<SavedPage, ValidationReport> {
    match parse_page_inner(raw) {
        (Some(page), report) if report.is_valid() => Ok(page),
        (_, report) => Err(report),
    }
}

pub fn validate_settings(settings: &ExtensionSettings) -> ValidationReport {
    let mut report = ValidationReport::default();

    if !(10..=10_000).contains(&settings.max_storage_items) {
        report.error(format!(
            "maxStorageItems must be between 10 and 10000, got {}",
            settings.max_storage_items
        ));
    }
    let quality = settings.thumbnail_quality;
    if !quality.is_finite() || !(0.1..=1.0).contains(&quality) {
        report.error(format!(
            "thumbnailQuality must be between 0.1 and 1, got {}",
            quality
        ));
    }
    if !(1..=365).contains(&settings.cleanup_days) {
        report.error(format!(
            "cleanupDays must be between 1 and 365, got {}",
            settings.cleanup_days
        ));
    }
    if !(1..=3).contains(&settings.grid_columns) {
        report.error(format!(
            "gridColumns must be between 1 and 3, got {}",
            settings.grid_columns
        ));
    }
    if settings.version.trim().is_empty() {
        report.error("version is required");
    }

    if settings.enable_ai_summary
        && settings.api_provider != ApiProvider::Ollama
        && settings.api_key.trim().is_empty()
    {
        report.warn("AI summaries are enabled but no API key is set");
    }
    if settings.encrypt_api_key {
        report.warn("API key encryption is not implemented; the key is stored as-is");
    }

    report
}

pub fn parse_settings(raw: &Value) -> Result<ExtensionSettings, ValidationReport> {
    let mut report = ValidationReport::default();
    if !raw.is_object() {
        report.error("settings record is not an object");
        return Err(report);
    }
    match serde_json::from_value::<ExtensionSettings>(raw.clone()) {
        Ok(settings) => {
            let checked = validate_settings(&settings);
            if checked.is_valid() {
                Ok(settings)
            } else {
                Err(checked)
            }
        }
        Err(e) => {
            report.error(format!("malformed settings: {}", e));
            Err(report)
        }
    }
}
