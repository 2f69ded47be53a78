//! # Domain Model: Saved Pages, Settings and Store Metadata
//!
//! This module defines the records tabkeep persists: [`SavedPage`], the singleton
//! [`ExtensionSettings`], and the [`StoreMetadata`] sidecar.
//!
//! ## Construction vs. Parsing
//!
//! Records enter the store through two very different doors:
//!
//! 1. **Producers** (the save pipeline, the CLI) build a [`PageDraft`]. The draft's
//!    constructor takes the two required fields, `url` and `title`, so a draft
//!    without them cannot exist. Everything else is optional and defaulted.
//! 2. **Persisted or imported JSON** is untrusted. It goes through
//!    [`crate::validation::parse_page`], which checks the shape before
//!    deserializing and never panics on garbage.
//!
//! ## Wire Format
//!
//! All records serialize with camelCase keys so exports stay compatible with the
//! browser extension that wrote the first versions of this data:
//!
//! ```text
//! { "id", "url", "title", "summary", "thumbnail", "domain", "description",
//!   "ogImage", "favicon", "tags", "isArchived", "timestamp", "createdAt", "updatedAt" }
//! ```
//!
//! Timestamps are RFC 3339 strings. Legacy epoch-millisecond timestamps are
//! converted by [`crate::migration`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Placeholder stored when a page is saved without a summary.
pub const DEFAULT_SUMMARY: &str = "No summary";

/// Titles longer than this are accepted with a warning.
pub const MAX_TITLE_CHARS: usize = 500;

/// Summaries longer than this are accepted with a warning.
pub const MAX_SUMMARY_CHARS: usize = 1000;

/// Version stamped into new settings records and exports.
pub const FORMAT_VERSION: &str = "1.0.0";

fn default_summary() -> String {
    DEFAULT_SUMMARY.to_string()
}

/// One saved browser tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPage {
    pub id: String,
    pub url: String,
    pub title: String,
    #[serde(default = "default_summary")]
    pub summary: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub og_image: Option<String>,
    #[serde(default)]
    pub favicon: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl SavedPage {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Host part of a URL, or an empty string when the URL does not parse.
pub fn domain_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default()
}

/// Input for a new page. `url` and `title` are required at construction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDraft {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub og_image: Option<String>,
    #[serde(default)]
    pub favicon: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl PageDraft {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            summary: None,
            thumbnail: None,
            description: None,
            og_image: None,
            favicon: None,
            tags: Vec::new(),
            is_archived: false,
            timestamp: None,
        }
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn og_image(mut self, og_image: impl Into<String>) -> Self {
        self.og_image = Some(og_image.into());
        self
    }

    pub fn favicon(mut self, favicon: impl Into<String>) -> Self {
        self.favicon = Some(favicon.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn archived(mut self, archived: bool) -> Self {
        self.is_archived = archived;
        self
    }

    /// Override the creation timestamp (imports, backfills, tests).
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Build the record, assigning a fresh id and lifecycle timestamps.
    ///
    /// The result is not yet sanitized; the store runs
    /// [`crate::validation::sanitize_page`] before writing.
    pub fn into_page(self) -> SavedPage {
        let now = Utc::now();
        let timestamp = self.timestamp.unwrap_or(now);
        let summary = self
            .summary
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(default_summary);
        SavedPage {
            id: Uuid::new_v4().to_string(),
            domain: domain_of(&self.url),
            url: self.url,
            title: self.title,
            summary,
            thumbnail: self.thumbnail.unwrap_or_default(),
            description: self.description,
            og_image: self.og_image,
            favicon: self.favicon,
            tags: self.tags,
            is_archived: self.is_archived,
            timestamp,
            created_at: timestamp,
            updated_at: now,
        }
    }
}

/// Partial update of a saved page.
///
/// There is deliberately no `id` (or `url`) field: identity cannot change
/// through a patch. An empty string for an optional field clears it once the
/// page is sanitized.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePatch {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
    pub og_image: Option<String>,
    pub favicon: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_archived: Option<bool>,
}

impl PagePatch {
    pub fn is_empty(&self) -> bool {
        *self == PagePatch::default()
    }

    pub fn apply(self, page: &mut SavedPage) {
        if let Some(title) = self.title {
            page.title = title;
        }
        if let Some(summary) = self.summary {
            page.summary = summary;
        }
        if let Some(thumbnail) = self.thumbnail {
            page.thumbnail = thumbnail;
        }
        if let Some(description) = self.description {
            page.description = Some(description);
        }
        if let Some(og_image) = self.og_image {
            page.og_image = Some(og_image);
        }
        if let Some(favicon) = self.favicon {
            page.favicon = Some(favicon);
        }
        if let Some(tags) = self.tags {
            page.tags = tags;
        }
        if let Some(archived) = self.is_archived {
            page.is_archived = archived;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiProvider {
    Openai,
    Anthropic,
    Gemini,
    Ollama,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Auto,
    En,
    Ko,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    Auto,
}

/// The singleton settings record.
///
/// Unknown or missing keys fall back to [`ExtensionSettings::default`] when
/// parsed; range checks live in [`crate::validation::validate_settings`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtensionSettings {
    #[serde(rename = "enableAISummary")]
    pub enable_ai_summary: bool,
    pub api_provider: ApiProvider,
    pub api_key: String,

    pub max_storage_items: u32,
    pub thumbnail_quality: f64,
    pub auto_cleanup: bool,
    pub cleanup_days: u32,

    pub language: Language,
    pub theme: Theme,
    pub grid_columns: u8,
    pub show_thumbnails: bool,
    pub show_summaries: bool,
    pub show_tags: bool,

    pub enable_analytics: bool,
    pub share_usage_data: bool,
    /// Flag only; the store never encrypts anything.
    pub encrypt_api_key: bool,

    pub version: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for ExtensionSettings {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            enable_ai_summary: false,
            api_provider: ApiProvider::Openai,
            api_key: String::new(),
            max_storage_items: 1000,
            thumbnail_quality: 0.8,
            auto_cleanup: false,
            cleanup_days: 30,
            language: Language::Auto,
            theme: Theme::Auto,
            grid_columns: 3,
            show_thumbnails: true,
            show_summaries: true,
            show_tags: true,
            enable_analytics: false,
            share_usage_data: false,
            encrypt_api_key: false,
            version: FORMAT_VERSION.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Sidecar record describing the page collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreMetadata {
    #[serde(default)]
    pub total_pages: usize,
    #[serde(default)]
    pub last_page_added: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_backup: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_recovery: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_cleanup: Option<DateTime<Utc>>,
    #[serde(default = "legacy_schema_version")]
    pub schema_version: u32,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

// Metadata written before versioning existed carries no schemaVersion.
fn legacy_schema_version() -> u32 {
    1
}

impl StoreMetadata {
    pub fn new(schema_version: u32) -> Self {
        Self {
            total_pages: 0,
            last_page_added: None,
            last_backup: None,
            last_recovery: None,
            last_cleanup: None,
            schema_version,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_draft_into_page_assigns_identity() {
        let page = PageDraft::new("https://example.com/a", "A").into_page();
        assert!(!page.id.is_empty());
        assert_eq!(page.domain, "example.com");
        assert_eq!(page.summary, DEFAULT_SUMMARY);
        assert_eq!(page.created_at, page.timestamp);
    }

    #[test]
    fn test_draft_blank_summary_gets_placeholder() {
        let page = PageDraft::new("https://example.com", "A")
            .summary("   ")
            .into_page();
        assert_eq!(page.summary, DEFAULT_SUMMARY);
    }

    #[test]
    fn test_draft_keeps_explicit_timestamp() {
        let ts = Utc::now() - chrono::Duration::days(3);
        let page = PageDraft::new("https://example.com", "A")
            .timestamp(ts)
            .into_page();
        assert_eq!(page.timestamp, ts);
    }

    #[test]
    fn test_page_serializes_camel_case() {
        let page = PageDraft::new("https://example.com", "A")
            .og_image("https://example.com/og.png")
            .archived(true)
            .into_page();
        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(value["ogImage"], "https://example.com/og.png");
        assert_eq!(value["isArchived"], true);
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn test_patch_never_touches_identity() {
        let mut page = PageDraft::new("https://example.com", "Old").into_page();
        let id = page.id.clone();
        let patch: PagePatch =
            serde_json::from_value(json!({"id": "evil", "title": "New"})).unwrap();
        patch.apply(&mut page);
        assert_eq!(page.id, id);
        assert_eq!(page.title, "New");
    }

    #[test]
    fn test_settings_field_names() {
        let value = serde_json::to_value(ExtensionSettings::default()).unwrap();
        assert_eq!(value["enableAISummary"], false);
        assert_eq!(value["apiProvider"], "openai");
        assert_eq!(value["maxStorageItems"], 1000);
    }

    #[test]
    fn test_metadata_without_version_is_legacy() {
        let meta: StoreMetadata = serde_json::from_value(json!({"totalPages": 3})).unwrap();
        assert_eq!(meta.schema_version, 1);
        assert_eq!(meta.total_pages, 3);
    }

    #[test]
    fn test_domain_of_invalid_url_is_empty() {
        assert_eq!(domain_of("not a url"), "");
        assert_eq!(domain_of("https://news.example.org/x?y=1"), "news.example.org");
    }
}
