//! Search, filtering, sorting and pagination over a loaded page collection.
//!
//! Everything here is pure: the page store loads (and heals) the collection, then
//! hands it to [`search`] or [`run`].

use crate::model::SavedPage;
use crate::tags::normalize_tags;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    Timestamp,
    Title,
    Url,
    Domain,
    CreatedAt,
    UpdatedAt,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Filter, sort and page through saved pages. All given filters must hold.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageQuery {
    /// Case-insensitive substring over title, summary, url and domain.
    pub query: Option<String>,
    /// Page matches if it carries any of these tags.
    pub tags: Vec<String>,
    /// Inclusive lower bound on `timestamp`.
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `timestamp`.
    pub date_to: Option<DateTime<Utc>>,
    /// Page matches if its domain equals any of these (case-insensitive).
    pub domains: Vec<String>,
    pub archived: Option<bool>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
    pub limit: Option<usize>,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub pages: Vec<SavedPage>,
    /// Matches before pagination.
    pub total_count: usize,
    /// Pages in this result.
    pub filtered_count: usize,
    pub has_more: bool,
}

fn matches_text(page: &SavedPage, needle: &str) -> bool {
    [&page.title, &page.summary, &page.url, &page.domain]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

/// Pages matching `query`. A blank query matches everything.
pub fn search(pages: Vec<SavedPage>, query: &str) -> Vec<SavedPage> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return pages;
    }
    pages
        .into_iter()
        .filter(|p| matches_text(p, &needle))
        .collect()
}

fn compare(a: &SavedPage, b: &SavedPage, field: SortField) -> Ordering {
    match field {
        SortField::Timestamp => a.timestamp.cmp(&b.timestamp),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortField::Url => a.url.to_lowercase().cmp(&b.url.to_lowercase()),
        SortField::Domain => a.domain.to_lowercase().cmp(&b.domain.to_lowercase()),
    }
}

impl PageQuery {
    pub fn matches(&self, page: &SavedPage) -> bool {
        if let Some(needle) = self.query.as_deref().map(|q| q.trim().to_lowercase()) {
            if !needle.is_empty() && !matches_text(page, &needle) {
                return false;
            }
        }
        if !self.tags.is_empty() {
            let wanted = normalize_tags(&self.tags);
            if !wanted.is_empty() && !wanted.iter().any(|t| page.has_tag(t)) {
                return false;
            }
        }
        if self.date_from.is_some_and(|from| page.timestamp < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| page.timestamp > to) {
            return false;
        }
        if !self.domains.is_empty()
            && !self
                .domains
                .iter()
                .any(|d| d.trim().eq_ignore_ascii_case(&page.domain))
        {
            return false;
        }
        if self.archived.is_some_and(|archived| page.is_archived != archived) {
            return false;
        }
        true
    }
}

/// Filter, then sort, then skip `offset`, then take `limit`.
pub fn run(pages: Vec<SavedPage>, query: &PageQuery) -> QueryResult {
    let mut matched: Vec<SavedPage> = pages.into_iter().filter(|p| query.matches(p)).collect();
    matched.sort_by(|a, b| match query.sort_order {
        SortOrder::Asc => compare(a, b, query.sort_by),
        SortOrder::Desc => compare(b, a, query.sort_by),
    });

    let total_count = matched.len();
    let page: Vec<SavedPage> = matched
        .into_iter()
        .skip(query.offset)
        .take(query.limit.unwrap_or(usize::MAX))
        .collect();
    let has_more = query
        .limit
        .is_some_and(|limit| query.offset.saturating_add(limit) < total_count);

    QueryResult {
        filtered_count: page.len(),
        pages: page,
        total_count,
        has_more,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PageDraft;
    use chrono::Duration;

    fn fixture(n: usize) -> Vec<SavedPage> {
        let now = Utc::now();
        (0..n)
            .map(|i| {
                PageDraft::new(format!("https://site{}.example/p", i), format!("Page {}", i))
                    .timestamp(now - Duration::minutes(i as i64))
                    .into_page()
            })
            .collect()
    }

    #[test]
    fn test_search_is_case_insensitive_over_fields() {
        let pages = vec![
            PageDraft::new("https://rust-lang.org", "The Book").into_page(),
            PageDraft::new("https://example.com", "Other")
                .summary("All about RUST")
                .into_page(),
            PageDraft::new("https://example.org", "Nothing").into_page(),
        ];
        assert_eq!(search(pages.clone(), "rust").len(), 2);
        assert_eq!(search(pages.clone(), "EXAMPLE.ORG").len(), 1);
        assert_eq!(search(pages, "  ").len(), 3);
    }

    #[test]
    fn test_pagination_offset_then_limit() {
        let query = PageQuery {
            limit: Some(10),
            offset: 5,
            ..Default::default()
        };
        let result = run(fixture(30), &query);
        assert_eq!(result.pages.len(), 10);
        assert_eq!(result.pages[0].title, "Page 5");
        assert_eq!(result.total_count, 30);
        assert_eq!(result.filtered_count, 10);
        assert!(result.has_more);
    }

    #[test]
    fn test_last_page_has_no_more() {
        let query = PageQuery {
            limit: Some(10),
            offset: 20,
            ..Default::default()
        };
        let result = run(fixture(30), &query);
        assert_eq!(result.pages.len(), 10);
        assert!(!result.has_more);
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let now = Utc::now();
        let pages = vec![
            PageDraft::new("https://a.example/1", "One")
                .tag("rust")
                .timestamp(now)
                .into_page(),
            PageDraft::new("https://a.example/2", "Two")
                .tag("go")
                .timestamp(now)
                .into_page(),
            PageDraft::new("https://b.example/3", "Three")
                .tag("rust")
                .timestamp(now)
                .into_page(),
        ];
        let query = PageQuery {
            tags: vec!["RUST".to_string()],
            domains: vec!["a.example".to_string()],
            ..Default::default()
        };
        let result = run(pages, &query);
        assert_eq!(result.total_count, 1);
        assert_eq!(result.pages[0].title, "One");
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let pages = fixture(5);
        let query = PageQuery {
            date_from: Some(pages[3].timestamp),
            date_to: Some(pages[1].timestamp),
            ..Default::default()
        };
        let titles: Vec<String> = run(pages, &query).pages.into_iter().map(|p| p.title).collect();
        assert_eq!(titles, vec!["Page 1", "Page 2", "Page 3"]);
    }

    #[test]
    fn test_sort_by_title_ignores_case() {
        let pages = vec![
            PageDraft::new("https://x.example/1", "banana").into_page(),
            PageDraft::new("https://x.example/2", "Apple").into_page(),
            PageDraft::new("https://x.example/3", "cherry").into_page(),
        ];
        let query = PageQuery {
            sort_by: SortField::Title,
            sort_order: SortOrder::Asc,
            ..Default::default()
        };
        let titles: Vec<String> = run(pages, &query).pages.into_iter().map(|p| p.title).collect();
        assert_eq!(titles, vec!["Apple", "banana", "cherry"]);
    }

    #[test]
    fn test_archived_filter() {
        let pages = vec![
            PageDraft::new("https://x.example/1", "kept").into_page(),
            PageDraft::new("https://x.example/2", "old").archived(true).into_page(),
        ];
        let query = PageQuery {
            archived: Some(true),
            ..Default::default()
        };
        assert_eq!(run(pages, &query).pages[0].title, "old");
    }

    #[test]
    fn test_query_deserializes_camel_case() {
        let query: PageQuery = serde_json::from_str(
            r#"{"sortBy": "createdAt", "sortOrder": "asc", "limit": 5, "dateFrom": "2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(query.sort_by, SortField::CreatedAt);
        assert_eq!(query.sort_order, SortOrder::Asc);
        assert_eq!(query.limit, Some(5));
        assert!(query.date_from.is_some());
    }
}
