//! Tag normalization.
//!
//! Tags are free-form labels, compared after normalization:
//! - Leading and trailing whitespace is trimmed
//! - Letters are lower-cased
//! - Empty tags are dropped
//! - Duplicates are dropped, first occurrence wins

/// Normalizes a single tag, returning `None` when nothing is left.
///
/// # Examples
/// ```
/// use tabkeep::tags::normalize_tag;
///
/// assert_eq!(normalize_tag("  Rust "), Some("rust".to_string()));
/// assert_eq!(normalize_tag("   "), None);
/// ```
pub fn normalize_tag(tag: &str) -> Option<String> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Normalizes a tag list, preserving the order of first appearance.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        if let Some(normalized) = normalize_tag(tag.as_ref()) {
            if !out.contains(&normalized) {
                out.push(normalized);
            }
        }
    }
    out
}
