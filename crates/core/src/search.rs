//! Pagination defaults and lookup helpers for canon browsing and search.

// ---------------------------------------------------------------------------
// Pagination defaults
// ---------------------------------------------------------------------------

/// Default page size for category listings.
pub const DEFAULT_CATEGORY_LIMIT: i64 = 100;

/// Maximum page size for category listings.
pub const MAX_CATEGORY_LIMIT: i64 = 1000;

/// Default number of search results.
pub const DEFAULT_SEARCH_LIMIT: i64 = 20;

/// Maximum number of search results.
pub const MAX_SEARCH_LIMIT: i64 = 100;

/// Default number of campaign messages returned per page.
pub const DEFAULT_MESSAGE_LIMIT: i64 = 50;

/// Maximum number of campaign messages returned per page.
pub const MAX_MESSAGE_LIMIT: i64 = 200;

/// Clamp a user-provided limit to valid bounds.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

/// Normalize a free-text query: trims whitespace and rejects empty input.
pub fn normalize_query(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Case-insensitive substring match used by in-memory fallback search.
pub fn title_matches(title: &str, query: &str) -> bool {
    title.to_lowercase().contains(&query.to_lowercase())
}

/// Build an `ILIKE ... ESCAPE '\'` substring pattern, escaping the
/// wildcard characters of the user's text.
pub fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
