//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// Generic pagination parameters (`?limit=&offset=`).
///
/// Handlers clamp the values with `clamp_limit` / `clamp_offset` before
/// they reach a repository.
#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Paginated listing with an optional title filter (`?limit=&offset=&search=`).
#[derive(Debug, Deserialize)]
pub struct FilteredPageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub search: Option<String>,
}

/// Free-text search parameters (`?q=&limit=`). `q` is required by every
/// search endpoint; it is optional here so a missing value yields a JSON
/// error instead of a plain-text rejection.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<i64>,
}
