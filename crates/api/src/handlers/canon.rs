//! Read-only canon browsing under `/canon/{universe}`.
//!
//! These responses are returned unwrapped: each body already names the
//! universe and the cache tier that served it.

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::Json;
use loreforge_cache::hybrid::{CategoryPage, SearchHit};
use loreforge_cache::unified::{CacheTier, CanonSearchResults, CanonSummary};
use loreforge_core::canon::{self, CanonData};
use loreforge_core::category::{validate_category, validate_category_in, ITEM_IMAGE_CATEGORIES};
use loreforge_core::search::{
    clamp_limit, clamp_offset, normalize_query, DEFAULT_CATEGORY_LIMIT, DEFAULT_SEARCH_LIMIT,
    MAX_CATEGORY_LIMIT, MAX_SEARCH_LIMIT,
};
use loreforge_core::universe::validate_universe;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::query::{FilteredPageParams, PaginationParams, SearchParams};
use crate::state::AppState;

/// Default page size of the items-with-images listing.
const DEFAULT_ITEM_IMAGE_LIMIT: i64 = 50;

/// Maximum page size of the items-with-images listing.
const MAX_ITEM_IMAGE_LIMIT: i64 = 200;

#[derive(Debug, Serialize)]
pub struct AllDataResponse {
    pub universe: String,
    pub backend: CacheTier,
    pub total: usize,
    pub data: CanonData,
}

#[derive(Debug, Serialize)]
pub struct SearchAllResponse {
    pub universe: String,
    pub query: String,
    pub results: BTreeMap<String, Vec<SearchHit>>,
}

#[derive(Debug, Serialize)]
pub struct ArticleResponse {
    pub universe: String,
    pub title: String,
    pub backend: CacheTier,
    pub article: serde_json::Value,
}

fn required_query(q: Option<&str>) -> AppResult<String> {
    q.and_then(normalize_query)
        .ok_or_else(|| AppError::BadRequest("Query parameter 'q' is required".into()))
}

/// GET /api/v1/canon/{universe}/all
pub async fn all(
    State(state): State<AppState>,
    Path(universe): Path<String>,
) -> AppResult<Json<AllDataResponse>> {
    let (data, backend) = state.unified.get_all_data(&universe).await?;
    Ok(Json(AllDataResponse {
        total: canon::total_items(&data),
        universe,
        backend,
        data,
    }))
}

/// GET /api/v1/canon/{universe}/summary
pub async fn summary(
    State(state): State<AppState>,
    Path(universe): Path<String>,
) -> AppResult<Json<CanonSummary>> {
    Ok(Json(state.unified.summary(&universe).await?))
}

/// GET /api/v1/canon/{universe}/category/{category}?limit=&offset=&search=
pub async fn category(
    State(state): State<AppState>,
    Path((universe, category)): Path<(String, String)>,
    Query(params): Query<FilteredPageParams>,
) -> AppResult<Json<CategoryPage>> {
    validate_universe(&universe)?;
    validate_category(&category)?;

    let limit = clamp_limit(params.limit, DEFAULT_CATEGORY_LIMIT, MAX_CATEGORY_LIMIT);
    let offset = clamp_offset(params.offset);
    let search = params.search.as_deref().and_then(normalize_query);

    let page = state
        .hybrid
        .category_with_metadata(&universe, &category, limit, offset, search.as_deref())
        .await?;
    Ok(Json(page))
}

/// GET /api/v1/canon/{universe}/search?q=&limit=
pub async fn search(
    State(state): State<AppState>,
    Path(universe): Path<String>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<CanonSearchResults>> {
    let query = required_query(params.q.as_deref())?;
    let limit = clamp_limit(params.limit, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT);
    Ok(Json(state.unified.search(&universe, &query, limit).await?))
}

/// GET /api/v1/canon/{universe}/search-all?q=&limit=
///
/// `limit` applies per category.
pub async fn search_all(
    State(state): State<AppState>,
    Path(universe): Path<String>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<SearchAllResponse>> {
    validate_universe(&universe)?;
    let query = required_query(params.q.as_deref())?;
    let limit = clamp_limit(params.limit, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT);

    let results = state
        .hybrid
        .search_all_categories(&universe, &query, limit)
        .await?;
    Ok(Json(SearchAllResponse {
        universe,
        query,
        results,
    }))
}

/// GET /api/v1/canon/{universe}/articles/{title}
pub async fn article(
    State(state): State<AppState>,
    Path((universe, title)): Path<(String, String)>,
) -> AppResult<Json<ArticleResponse>> {
    let (article, backend) = state
        .unified
        .get_article(&universe, &title)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Article '{title}' not found in {universe}")))?;
    Ok(Json(ArticleResponse {
        universe,
        title,
        backend,
        article,
    }))
}

/// GET /api/v1/canon/{universe}/items/{category}/with-images?limit=&offset=
///
/// Equipment-like categories only; each item carries its image URL and
/// whether the image is already on disk.
pub async fn items_with_images(
    State(state): State<AppState>,
    Path((universe, category)): Path<(String, String)>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<CategoryPage>> {
    validate_universe(&universe)?;
    validate_category_in(&category, ITEM_IMAGE_CATEGORIES)?;

    let limit = clamp_limit(params.limit, DEFAULT_ITEM_IMAGE_LIMIT, MAX_ITEM_IMAGE_LIMIT);
    let offset = clamp_offset(params.offset);
    let page = state
        .hybrid
        .category_with_metadata(&universe, &category, limit, offset, None)
        .await?;
    Ok(Json(page))
}
