//! Cache inspection and maintenance under `/cache`.
//!
//! Reads are public. Invalidation, refresh and cleanup require an admin.

use axum::extract::{Path, Query, State};
use axum::Json;
use loreforge_cache::canon_file::CanonCacheStats;
use loreforge_cache::hybrid::{CleanupReport, ComprehensiveStats};
use loreforge_cache::unified::{CacheInfo, RefreshReport};
use loreforge_cache::CacheError;
use loreforge_core::error::CoreError;
use loreforge_core::universe::validate_universe;
use loreforge_wiki::image::ImageDirStats;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CacheStatsResponse {
    pub universe: String,
    /// `None` when no snapshot exists for the universe.
    pub file_cache: Option<CanonCacheStats>,
    pub image_files: ImageDirStats,
    pub hybrid: ComprehensiveStats,
}

#[derive(Debug, Serialize)]
pub struct InvalidateResponse {
    pub universe: String,
    pub invalidated: bool,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub universe: String,
    #[serde(flatten)]
    pub report: RefreshReport,
    pub prefetch_started: bool,
}

#[derive(Debug, Deserialize)]
pub struct CleanupParams {
    pub universe: Option<String>,
}

/// GET /api/v1/cache/{universe}/stats
pub async fn stats(
    State(state): State<AppState>,
    Path(universe): Path<String>,
) -> AppResult<Json<CacheStatsResponse>> {
    validate_universe(&universe)?;

    let file_cache = state.canon_files.stats(&universe).await;
    let image_files = state
        .hybrid
        .images()
        .stats()
        .await
        .map_err(CacheError::from)?;
    let hybrid = state.hybrid.comprehensive_stats(&universe).await?;
    Ok(Json(CacheStatsResponse {
        universe,
        file_cache,
        image_files,
        hybrid,
    }))
}

/// GET /api/v1/cache/{universe}/info
pub async fn info(
    State(state): State<AppState>,
    Path(universe): Path<String>,
) -> AppResult<Json<CacheInfo>> {
    Ok(Json(state.unified.cache_info(&universe).await?))
}

/// POST /api/v1/cache/{universe}/invalidate
///
/// Drops the file snapshot only; database rows stay until they expire.
pub async fn invalidate(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(universe): Path<String>,
) -> AppResult<Json<InvalidateResponse>> {
    validate_universe(&universe)?;
    let invalidated = state.canon_files.invalidate(&universe).await?;
    tracing::info!(universe = %universe, invalidated, admin_id = admin.user_id, "File cache invalidated");
    Ok(Json(InvalidateResponse {
        universe,
        invalidated,
    }))
}

/// POST /api/v1/cache/{universe}/refresh
///
/// Clears both tiers and kicks off a prefetch to repopulate them. Refused
/// with 409 while a prefetch is running, since that run would not
/// repopulate what was just cleared.
pub async fn refresh(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(universe): Path<String>,
) -> AppResult<Json<RefreshResponse>> {
    validate_universe(&universe)?;
    if state.prefetch.is_running().await {
        return Err(AppError::Core(CoreError::Conflict(
            "A prefetch is running; retry the refresh once it finishes".into(),
        )));
    }

    let report = state.unified.force_refresh_all(&universe).await?;

    let mut options = state.config.cache.prefetch_options();
    options.universe = universe.clone();
    options.force_refresh = true;
    let prefetch_started = state.prefetch.start(options).await;

    tracing::info!(
        universe = %universe,
        articles_deleted = report.articles_deleted,
        prefetch_started,
        admin_id = admin.user_id,
        "Cache refreshed",
    );
    Ok(Json(RefreshResponse {
        universe,
        report,
        prefetch_started,
    }))
}

/// POST /api/v1/cache/cleanup?universe=
pub async fn cleanup(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<CleanupParams>,
) -> AppResult<Json<CleanupReport>> {
    if let Some(universe) = &params.universe {
        validate_universe(universe)?;
    }
    let report = state
        .hybrid
        .cleanup_expired(params.universe.as_deref())
        .await?;
    Ok(Json(report))
}
