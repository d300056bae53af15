//! Background prefetch control under `/prefetch`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use loreforge_cache::prefetch::PrefetchStatus;
use loreforge_core::error::CoreError;
use loreforge_core::universe::validate_universe;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

/// Optional body of `POST /prefetch/start`. Absent fields fall back to the
/// configured startup options.
#[derive(Debug, Default, Deserialize)]
pub struct StartPrefetchRequest {
    pub universe: Option<String>,
    pub force_refresh: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct StartPrefetchResponse {
    pub started: bool,
    pub universe: String,
    pub force_refresh: bool,
}

/// GET /api/v1/prefetch/status
pub async fn status(State(state): State<AppState>) -> Json<PrefetchStatus> {
    Json(state.prefetch.status().await)
}

/// POST /api/v1/prefetch/start
///
/// Returns 202 once the run is spawned, 409 if one is already in progress.
pub async fn start(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    body: Option<Json<StartPrefetchRequest>>,
) -> AppResult<(StatusCode, Json<StartPrefetchResponse>)> {
    let request = body.map(|Json(b)| b).unwrap_or_default();

    let mut options = state.config.cache.prefetch_options();
    if let Some(universe) = request.universe {
        validate_universe(&universe)?;
        options.universe = universe;
    }
    if let Some(force_refresh) = request.force_refresh {
        options.force_refresh = force_refresh;
    }

    let universe = options.universe.clone();
    let force_refresh = options.force_refresh;
    if !state.prefetch.start(options).await {
        return Err(AppError::Core(CoreError::Conflict(
            "A prefetch is already running".into(),
        )));
    }

    tracing::info!(universe = %universe, force_refresh, admin_id = admin.user_id, "Prefetch started");
    Ok((
        StatusCode::ACCEPTED,
        Json(StartPrefetchResponse {
            started: true,
            universe,
            force_refresh,
        }),
    ))
}
