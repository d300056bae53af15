use axum::routing::{get, post};
use axum::Router;

use crate::handlers::cache;
use crate::state::AppState;

/// Routes mounted at `/cache`.
///
/// ```text
/// GET  /{universe}/stats         -> stats
/// GET  /{universe}/info          -> info
/// POST /{universe}/invalidate    -> invalidate (admin)
/// POST /{universe}/refresh       -> refresh (admin)
/// POST /cleanup                  -> cleanup (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cleanup", post(cache::cleanup))
        .route("/{universe}/stats", get(cache::stats))
        .route("/{universe}/info", get(cache::info))
        .route("/{universe}/invalidate", post(cache::invalidate))
        .route("/{universe}/refresh", post(cache::refresh))
}
