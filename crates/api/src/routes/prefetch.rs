use axum::routing::{get, post};
use axum::Router;

use crate::handlers::prefetch;
use crate::state::AppState;

/// Routes mounted at `/prefetch`.
///
/// ```text
/// GET  /status    -> status
/// POST /start     -> start (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(prefetch::status))
        .route("/start", post(prefetch::start))
}
