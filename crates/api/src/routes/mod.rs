pub mod cache;
pub mod campaigns;
pub mod canon;
pub mod characters;
pub mod health;
pub mod prefetch;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws/campaigns/{id}?token=                        WebSocket room (participants)
///
/// /auth/me                                         caller identity (token)
///
/// /characters                                      list, create (token)
/// /characters/{id}                                 get, update, delete (owner)
///
/// /campaigns                                       list, create (token)
/// /campaigns/{id}                                  detail, delete
/// /campaigns/{id}/join|leave|ready|gm              lobby actions (POST)
/// /campaigns/{id}/start|pause|resume|end           status changes (POST, GM)
/// /campaigns/{id}/messages                         list, post (participants)
/// /campaigns/{id}/location                         set location (PUT, GM)
///
/// /canon/{universe}/all                            tier-fallback dataset
/// /canon/{universe}/summary                        per-category counts
/// /canon/{universe}/category/{category}            paginated listing
/// /canon/{universe}/search                         title search
/// /canon/{universe}/search-all                     per-category search
/// /canon/{universe}/articles/{title}               single article
/// /canon/{universe}/items/{category}/with-images   equipment listing
///
/// /image-proxy?url=                                cached image bytes
///
/// /cache/{universe}/stats                          tier statistics
/// /cache/{universe}/info                           unified cache info
/// /cache/{universe}/invalidate                     drop file snapshot (POST, admin)
/// /cache/{universe}/refresh                        drop both tiers + prefetch (POST, admin)
/// /cache/cleanup                                   purge expired entries (POST, admin)
///
/// /prefetch/status                                 progress of the current run
/// /prefetch/start                                  trigger a run (POST, admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws/campaigns/{id}", get(ws::campaign_ws))
        .route("/auth/me", get(handlers::auth::me))
        .nest("/characters", characters::router())
        .nest("/campaigns", campaigns::router())
        .nest("/canon", canon::router())
        .route("/image-proxy", get(handlers::image_proxy::proxy))
        .nest("/cache", cache::router())
        .nest("/prefetch", prefetch::router())
}
