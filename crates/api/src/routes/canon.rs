use axum::routing::get;
use axum::Router;

use crate::handlers::canon;
use crate::state::AppState;

/// Routes mounted at `/canon`. All public.
///
/// ```text
/// GET /{universe}/all                               -> all
/// GET /{universe}/summary                           -> summary
/// GET /{universe}/category/{category}               -> category
/// GET /{universe}/search                            -> search
/// GET /{universe}/search-all                        -> search_all
/// GET /{universe}/articles/{title}                  -> article
/// GET /{universe}/items/{category}/with-images      -> items_with_images
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{universe}/all", get(canon::all))
        .route("/{universe}/summary", get(canon::summary))
        .route("/{universe}/category/{category}", get(canon::category))
        .route("/{universe}/search", get(canon::search))
        .route("/{universe}/search-all", get(canon::search_all))
        .route("/{universe}/articles/{title}", get(canon::article))
        .route(
            "/{universe}/items/{category}/with-images",
            get(canon::items_with_images),
        )
}
