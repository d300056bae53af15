use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{campaigns, inventory};
use crate::state::AppState;

/// Routes mounted at `/campaigns`.
///
/// ```text
/// GET    /                    -> list
/// POST   /                    -> create
/// GET    /{id}                -> get_by_id
/// DELETE /{id}                -> delete
/// POST   /{id}/join           -> join
/// POST   /{id}/leave          -> leave
/// POST   /{id}/ready          -> toggle_ready
/// POST   /{id}/gm             -> assign_gm
/// POST   /{id}/start          -> start
/// POST   /{id}/pause          -> pause
/// POST   /{id}/resume         -> resume
/// POST   /{id}/end            -> end
/// GET    /{id}/messages       -> list_messages
/// POST   /{id}/messages       -> post_message
/// PUT    /{id}/location       -> set_location
/// GET    /{id}/players        -> inventory::list_players
/// GET    /{id}/inventory      -> inventory::list_all
/// POST   /{id}/inventory      -> inventory::add_item
/// GET    /{id}/inventory/{n}  -> inventory::player_inventory (n = user id)
/// PUT    /{id}/inventory/{n}  -> inventory::update_item      (n = item id)
/// DELETE /{id}/inventory/{n}  -> inventory::delete_item      (n = item id)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(campaigns::list).post(campaigns::create))
        .route("/{id}", get(campaigns::get_by_id).delete(campaigns::delete))
        .route("/{id}/join", post(campaigns::join))
        .route("/{id}/leave", post(campaigns::leave))
        .route("/{id}/ready", post(campaigns::toggle_ready))
        .route("/{id}/gm", post(campaigns::assign_gm))
        .route("/{id}/start", post(campaigns::start))
        .route("/{id}/pause", post(campaigns::pause))
        .route("/{id}/resume", post(campaigns::resume))
        .route("/{id}/end", post(campaigns::end))
        .route(
            "/{id}/messages",
            get(campaigns::list_messages).post(campaigns::post_message),
        )
        .route("/{id}/location", put(campaigns::set_location))
        .route("/{id}/players", get(inventory::list_players))
        .route(
            "/{id}/inventory",
            get(inventory::list_all).post(inventory::add_item),
        )
        .route(
            "/{id}/inventory/{target_id}",
            get(inventory::player_inventory)
                .put(inventory::update_item)
                .delete(inventory::delete_item),
        )
}
