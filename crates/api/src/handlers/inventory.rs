//! Handlers for player inventories inside a campaign.
//!
//! The game master hands out, changes and removes items; every seated
//! player can read their own inventory. Grants are announced to the room as
//! `item_added` events.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use loreforge_core::campaign::{MSG_ITEM_ADDED, ROLE_PLAYER};
use loreforge_core::error::CoreError;
use loreforge_core::inventory::{
    can_manage_inventory, can_view_inventory, tally, validate_new_item, validate_notes,
    validate_quantity_update,
};
use loreforge_core::types::DbId;
use loreforge_db::models::inventory::{AddInventoryItem, InventoryItem, UpdateInventoryItem};
use loreforge_db::repositories::{InventoryRepo, ParticipantRepo};
use serde::Serialize;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::handlers::campaigns::{load_campaign, require_seat};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::ws::RoomEvent;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// One seat as shown in the GM's player panel.
#[derive(Debug, Serialize)]
pub struct PlayerInfo {
    pub user_id: DbId,
    pub character_id: Option<DbId>,
    pub role: String,
    pub is_ready: bool,
    pub inventory_count: i64,
}

/// A player's items with totals.
#[derive(Debug, Serialize)]
pub struct InventorySummary {
    pub user_id: DbId,
    pub character_id: Option<DbId>,
    pub total_items: i64,
    pub items_by_category: BTreeMap<String, i64>,
    pub items: Vec<InventoryItem>,
}

fn item_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "InventoryItem",
        id,
    })
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /api/v1/campaigns/{id}/players
pub async fn list_players(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<PlayerInfo>>>> {
    load_campaign(&state, id).await?;
    require_seat(&state, id, auth.user_id).await?;

    let counts: BTreeMap<DbId, i64> = InventoryRepo::counts_for_campaign(&state.pool, id)
        .await?
        .into_iter()
        .map(|c| (c.user_id, c.item_count))
        .collect();
    let players = ParticipantRepo::list(&state.pool, id)
        .await?
        .into_iter()
        .map(|p| PlayerInfo {
            inventory_count: counts.get(&p.user_id).copied().unwrap_or(0),
            user_id: p.user_id,
            character_id: p.character_id,
            role: p.role,
            is_ready: p.is_ready,
        })
        .collect();
    Ok(Json(DataResponse { data: players }))
}

/// GET /api/v1/campaigns/{id}/inventory
///
/// Every item in the campaign. GM only.
pub async fn list_all(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<InventoryItem>>>> {
    let campaign = load_campaign(&state, id).await?;
    can_manage_inventory(auth.user_id, campaign.game_master_id)?;
    let items = InventoryRepo::list_for_campaign(&state.pool, id).await?;
    Ok(Json(DataResponse { data: items }))
}

/// GET /api/v1/campaigns/{id}/inventory/{user_id}
pub async fn player_inventory(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((id, user_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<InventorySummary>>> {
    let campaign = load_campaign(&state, id).await?;
    require_seat(&state, id, auth.user_id).await?;
    can_view_inventory(auth.user_id, user_id, campaign.game_master_id)?;

    let seat = ParticipantRepo::find(&state.pool, id, user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Participant",
            id: user_id,
        }))?;
    let items = InventoryRepo::list_for_user(&state.pool, id, user_id).await?;
    let totals = tally(items.iter().map(|i| (i.item_category.as_str(), i.quantity)));

    Ok(Json(DataResponse {
        data: InventorySummary {
            user_id,
            character_id: seat.character_id,
            total_items: totals.total_items,
            items_by_category: totals.items_by_category,
            items,
        },
    }))
}

// ---------------------------------------------------------------------------
// GM actions
// ---------------------------------------------------------------------------

/// POST /api/v1/campaigns/{id}/inventory
///
/// Gives an item to a seated player. The same item name given twice stacks.
pub async fn add_item(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<AddInventoryItem>,
) -> AppResult<(StatusCode, Json<DataResponse<InventoryItem>>)> {
    let campaign = load_campaign(&state, id).await?;
    can_manage_inventory(auth.user_id, campaign.game_master_id)?;
    validate_new_item(
        &input.item_name,
        &input.item_category,
        input.quantity,
        input.item_description.as_deref(),
        input.notes.as_deref(),
        input.item_image_url.as_deref(),
    )?;

    let seat = ParticipantRepo::find(&state.pool, id, input.user_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation(
                "Items can only be given to participants".into(),
            ))
        })?;
    if seat.role != ROLE_PLAYER {
        return Err(AppError::Core(CoreError::Validation(
            "Items can only be given to players".into(),
        )));
    }

    let item = InventoryRepo::add(&state.pool, id, seat.character_id, auth.user_id, &input).await?;
    tracing::info!(
        campaign_id = id,
        user_id = input.user_id,
        item_id = item.id,
        quantity = input.quantity,
        "Inventory item added",
    );

    let event = RoomEvent::message(
        id,
        MSG_ITEM_ADDED,
        format!(
            "Player {} received {}x {}",
            input.user_id, input.quantity, item.item_name
        ),
        Some(auth.user_id),
    )
    .with_extra_data(Some(json!({
        "item_id": item.id,
        "user_id": item.user_id,
        "item_name": item.item_name,
        "item_category": item.item_category,
        "quantity": item.quantity,
    })));
    state
        .ws_manager
        .broadcast_to_campaign(id, event.to_message())
        .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: item })))
}

/// PUT /api/v1/campaigns/{id}/inventory/{item_id}
///
/// A quantity of zero removes the item and answers 204.
pub async fn update_item(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((id, item_id)): Path<(DbId, DbId)>,
    Json(input): Json<UpdateInventoryItem>,
) -> AppResult<Response> {
    let campaign = load_campaign(&state, id).await?;
    can_manage_inventory(auth.user_id, campaign.game_master_id)?;
    if let Some(quantity) = input.quantity {
        validate_quantity_update(quantity)?;
    }
    if let Some(notes) = &input.notes {
        validate_notes(notes)?;
    }

    if input.quantity == Some(0) {
        if !InventoryRepo::delete(&state.pool, id, item_id).await? {
            return Err(item_not_found(item_id));
        }
        tracing::info!(campaign_id = id, item_id, "Inventory item used up");
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let item = InventoryRepo::update(
        &state.pool,
        id,
        item_id,
        input.quantity,
        input.notes.as_deref(),
    )
    .await?
    .ok_or_else(|| item_not_found(item_id))?;
    Ok(Json(DataResponse { data: item }).into_response())
}

/// DELETE /api/v1/campaigns/{id}/inventory/{item_id}
pub async fn delete_item(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((id, item_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    let campaign = load_campaign(&state, id).await?;
    can_manage_inventory(auth.user_id, campaign.game_master_id)?;
    if !InventoryRepo::delete(&state.pool, id, item_id).await? {
        return Err(item_not_found(item_id));
    }
    tracing::info!(campaign_id = id, item_id, "Inventory item removed");
    Ok(StatusCode::NO_CONTENT)
}
