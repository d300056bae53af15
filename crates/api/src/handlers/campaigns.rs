//! Handlers for the `/campaigns` resource: lobby management, the game
//! master's status controls, the message log and the current location.
//!
//! Every state change is announced to the campaign's WebSocket room as a
//! `system` event.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use loreforge_core::campaign::{
    can_assign_gm, can_delete, can_join, can_leave, can_post_message, can_set_location, can_start,
    can_toggle_ready, can_transition, validate_max_players, validate_title, Seat, STATUS_ACTIVE,
    STATUS_COMPLETED, STATUS_PAUSED,
};
use loreforge_core::error::CoreError;
use loreforge_core::search::{
    clamp_limit, clamp_offset, DEFAULT_MESSAGE_LIMIT, MAX_MESSAGE_LIMIT,
};
use loreforge_core::types::DbId;
use loreforge_core::universe::validate_universe;
use loreforge_db::models::campaign::{
    Campaign, CampaignDetail, CampaignMessage, CampaignParticipant, CreateCampaign,
    CreateCampaignMessage,
};
use loreforge_db::repositories::{
    CampaignMessageRepo, CampaignRepo, CharacterRepo, ParticipantRepo,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::ws::RoomEvent;

/// Default number of public lobbies listed.
const DEFAULT_LOBBY_LIMIT: i64 = 50;

/// Maximum number of public lobbies listed.
const MAX_LOBBY_LIMIT: i64 = 200;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body of `GET /campaigns`.
#[derive(Debug, Serialize)]
pub struct CampaignLists {
    /// Public campaigns still in the lobby.
    pub lobbies: Vec<Campaign>,
    /// Campaigns the caller has a seat in.
    pub mine: Vec<Campaign>,
}

#[derive(Debug, Default, Deserialize)]
pub struct JoinRequest {
    pub character_id: Option<DbId>,
}

#[derive(Debug, Deserialize)]
pub struct AssignGmRequest {
    pub user_id: DbId,
}

#[derive(Debug, Deserialize)]
pub struct MessageListParams {
    pub limit: Option<i64>,
    pub before_id: Option<DbId>,
}

#[derive(Debug, Deserialize)]
pub struct SetLocationRequest {
    pub location: String,
    pub image_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) async fn load_campaign(state: &AppState, id: DbId) -> AppResult<Campaign> {
    CampaignRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Campaign",
            id,
        }))
}

/// The caller's seat, or 403 when they have none.
pub(crate) async fn require_seat(
    state: &AppState,
    campaign_id: DbId,
    user_id: DbId,
) -> AppResult<CampaignParticipant> {
    ParticipantRepo::find(&state.pool, campaign_id, user_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Forbidden(
                "Not a participant of this campaign".into(),
            ))
        })
}

/// Reject character references the caller does not own.
async fn require_own_character(
    state: &AppState,
    character_id: DbId,
    user_id: DbId,
) -> AppResult<loreforge_db::models::character::Character> {
    CharacterRepo::find_by_id(&state.pool, character_id)
        .await?
        .filter(|c| c.owner_id == user_id)
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Character",
            id: character_id,
        }))
}

async fn announce(state: &AppState, campaign_id: DbId, content: String) {
    let delivered = state
        .ws_manager
        .broadcast_to_campaign(campaign_id, RoomEvent::system(campaign_id, content).to_message())
        .await;
    tracing::debug!(campaign_id, delivered, "Announced campaign event");
}

// ---------------------------------------------------------------------------
// Lobby
// ---------------------------------------------------------------------------

/// POST /api/v1/campaigns
///
/// The creator takes the first seat as a player.
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateCampaign>,
) -> AppResult<(StatusCode, Json<DataResponse<Campaign>>)> {
    validate_title(&input.title)?;
    validate_universe(&input.universe)?;
    if let Some(max_players) = input.max_players {
        validate_max_players(max_players)?;
    }

    let campaign = CampaignRepo::create(&state.pool, auth.user_id, &input).await?;
    tracing::info!(campaign_id = campaign.id, user_id = auth.user_id, "Campaign created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: campaign })))
}

/// GET /api/v1/campaigns?limit=&offset=
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<CampaignLists>>> {
    let limit = clamp_limit(params.limit, DEFAULT_LOBBY_LIMIT, MAX_LOBBY_LIMIT);
    let offset = clamp_offset(params.offset);

    let lobbies = CampaignRepo::list_public_lobbies(&state.pool, limit, offset).await?;
    let mine = CampaignRepo::list_for_user(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse {
        data: CampaignLists { lobbies, mine },
    }))
}

/// GET /api/v1/campaigns/{id}
///
/// Private campaigns are visible to their participants only.
pub async fn get_by_id(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<CampaignDetail>>> {
    let campaign = load_campaign(&state, id).await?;
    let participants = ParticipantRepo::list(&state.pool, id).await?;
    if !campaign.is_public && !participants.iter().any(|p| p.user_id == auth.user_id) {
        return Err(AppError::Core(CoreError::Forbidden(
            "This campaign is private".into(),
        )));
    }
    Ok(Json(DataResponse {
        data: CampaignDetail {
            campaign,
            participants,
        },
    }))
}

/// DELETE /api/v1/campaigns/{id}
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let campaign = load_campaign(&state, id).await?;
    can_delete(&campaign.status, auth.user_id, campaign.creator_id)?;

    announce(&state, id, "The campaign was deleted by its creator".into()).await;
    CampaignRepo::delete(&state.pool, id).await?;
    tracing::info!(campaign_id = id, "Campaign deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/campaigns/{id}/join
///
/// The optional character must belong to the caller and to the campaign's
/// universe.
pub async fn join(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<JoinRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<CampaignParticipant>>)> {
    let campaign = load_campaign(&state, id).await?;
    let already_joined = ParticipantRepo::find(&state.pool, id, auth.user_id)
        .await?
        .is_some();
    let count = ParticipantRepo::count(&state.pool, id).await?;
    can_join(&campaign.status, count, campaign.max_players, already_joined)?;

    if let Some(character_id) = input.character_id {
        let character = require_own_character(&state, character_id, auth.user_id).await?;
        if character.universe != campaign.universe {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Character belongs to '{}', campaign is set in '{}'",
                character.universe, campaign.universe
            ))));
        }
    }

    let seat = ParticipantRepo::add(&state.pool, id, auth.user_id, input.character_id).await?;
    CampaignRepo::touch_activity(&state.pool, id).await?;
    announce(&state, id, format!("Player {} joined the campaign", auth.user_id)).await;
    Ok((StatusCode::CREATED, Json(DataResponse { data: seat })))
}

/// POST /api/v1/campaigns/{id}/leave
///
/// A leaving game master vacates the GM seat.
pub async fn leave(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let campaign = load_campaign(&state, id).await?;
    require_seat(&state, id, auth.user_id).await?;
    can_leave(&campaign.status, auth.user_id, campaign.creator_id)?;

    ParticipantRepo::remove(&state.pool, id, auth.user_id).await?;
    if campaign.game_master_id == Some(auth.user_id) {
        CampaignRepo::clear_game_master(&state.pool, id).await?;
    }
    CampaignRepo::touch_activity(&state.pool, id).await?;
    announce(&state, id, format!("Player {} left the campaign", auth.user_id)).await;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/campaigns/{id}/ready
///
/// Toggles the caller's ready flag.
pub async fn toggle_ready(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<CampaignParticipant>>> {
    let campaign = load_campaign(&state, id).await?;
    let seat = require_seat(&state, id, auth.user_id).await?;
    can_toggle_ready(&campaign.status, &seat.role)?;

    let seat = ParticipantRepo::set_ready(&state.pool, id, auth.user_id, !seat.is_ready).await?;
    let notice = if seat.is_ready {
        format!("Player {} is ready", auth.user_id)
    } else {
        format!("Player {} is not ready", auth.user_id)
    };
    announce(&state, id, notice).await;
    Ok(Json(DataResponse { data: seat }))
}

/// POST /api/v1/campaigns/{id}/gm
pub async fn assign_gm(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<AssignGmRequest>,
) -> AppResult<Json<DataResponse<Campaign>>> {
    let campaign = load_campaign(&state, id).await?;
    let target_is_participant = ParticipantRepo::find(&state.pool, id, input.user_id)
        .await?
        .is_some();
    can_assign_gm(
        &campaign.status,
        auth.user_id,
        campaign.creator_id,
        target_is_participant,
    )?;

    let campaign = CampaignRepo::set_game_master(&state.pool, id, input.user_id).await?;
    announce(
        &state,
        id,
        format!("Player {} is now the game master", input.user_id),
    )
    .await;
    Ok(Json(DataResponse { data: campaign }))
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// POST /api/v1/campaigns/{id}/start
pub async fn start(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Campaign>>> {
    let campaign = load_campaign(&state, id).await?;
    let participants = ParticipantRepo::list(&state.pool, id).await?;
    let seats: Vec<Seat<'_>> = participants
        .iter()
        .map(|p| Seat {
            user_id: p.user_id,
            role: &p.role,
            is_ready: p.is_ready,
        })
        .collect();
    can_start(&campaign.status, auth.user_id, campaign.game_master_id, &seats)?;

    let campaign = CampaignRepo::update_status(&state.pool, id, STATUS_ACTIVE).await?;
    tracing::info!(campaign_id = id, players = seats.len(), "Campaign started");
    announce(&state, id, "The campaign has started".into()).await;
    Ok(Json(DataResponse { data: campaign }))
}

/// POST /api/v1/campaigns/{id}/pause
pub async fn pause(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Campaign>>> {
    transition(&state, &auth, id, STATUS_PAUSED, "The game master paused the campaign").await
}

/// POST /api/v1/campaigns/{id}/resume
pub async fn resume(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Campaign>>> {
    transition(&state, &auth, id, STATUS_ACTIVE, "The campaign has resumed").await
}

/// POST /api/v1/campaigns/{id}/end
pub async fn end(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Campaign>>> {
    transition(&state, &auth, id, STATUS_COMPLETED, "The campaign has ended").await
}

async fn transition(
    state: &AppState,
    auth: &AuthUser,
    id: DbId,
    to: &str,
    notice: &str,
) -> AppResult<Json<DataResponse<Campaign>>> {
    let campaign = load_campaign(state, id).await?;
    can_transition(&campaign.status, to, auth.user_id, campaign.game_master_id)?;

    let updated = CampaignRepo::update_status(&state.pool, id, to).await?;
    tracing::info!(campaign_id = id, from = %campaign.status, to, "Campaign status changed");
    announce(state, id, notice.to_string()).await;
    Ok(Json(DataResponse { data: updated }))
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// GET /api/v1/campaigns/{id}/messages?limit=&before_id=
pub async fn list_messages(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<MessageListParams>,
) -> AppResult<Json<DataResponse<Vec<CampaignMessage>>>> {
    load_campaign(&state, id).await?;
    require_seat(&state, id, auth.user_id).await?;

    let limit = clamp_limit(params.limit, DEFAULT_MESSAGE_LIMIT, MAX_MESSAGE_LIMIT);
    let messages = CampaignMessageRepo::list(&state.pool, id, limit, params.before_id).await?;
    Ok(Json(DataResponse { data: messages }))
}

/// POST /api/v1/campaigns/{id}/messages
///
/// Persists the message, then relays it to the room.
pub async fn post_message(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CreateCampaignMessage>,
) -> AppResult<(StatusCode, Json<DataResponse<CampaignMessage>>)> {
    let campaign = load_campaign(&state, id).await?;
    let seat = require_seat(&state, id, auth.user_id).await?;
    if campaign.status == STATUS_COMPLETED {
        return Err(AppError::Core(CoreError::Conflict(
            "Campaign has ended".into(),
        )));
    }
    can_post_message(&seat.role, &input.message_type)?;
    if input.content.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Message content must not be empty".into(),
        )));
    }
    if let Some(character_id) = input.character_id {
        require_own_character(&state, character_id, auth.user_id).await?;
    }

    let message = CampaignMessageRepo::create(&state.pool, id, Some(auth.user_id), &input).await?;
    CampaignRepo::touch_activity(&state.pool, id).await?;

    let event = RoomEvent::message(
        id,
        message.message_type.clone(),
        message.content.clone(),
        Some(auth.user_id),
    )
    .with_character(message.character_id)
    .with_extra_data(Some(message.extra_data.clone()));
    state
        .ws_manager
        .broadcast_to_campaign(id, event.to_message())
        .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: message })))
}

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// PUT /api/v1/campaigns/{id}/location
pub async fn set_location(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SetLocationRequest>,
) -> AppResult<Json<DataResponse<Campaign>>> {
    let campaign = load_campaign(&state, id).await?;
    can_set_location(auth.user_id, campaign.game_master_id)?;
    let location = input.location.trim();
    if location.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Location must not be empty".into(),
        )));
    }

    let campaign =
        CampaignRepo::set_location(&state.pool, id, location, input.image_url.as_deref()).await?;

    let event = RoomEvent::location_change(id, auth.user_id, location, input.image_url.as_deref());
    state
        .ws_manager
        .broadcast_to_campaign(id, event.to_message())
        .await;
    announce(&state, id, format!("The party moved to {location}")).await;
    Ok(Json(DataResponse { data: campaign }))
}
