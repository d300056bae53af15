//! Handlers for the `/characters` resource.
//!
//! Characters belong to the authenticated user; another user's character
//! reads as not found.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use loreforge_core::error::CoreError;
use loreforge_core::types::DbId;
use loreforge_core::universe::validate_universe;
use loreforge_db::models::character::{Character, CreateCharacter, UpdateCharacter};
use loreforge_db::repositories::CharacterRepo;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CharacterListParams {
    pub universe: Option<String>,
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Character",
        id,
    })
}

fn validate_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation("Character name must not be empty".into()));
    }
    Ok(())
}

/// POST /api/v1/characters
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateCharacter>,
) -> AppResult<(StatusCode, Json<DataResponse<Character>>)> {
    validate_name(&input.name)?;
    validate_universe(&input.universe)?;

    let character = CharacterRepo::create(&state.pool, auth.user_id, &input).await?;
    tracing::info!(character_id = character.id, user_id = auth.user_id, "Character created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: character })))
}

/// GET /api/v1/characters?universe=
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<CharacterListParams>,
) -> AppResult<Json<DataResponse<Vec<Character>>>> {
    let characters =
        CharacterRepo::list_by_owner(&state.pool, auth.user_id, params.universe.as_deref()).await?;
    Ok(Json(DataResponse { data: characters }))
}

/// GET /api/v1/characters/{id}
pub async fn get_by_id(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Character>>> {
    let character = CharacterRepo::find_by_id(&state.pool, id)
        .await?
        .filter(|c| c.owner_id == auth.user_id)
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: character }))
}

/// PUT /api/v1/characters/{id}
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateCharacter>,
) -> AppResult<Json<DataResponse<Character>>> {
    if let Some(name) = &input.name {
        validate_name(name)?;
    }
    let character = CharacterRepo::update(&state.pool, id, auth.user_id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: character }))
}

/// DELETE /api/v1/characters/{id}
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if CharacterRepo::delete(&state.pool, id, auth.user_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}
