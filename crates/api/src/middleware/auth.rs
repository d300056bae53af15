//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use loreforge_core::error::CoreError;
use loreforge_core::types::DbId;

use crate::auth::jwt::{validate_token, JwtConfig};
use crate::error::AppError;
use crate::state::AppState;

/// Caller identity taken from a JWT Bearer token in the `Authorization`
/// header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The `sub` claim.
    pub user_id: DbId,
    /// The `role` claim.
    pub role: String,
}

impl AuthUser {
    /// Resolve a raw token, as passed in the WebSocket `token` query
    /// parameter.
    pub fn from_token(token: &str, config: &JwtConfig) -> Result<Self, AppError> {
        let claims = validate_token(token, config).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;
        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        AuthUser::from_token(token, &state.config.jwt)
    }
}
