use axum::Json;
use loreforge_core::types::DbId;
use serde::Serialize;

use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;

/// Caller identity as carried by the access token.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: DbId,
    pub role: String,
}

/// GET /api/v1/auth/me
pub async fn me(auth: AuthUser) -> Json<DataResponse<MeResponse>> {
    Json(DataResponse {
        data: MeResponse {
            user_id: auth.user_id,
            role: auth.role,
        },
    })
}
