//! Shared response envelope types for API handlers.
//!
//! Player-owned resources (characters, campaigns, messages) use a
//! `{ "data": ... }` envelope. Canon, cache and prefetch endpoints return
//! their report objects unwrapped.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// ```ignore
/// Ok(Json(DataResponse { data: characters }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
