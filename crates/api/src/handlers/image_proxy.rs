use axum::extract::{Query, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use loreforge_wiki::image::{image_format, validate_url};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ImageProxyParams {
    pub url: Option<String>,
}

fn content_type_for(url: &str) -> &'static str {
    match image_format(url).as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "image/jpeg",
    }
}

/// GET /api/v1/image-proxy?url=
///
/// Serves a wiki image from the local cache, downloading it on first use.
pub async fn proxy(
    State(state): State<AppState>,
    Query(params): Query<ImageProxyParams>,
) -> AppResult<Response> {
    let url = params
        .url
        .filter(|u| validate_url(u))
        .ok_or_else(|| AppError::BadRequest("A valid http(s) image url is required".into()))?;

    let outcome = state.hybrid.proxy_image(&url).await?;
    let bytes = match (outcome.success, outcome.bytes) {
        (true, Some(bytes)) => bytes,
        _ => {
            let reason = outcome.error.unwrap_or_else(|| "download failed".into());
            tracing::warn!(url = %url, error = %reason, "Image proxy fetch failed");
            return Err(AppError::BadGateway(format!("Could not fetch image: {reason}")));
        }
    };

    Ok((
        [
            (CONTENT_TYPE, content_type_for(&url)),
            (CACHE_CONTROL, "public, max-age=86400"),
        ],
        bytes,
    )
        .into_response())
}
