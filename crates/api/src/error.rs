use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use loreforge_cache::CacheError;
use loreforge_core::error::CoreError;
use loreforge_wiki::WikiError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`CacheError`] for the cache
/// tiers, and adds HTTP-specific variants. Implements [`IntoResponse`] to
/// produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `loreforge_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A failure inside the cache tiers or the wiki source behind them.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A resource addressed by name rather than id was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An upstream fetch (wiki or image host) failed.
    #[error("Upstream error: {0}")]
    BadGateway(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::Cache(err) => classify_cache_error(err),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg.clone()),
            AppError::InternalError(msg) => internal(msg),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn classify_core_error(err: &CoreError) -> (StatusCode, &'static str, String) {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
        CoreError::Internal(msg) => internal(msg),
    }
}

/// Classify a cache error.
///
/// - Database and domain errors map as if raised directly.
/// - Wiki failures map to 502 since the source is an upstream service.
/// - File tier I/O and decode failures map to 500.
fn classify_cache_error(err: &CacheError) -> (StatusCode, &'static str, String) {
    match err {
        CacheError::Db(db) => classify_sqlx_error(db),
        CacheError::Core(core) | CacheError::Wiki(WikiError::UnsupportedUniverse(core)) => {
            classify_core_error(core)
        }
        CacheError::Wiki(wiki) => {
            tracing::warn!(error = %wiki, "Wiki source failed");
            (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", wiki.to_string())
        }
        CacheError::Io(_) | CacheError::Json(_) => internal(&err.to_string()),
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            internal(&db_err.to_string())
        }
        other => internal(&other.to_string()),
    }
}

fn internal(detail: &str) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %detail, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}
