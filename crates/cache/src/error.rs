//! Error type for cache operations.

use loreforge_core::error::CoreError;
use loreforge_wiki::WikiError;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error(transparent)]
    Wiki(#[from] WikiError),

    #[error("Cache file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}
