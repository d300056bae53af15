//! Metadata for images downloaded to the local image directory.

use serde::Serialize;
use sqlx::FromRow;
use loreforge_core::types::{DbId, Timestamp};

/// A row from the `image_cache` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ImageCacheEntry {
    pub id: DbId,
    pub url: String,
    pub url_hash: String,
    pub local_path: String,
    pub size_bytes: Option<i64>,
    pub format: Option<String>,
    pub is_valid: bool,
    pub error_message: Option<String>,
    pub cached_at: Timestamp,
    pub last_accessed: Timestamp,
    pub expires_at: Option<Timestamp>,
    pub access_count: i32,
}

/// DTO for recording a downloaded image.
#[derive(Debug, Clone)]
pub struct RegisterImage {
    pub url: String,
    pub url_hash: String,
    pub local_path: String,
    pub size_bytes: Option<i64>,
    pub format: Option<String>,
}

/// Totals over the `image_cache` table.
#[derive(Debug, Clone, Serialize)]
pub struct ImageCacheStats {
    pub total: i64,
    pub valid: i64,
    pub invalid: i64,
    pub total_size_bytes: i64,
    pub total_size_mb: f64,
}
