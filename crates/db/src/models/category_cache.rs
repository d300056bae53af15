//! Pre-computed per-category article counts.

use serde::Serialize;
use sqlx::FromRow;
use loreforge_core::types::{DbId, Timestamp};

/// A row from the `category_cache` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CategoryCacheEntry {
    pub id: DbId,
    pub universe: String,
    pub category: String,
    pub article_count: i32,
    pub articles_with_images: i32,
    pub last_updated: Timestamp,
    pub extra_metadata: serde_json::Value,
}
