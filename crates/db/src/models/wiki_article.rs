//! Cached wiki article rows and the DTOs used to write them.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use loreforge_core::types::{DbId, Timestamp};

/// A row from the `wiki_articles` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WikiArticle {
    pub id: DbId,
    pub title: String,
    pub universe: String,
    pub category: String,
    pub content: serde_json::Value,
    pub image_url: Option<String>,
    pub image_cached: bool,
    pub image_cache_path: Option<String>,
    pub source_url: Option<String>,
    pub scraped_at: Timestamp,
    pub expires_at: Timestamp,
    pub last_accessed: Timestamp,
    pub access_count: i32,
}

impl WikiArticle {
    /// Short description stored under `content.description`, if any.
    pub fn description(&self) -> Option<&str> {
        self.content.get("description").and_then(|v| v.as_str())
    }
}

/// An article row plus whether the upsert inserted it.
#[derive(Debug, Clone, FromRow)]
pub struct UpsertedArticle {
    #[sqlx(flatten)]
    pub article: WikiArticle,
    pub inserted: bool,
}

/// DTO for inserting or refreshing an article, keyed by `(title, universe)`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertWikiArticle {
    pub title: String,
    pub universe: String,
    pub category: String,
    pub content: serde_json::Value,
    pub image_url: Option<String>,
    pub source_url: Option<String>,
}

/// Outcome of a batched upsert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BulkUpsertStats {
    pub created: i64,
    pub updated: i64,
    pub failed: i64,
}

/// Article count for one category.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

/// Aggregate statistics over one universe's cached articles.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ArticleStats {
    pub total: i64,
    pub expired: i64,
    pub active: i64,
    pub with_images: i64,
    pub cached_images: i64,
    pub categories: i64,
    pub oldest_scraped_at: Option<Timestamp>,
    pub newest_scraped_at: Option<Timestamp>,
}
