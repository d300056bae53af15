//! Audit rows for scraping and prefetch operations.

use serde::Serialize;
use sqlx::FromRow;
use loreforge_core::types::{DbId, Timestamp};

pub const LOG_STATUS_RUNNING: &str = "running";
pub const LOG_STATUS_COMPLETED: &str = "completed";
pub const LOG_STATUS_FAILED: &str = "failed";

/// A row from the `scraping_logs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScrapingLog {
    pub id: DbId,
    pub universe: String,
    pub operation_type: String,
    pub articles_processed: i32,
    pub articles_created: i32,
    pub articles_updated: i32,
    pub images_downloaded: i32,
    pub images_cached: i32,
    pub images_failed: i32,
    pub errors_count: i32,
    pub duration_seconds: Option<i32>,
    pub status: String,
    pub error_message: Option<String>,
    pub extra_metadata: serde_json::Value,
    pub started_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

/// Final counters written when an operation finishes.
#[derive(Debug, Clone, Default)]
pub struct LogCompletion {
    pub articles_processed: i32,
    pub articles_created: i32,
    pub articles_updated: i32,
    pub images_downloaded: i32,
    pub images_cached: i32,
    pub images_failed: i32,
    pub errors_count: i32,
    /// One of `completed` or `failed`.
    pub status: String,
    pub error_message: Option<String>,
}
