//! Repository for the `scraping_logs` table.

use sqlx::PgPool;
use loreforge_core::types::DbId;

use crate::models::scraping_log::{LogCompletion, ScrapingLog, LOG_STATUS_RUNNING};

/// Column list for scraping_logs queries.
const COLUMNS: &str = "id, universe, operation_type, articles_processed, articles_created, \
    articles_updated, images_downloaded, images_cached, images_failed, errors_count, \
    duration_seconds, status, error_message, extra_metadata, started_at, completed_at";

/// Provides audit log operations for scraping runs.
pub struct ScrapingLogRepo;

impl ScrapingLogRepo {
    /// Open a log entry in the `running` state.
    pub async fn create(
        pool: &PgPool,
        universe: &str,
        operation_type: &str,
    ) -> Result<ScrapingLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO scraping_logs (universe, operation_type, status)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ScrapingLog>(&query)
            .bind(universe)
            .bind(operation_type)
            .bind(LOG_STATUS_RUNNING)
            .fetch_one(pool)
            .await
    }

    /// Close a log entry with final counters and its duration.
    pub async fn complete(
        pool: &PgPool,
        id: DbId,
        done: &LogCompletion,
    ) -> Result<ScrapingLog, sqlx::Error> {
        let query = format!(
            "UPDATE scraping_logs SET
                articles_processed = $2,
                articles_created = $3,
                articles_updated = $4,
                images_downloaded = $5,
                images_cached = $6,
                images_failed = $7,
                errors_count = $8,
                status = $9,
                error_message = $10,
                completed_at = now(),
                duration_seconds = GREATEST(0, EXTRACT(EPOCH FROM (now() - started_at)))::INTEGER
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ScrapingLog>(&query)
            .bind(id)
            .bind(done.articles_processed)
            .bind(done.articles_created)
            .bind(done.articles_updated)
            .bind(done.images_downloaded)
            .bind(done.images_cached)
            .bind(done.images_failed)
            .bind(done.errors_count)
            .bind(&done.status)
            .bind(&done.error_message)
            .fetch_one(pool)
            .await
    }

    /// Most recent entries first, optionally for one universe.
    pub async fn recent(
        pool: &PgPool,
        universe: Option<&str>,
        limit: i64,
    ) -> Result<Vec<ScrapingLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM scraping_logs
             WHERE ($1::TEXT IS NULL OR universe = $1)
             ORDER BY started_at DESC, id DESC
             LIMIT $2"
        );
        sqlx::query_as::<_, ScrapingLog>(&query)
            .bind(universe)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
