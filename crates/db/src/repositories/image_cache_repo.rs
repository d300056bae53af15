//! Repository for the `image_cache` table.

use sqlx::PgPool;
use loreforge_core::types::Timestamp;

use crate::models::image_cache::{ImageCacheEntry, ImageCacheStats, RegisterImage};

/// Column list for image_cache queries.
const COLUMNS: &str = "id, url, url_hash, local_path, size_bytes, format, is_valid, \
    error_message, cached_at, last_accessed, expires_at, access_count";

/// Provides metadata operations for downloaded images.
pub struct ImageCacheRepo;

impl ImageCacheRepo {
    /// Record a downloaded image.
    ///
    /// Registering an already known hash counts as an access: the counter is
    /// bumped and the path, size and validity are refreshed.
    pub async fn register(
        pool: &PgPool,
        input: &RegisterImage,
    ) -> Result<ImageCacheEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO image_cache (url, url_hash, local_path, size_bytes, format)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT ON CONSTRAINT uq_image_cache_url_hash DO UPDATE SET
                access_count = image_cache.access_count + 1,
                last_accessed = now(),
                local_path = EXCLUDED.local_path,
                size_bytes = EXCLUDED.size_bytes,
                format = EXCLUDED.format,
                is_valid = true,
                error_message = NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ImageCacheEntry>(&query)
            .bind(&input.url)
            .bind(&input.url_hash)
            .bind(&input.local_path)
            .bind(input.size_bytes)
            .bind(&input.format)
            .fetch_one(pool)
            .await
    }

    /// Find an entry by URL hash.
    pub async fn find_by_hash(
        pool: &PgPool,
        url_hash: &str,
    ) -> Result<Option<ImageCacheEntry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM image_cache WHERE url_hash = $1");
        sqlx::query_as::<_, ImageCacheEntry>(&query)
            .bind(url_hash)
            .fetch_optional(pool)
            .await
    }

    /// Whether a valid copy of the image is recorded.
    pub async fn is_cached(pool: &PgPool, url_hash: &str) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM image_cache WHERE url_hash = $1 AND is_valid)",
        )
        .bind(url_hash)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }

    /// Flag an image as unusable.
    pub async fn mark_invalid(pool: &PgPool, url_hash: &str, reason: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE image_cache SET is_valid = false, error_message = $2 WHERE url_hash = $1",
        )
        .bind(url_hash)
        .bind(reason)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete entries cached before `cutoff`. Returns the number removed.
    pub async fn delete_cached_before(pool: &PgPool, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM image_cache WHERE cached_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Totals across the table.
    pub async fn stats(pool: &PgPool) -> Result<ImageCacheStats, sqlx::Error> {
        let (total, valid, total_size_bytes): (i64, i64, i64) = sqlx::query_as(
            "SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE is_valid),
                COALESCE(SUM(size_bytes), 0)::BIGINT
             FROM image_cache",
        )
        .fetch_one(pool)
        .await?;

        Ok(ImageCacheStats {
            total,
            valid,
            invalid: total - valid,
            total_size_bytes,
            total_size_mb: (total_size_bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0,
        })
    }
}
