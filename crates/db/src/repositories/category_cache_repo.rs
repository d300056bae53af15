//! Repository for the `category_cache` table.

use sqlx::PgPool;

use crate::models::category_cache::CategoryCacheEntry;

/// Column list for category_cache queries.
const COLUMNS: &str =
    "id, universe, category, article_count, articles_with_images, last_updated, extra_metadata";

/// Maintains the per-category count snapshot.
pub struct CategoryCacheRepo;

impl CategoryCacheRepo {
    /// Recompute the snapshot for a universe from live `wiki_articles` rows.
    ///
    /// Categories that no longer have live articles are dropped. Returns the
    /// number of categories written.
    pub async fn refresh(pool: &PgPool, universe: &str) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM category_cache WHERE universe = $1")
            .bind(universe)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query(
            "INSERT INTO category_cache (universe, category, article_count, articles_with_images)
             SELECT universe, category,
                    COUNT(*)::INTEGER,
                    (COUNT(*) FILTER (WHERE image_url IS NOT NULL))::INTEGER
             FROM wiki_articles
             WHERE universe = $1 AND expires_at > now()
             GROUP BY universe, category",
        )
        .bind(universe)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result.rows_affected())
    }

    /// Snapshot rows for a universe ordered by category.
    pub async fn list(pool: &PgPool, universe: &str) -> Result<Vec<CategoryCacheEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM category_cache WHERE universe = $1 ORDER BY category ASC"
        );
        sqlx::query_as::<_, CategoryCacheEntry>(&query)
            .bind(universe)
            .fetch_all(pool)
            .await
    }
}
