//! Repository for the `wiki_articles` table.
//!
//! Reads that serve cached content filter on `expires_at > now()` so that
//! stale rows are invisible until the next prefetch refreshes them.

use chrono::Utc;
use sqlx::{PgExecutor, PgPool};
use loreforge_core::cache_ttl;
use loreforge_core::search::like_pattern;
use loreforge_core::types::DbId;

use crate::models::wiki_article::{
    ArticleStats, BulkUpsertStats, CategoryCount, UpsertWikiArticle, UpsertedArticle, WikiArticle,
};

/// Column list for wiki_articles queries.
const COLUMNS: &str = "id, title, universe, category, content, image_url, image_cached, \
    image_cache_path, source_url, scraped_at, expires_at, last_accessed, access_count";

/// Provides cache reads and writes for wiki articles.
pub struct WikiArticleRepo;

impl WikiArticleRepo {
    /* ----------------------------------------------------------------------
    Writes
    ---------------------------------------------------------------------- */

    /// Insert an article or refresh the existing `(title, universe)` row.
    ///
    /// A refresh replaces content, category and links, and restarts the TTL.
    /// The image cache flag is left untouched.
    pub async fn upsert<'e, E>(
        executor: E,
        input: &UpsertWikiArticle,
        ttl_days: i64,
    ) -> Result<UpsertedArticle, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let expires_at = cache_ttl::expires_at(Utc::now(), ttl_days);
        let query = format!(
            "INSERT INTO wiki_articles
                (title, universe, category, content, image_url, source_url, expires_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT ON CONSTRAINT uq_wiki_articles_title_universe DO UPDATE SET
                category = EXCLUDED.category,
                content = EXCLUDED.content,
                image_url = EXCLUDED.image_url,
                source_url = EXCLUDED.source_url,
                scraped_at = now(),
                expires_at = EXCLUDED.expires_at
             RETURNING {COLUMNS}, (xmax = 0) AS inserted"
        );
        sqlx::query_as::<_, UpsertedArticle>(&query)
            .bind(&input.title)
            .bind(&input.universe)
            .bind(&input.category)
            .bind(&input.content)
            .bind(&input.image_url)
            .bind(&input.source_url)
            .bind(expires_at)
            .fetch_one(executor)
            .await
    }

    /// Upsert many articles, one transaction per batch.
    ///
    /// A batch that fails is rolled back and all of its rows count as
    /// failed; later batches still run.
    pub async fn bulk_upsert(
        pool: &PgPool,
        inputs: &[UpsertWikiArticle],
        batch_size: usize,
        ttl_days: i64,
    ) -> Result<BulkUpsertStats, sqlx::Error> {
        let mut stats = BulkUpsertStats::default();

        for batch in inputs.chunks(batch_size.max(1)) {
            let mut tx = pool.begin().await?;
            let mut created = 0;
            let mut updated = 0;
            let mut batch_error = None;

            for input in batch {
                match Self::upsert(&mut *tx, input, ttl_days).await {
                    Ok(row) if row.inserted => created += 1,
                    Ok(_) => updated += 1,
                    Err(e) => {
                        batch_error = Some(e);
                        break;
                    }
                }
            }

            match batch_error {
                None => {
                    tx.commit().await?;
                    stats.created += created;
                    stats.updated += updated;
                }
                Some(e) => {
                    tracing::warn!(
                        batch_len = batch.len(),
                        error = %e,
                        "Article batch upsert failed, rolling back",
                    );
                    tx.rollback().await?;
                    stats.failed += batch.len() as i64;
                }
            }
        }

        Ok(stats)
    }

    /// Record that an article's image now lives at `path`.
    pub async fn mark_image_cached(pool: &PgPool, id: DbId, path: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE wiki_articles SET image_cached = true, image_cache_path = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(path)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Forget the local copy of every article whose image lived at one of
    /// `paths`, so the next prefetch downloads it again.
    pub async fn clear_image_marks(pool: &PgPool, paths: &[String]) -> Result<u64, sqlx::Error> {
        if paths.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "UPDATE wiki_articles SET image_cached = false, image_cache_path = NULL
             WHERE image_cache_path = ANY($1)",
        )
        .bind(paths)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete expired rows, optionally for a single universe.
    pub async fn delete_expired(pool: &PgPool, universe: Option<&str>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM wiki_articles
             WHERE expires_at <= now()
               AND ($1::TEXT IS NULL OR universe = $1)",
        )
        .bind(universe)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete every article of a universe.
    pub async fn delete_by_universe(pool: &PgPool, universe: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM wiki_articles WHERE universe = $1")
            .bind(universe)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /* ----------------------------------------------------------------------
    Reads
    ---------------------------------------------------------------------- */

    /// List a category page ordered by title, optionally filtered by a title
    /// substring.
    pub async fn list_by_category(
        pool: &PgPool,
        universe: &str,
        category: &str,
        search: Option<&str>,
        limit: i64,
        offset: i64,
        include_expired: bool,
    ) -> Result<Vec<WikiArticle>, sqlx::Error> {
        let pattern = search.map(like_pattern);
        let query = format!(
            "SELECT {COLUMNS} FROM wiki_articles
             WHERE universe = $1
               AND category = $2
               AND ($3::TEXT IS NULL OR title ILIKE $3 ESCAPE '\\')
               AND ($4 OR expires_at > now())
             ORDER BY title ASC
             LIMIT $5 OFFSET $6"
        );
        sqlx::query_as::<_, WikiArticle>(&query)
            .bind(universe)
            .bind(category)
            .bind(pattern)
            .bind(include_expired)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count non-expired articles matching the same filters as
    /// [`Self::list_by_category`].
    pub async fn count_by_category(
        pool: &PgPool,
        universe: &str,
        category: &str,
        search: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        let pattern = search.map(like_pattern);
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM wiki_articles
             WHERE universe = $1
               AND category = $2
               AND ($3::TEXT IS NULL OR title ILIKE $3 ESCAPE '\\')
               AND expires_at > now()",
        )
        .bind(universe)
        .bind(category)
        .bind(pattern)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// Fetch a live article by exact title and record the access.
    pub async fn find_by_title(
        pool: &PgPool,
        universe: &str,
        title: &str,
    ) -> Result<Option<WikiArticle>, sqlx::Error> {
        let query = format!(
            "UPDATE wiki_articles
             SET access_count = access_count + 1, last_accessed = now()
             WHERE universe = $1 AND title = $2 AND expires_at > now()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WikiArticle>(&query)
            .bind(universe)
            .bind(title)
            .fetch_optional(pool)
            .await
    }

    /// Case-insensitive title search over live articles.
    pub async fn search(
        pool: &PgPool,
        universe: &str,
        query_str: &str,
        category: Option<&str>,
        limit: i64,
    ) -> Result<Vec<WikiArticle>, sqlx::Error> {
        let pattern = like_pattern(query_str);
        let query = format!(
            "SELECT {COLUMNS} FROM wiki_articles
             WHERE universe = $1
               AND title ILIKE $2 ESCAPE '\\'
               AND ($3::TEXT IS NULL OR category = $3)
               AND expires_at > now()
             ORDER BY title ASC
             LIMIT $4"
        );
        sqlx::query_as::<_, WikiArticle>(&query)
            .bind(universe)
            .bind(&pattern)
            .bind(category)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// All live articles of a universe, grouped-friendly ordering.
    pub async fn list_active(pool: &PgPool, universe: &str) -> Result<Vec<WikiArticle>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM wiki_articles
             WHERE universe = $1 AND expires_at > now()
             ORDER BY category ASC, title ASC"
        );
        sqlx::query_as::<_, WikiArticle>(&query)
            .bind(universe)
            .fetch_all(pool)
            .await
    }

    /// Live articles that have an image URL but no local copy yet.
    pub async fn list_missing_images(
        pool: &PgPool,
        universe: &str,
        category: &str,
        limit: i64,
    ) -> Result<Vec<WikiArticle>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM wiki_articles
             WHERE universe = $1
               AND category = $2
               AND image_url IS NOT NULL
               AND image_cached = false
               AND expires_at > now()
             ORDER BY id ASC
             LIMIT $3"
        );
        sqlx::query_as::<_, WikiArticle>(&query)
            .bind(universe)
            .bind(category)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Live article counts per category.
    pub async fn category_counts(
        pool: &PgPool,
        universe: &str,
    ) -> Result<Vec<CategoryCount>, sqlx::Error> {
        sqlx::query_as::<_, CategoryCount>(
            "SELECT category, COUNT(*) AS count FROM wiki_articles
             WHERE universe = $1 AND expires_at > now()
             GROUP BY category
             ORDER BY category ASC",
        )
        .bind(universe)
        .fetch_all(pool)
        .await
    }

    /// Number of live articles in a universe.
    pub async fn count_for_universe(pool: &PgPool, universe: &str) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM wiki_articles WHERE universe = $1 AND expires_at > now()",
        )
        .bind(universe)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// Aggregate statistics for a universe, expired rows included.
    pub async fn stats(pool: &PgPool, universe: &str) -> Result<ArticleStats, sqlx::Error> {
        sqlx::query_as::<_, ArticleStats>(
            "SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE expires_at <= now()) AS expired,
                COUNT(*) FILTER (WHERE expires_at > now()) AS active,
                COUNT(*) FILTER (WHERE image_url IS NOT NULL) AS with_images,
                COUNT(*) FILTER (WHERE image_cached) AS cached_images,
                COUNT(DISTINCT category) AS categories,
                MIN(scraped_at) AS oldest_scraped_at,
                MAX(scraped_at) AS newest_scraped_at
             FROM wiki_articles
             WHERE universe = $1",
        )
        .bind(universe)
        .fetch_one(pool)
        .await
    }
}
