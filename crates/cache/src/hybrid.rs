//! Relational tier reads plus the image bookkeeping that ties
//! `wiki_articles` rows to files on disk.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;
use loreforge_core::cache_ttl::IMAGE_FILE_MAX_AGE_DAYS;
use loreforge_core::category::SEARCHABLE_CATEGORIES;
use loreforge_core::hashing::sha256_hex;
use loreforge_core::types::{DbId, Timestamp};
use loreforge_db::models::category_cache::CategoryCacheEntry;
use loreforge_db::models::image_cache::{ImageCacheStats, RegisterImage};
use loreforge_db::models::wiki_article::{ArticleStats, WikiArticle};
use loreforge_db::repositories::{
    CategoryCacheRepo, ImageCacheRepo, ScrapingLogRepo, WikiArticleRepo,
};
use loreforge_wiki::image::{image_format, BatchStats, FetchOutcome, ImageFetcher};

use crate::error::CacheError;

/// Number of scraping log rows included in stats.
const RECENT_OPERATIONS: i64 = 5;

/// A category listing entry.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryItem {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub image_cached: bool,
}

impl From<WikiArticle> for CategoryItem {
    fn from(article: WikiArticle) -> Self {
        Self {
            description: article.description().map(str::to_string),
            id: article.id,
            name: article.title,
            image_url: article.image_url,
            image_cached: article.image_cached,
        }
    }
}

/// One page of a category listing.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryPage {
    pub universe: String,
    pub category: String,
    pub total: i64,
    pub offset: i64,
    pub limit: i64,
    pub returned: usize,
    pub items: Vec<CategoryItem>,
}

/// A cross-category search hit.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentOperation {
    pub operation: String,
    pub status: String,
    pub duration_seconds: Option<i32>,
    pub articles_processed: i32,
    pub started_at: Timestamp,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComprehensiveStats {
    pub universe: String,
    pub timestamp: Timestamp,
    pub postgresql: ArticleStats,
    pub category_cache: Vec<CategoryCacheEntry>,
    pub recent_operations: Vec<RecentOperation>,
    pub images: ImageCacheStats,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CleanupReport {
    pub articles_deleted: u64,
    pub image_files_deleted: usize,
    pub image_rows_deleted: u64,
    /// Articles whose image file was removed and must be fetched again.
    pub image_marks_cleared: u64,
}

pub struct HybridCache {
    pool: PgPool,
    images: Arc<ImageFetcher>,
    ttl_days: i64,
}

impl HybridCache {
    pub fn new(pool: PgPool, images: Arc<ImageFetcher>, ttl_days: i64) -> Self {
        Self {
            pool,
            images,
            ttl_days,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn images(&self) -> &ImageFetcher {
        &self.images
    }

    pub fn ttl_days(&self) -> i64 {
        self.ttl_days
    }

    /* ----------------------------------------------------------------------
    Reads
    ---------------------------------------------------------------------- */

    /// A page of live articles in a category, with the total count for the
    /// same filter.
    pub async fn category_with_metadata(
        &self,
        universe: &str,
        category: &str,
        limit: i64,
        offset: i64,
        search: Option<&str>,
    ) -> Result<CategoryPage, CacheError> {
        let articles = WikiArticleRepo::list_by_category(
            &self.pool, universe, category, search, limit, offset, false,
        )
        .await?;
        let total = WikiArticleRepo::count_by_category(&self.pool, universe, category, search).await?;

        let items: Vec<CategoryItem> = articles.into_iter().map(CategoryItem::from).collect();
        Ok(CategoryPage {
            universe: universe.to_string(),
            category: category.to_string(),
            total,
            offset,
            limit,
            returned: items.len(),
            items,
        })
    }

    /// Search every searchable category. Categories without hits are
    /// omitted.
    pub async fn search_all_categories(
        &self,
        universe: &str,
        query: &str,
        limit: i64,
    ) -> Result<BTreeMap<String, Vec<SearchHit>>, CacheError> {
        let mut results = BTreeMap::new();
        for category in SEARCHABLE_CATEGORIES {
            let articles =
                WikiArticleRepo::search(&self.pool, universe, query, Some(*category), limit).await?;
            if articles.is_empty() {
                continue;
            }
            let hits = articles
                .into_iter()
                .map(|a| SearchHit {
                    description: a.description().map(str::to_string),
                    name: a.title,
                })
                .collect();
            results.insert(category.to_string(), hits);
        }
        Ok(results)
    }

    /* ----------------------------------------------------------------------
    Images
    ---------------------------------------------------------------------- */

    /// Download missing images for up to `limit` articles of a category and
    /// record each success in `image_cache` and on the article row.
    pub async fn prefetch_images_for_category(
        &self,
        universe: &str,
        category: &str,
        limit: i64,
        workers: usize,
    ) -> Result<BatchStats, CacheError> {
        let articles =
            WikiArticleRepo::list_missing_images(&self.pool, universe, category, limit).await?;
        if articles.is_empty() {
            return Ok(BatchStats::default());
        }

        let mut by_url: HashMap<String, Vec<DbId>> = HashMap::new();
        for article in &articles {
            if let Some(url) = &article.image_url {
                by_url.entry(url.clone()).or_default().push(article.id);
            }
        }
        tracing::info!(universe, category, images = by_url.len(), "Prefetching category images");

        let urls = by_url.keys().cloned().collect();
        let mut stats = BatchStats::default();
        for (url, outcome) in self.images.fetch_all(urls, workers).await {
            stats.record(&outcome);
            if !outcome.success {
                continue;
            }
            for article_id in by_url.get(&url).into_iter().flatten() {
                if let Err(e) = self.record_cached_image(*article_id, &url, &outcome).await {
                    tracing::warn!(universe, category, url = %url, error = %e, "Failed to record cached image");
                }
            }
        }

        tracing::info!(
            universe,
            category,
            downloaded = stats.downloaded,
            cached = stats.cached,
            failed = stats.failed,
            "Category image prefetch finished",
        );
        Ok(stats)
    }

    /// Make sure an article's image is on disk. Returns `true` when the
    /// article was newly marked as cached.
    pub async fn ensure_image_cached(&self, article: &WikiArticle) -> Result<bool, CacheError> {
        let Some(url) = article.image_url.as_deref() else {
            return Ok(false);
        };
        if article.image_cached {
            return Ok(false);
        }

        let outcome = self.images.fetch(url).await;
        if !outcome.success {
            return Ok(false);
        }
        self.record_cached_image(article.id, url, &outcome).await?;
        Ok(true)
    }

    /// Fetch an image for the proxy endpoint, registering fresh downloads.
    pub async fn proxy_image(&self, url: &str) -> Result<FetchOutcome, CacheError> {
        let outcome = self.images.fetch(url).await;
        if outcome.success && !outcome.was_cached {
            ImageCacheRepo::register(&self.pool, &register_input(url, &outcome)).await?;
        }
        Ok(outcome)
    }

    async fn record_cached_image(
        &self,
        article_id: DbId,
        url: &str,
        outcome: &FetchOutcome,
    ) -> Result<(), CacheError> {
        let input = register_input(url, outcome);
        ImageCacheRepo::register(&self.pool, &input).await?;
        WikiArticleRepo::mark_image_cached(&self.pool, article_id, &input.local_path).await?;
        Ok(())
    }

    /* ----------------------------------------------------------------------
    Maintenance
    ---------------------------------------------------------------------- */

    pub async fn comprehensive_stats(&self, universe: &str) -> Result<ComprehensiveStats, CacheError> {
        let postgresql = WikiArticleRepo::stats(&self.pool, universe).await?;
        let category_cache = CategoryCacheRepo::list(&self.pool, universe).await?;
        let recent_operations = ScrapingLogRepo::recent(&self.pool, Some(universe), RECENT_OPERATIONS)
            .await?
            .into_iter()
            .map(|log| RecentOperation {
                operation: log.operation_type,
                status: log.status,
                duration_seconds: log.duration_seconds,
                articles_processed: log.articles_processed,
                started_at: log.started_at,
            })
            .collect();
        let images = ImageCacheRepo::stats(&self.pool).await?;

        Ok(ComprehensiveStats {
            universe: universe.to_string(),
            timestamp: Utc::now(),
            postgresql,
            category_cache,
            recent_operations,
            images,
        })
    }

    /// Delete expired article rows, then image files and registry rows
    /// older than the image retention window.
    pub async fn cleanup_expired(&self, universe: Option<&str>) -> Result<CleanupReport, CacheError> {
        let articles_deleted = WikiArticleRepo::delete_expired(&self.pool, universe).await?;
        let removed: Vec<String> = self
            .images
            .clear_cache(Some(IMAGE_FILE_MAX_AGE_DAYS))
            .await?
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        let image_marks_cleared = WikiArticleRepo::clear_image_marks(&self.pool, &removed).await?;
        let cutoff = Utc::now() - Duration::days(IMAGE_FILE_MAX_AGE_DAYS);
        let image_rows_deleted = ImageCacheRepo::delete_cached_before(&self.pool, cutoff).await?;

        let report = CleanupReport {
            articles_deleted,
            image_files_deleted: removed.len(),
            image_rows_deleted,
            image_marks_cleared,
        };
        tracing::info!(
            universe = universe.unwrap_or("*"),
            articles_deleted,
            image_files_deleted = report.image_files_deleted,
            image_rows_deleted,
            image_marks_cleared,
            "Cache cleanup finished",
        );
        Ok(report)
    }

    /// Drop every cached article of a universe.
    pub async fn force_refresh(&self, universe: &str) -> Result<u64, CacheError> {
        let deleted = WikiArticleRepo::delete_by_universe(&self.pool, universe).await?;
        tracing::info!(universe, deleted, "Dropped cached articles for refresh");
        Ok(deleted)
    }
}

fn register_input(url: &str, outcome: &FetchOutcome) -> RegisterImage {
    RegisterImage {
        url: url.to_string(),
        url_hash: sha256_hex(url.as_bytes()),
        local_path: outcome
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
        size_bytes: outcome.size(),
        format: image_format(url),
    }
}
