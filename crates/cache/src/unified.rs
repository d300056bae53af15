//! Tiered reads: database first, then the canon file snapshot, then the
//! live wiki.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use sqlx::PgPool;
use loreforge_core::canon::{self, CanonData, CanonItem};
use loreforge_core::search::title_matches;
use loreforge_core::universe::universe_config;
use loreforge_db::models::wiki_article::{ArticleStats, WikiArticle};
use loreforge_db::repositories::{CategoryCacheRepo, WikiArticleRepo};
use loreforge_wiki::source::CanonSource;

use crate::article_file::ArticleFileCache;
use crate::canon_file::{CanonCacheStats, CanonFileCache};
use crate::error::CacheError;
use crate::hybrid::HybridCache;

/// Name reported for the combined backend.
pub const BACKEND_HYBRID: &str = "hybrid";

/// The layer that served a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheTier {
    Database,
    File,
    Source,
    /// Nothing cached anywhere.
    None,
}

impl CacheTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::File => "file",
            Self::Source => "source",
            Self::None => "none",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CanonSummary {
    pub universe: String,
    pub total: i64,
    pub categories: BTreeMap<String, i64>,
    pub backend: CacheTier,
}

#[derive(Debug, Clone, Serialize)]
pub struct CanonSearchHit {
    pub title: String,
    pub category: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CanonSearchResults {
    pub query: String,
    pub total: usize,
    pub results: Vec<CanonSearchHit>,
    pub backend: CacheTier,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileCacheInfo {
    pub exists: bool,
    pub valid: bool,
    pub path: String,
    pub stats: Option<CanonCacheStats>,
}

/// Database section of [`CacheInfo`]: stats, or the error that prevented
/// reading them.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DatabaseInfo {
    Stats(ArticleStats),
    Unavailable { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheInfo {
    pub universe: String,
    pub backend: &'static str,
    pub file_cache: FileCacheInfo,
    pub database: DatabaseInfo,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RefreshReport {
    pub articles_deleted: u64,
    pub file_cache_invalidated: bool,
}

pub struct UnifiedCache {
    pool: PgPool,
    hybrid: Arc<HybridCache>,
    canon_files: Arc<CanonFileCache>,
    articles: Arc<ArticleFileCache>,
    source: Arc<dyn CanonSource>,
    fetch_workers: usize,
}

impl UnifiedCache {
    pub fn new(
        pool: PgPool,
        hybrid: Arc<HybridCache>,
        canon_files: Arc<CanonFileCache>,
        articles: Arc<ArticleFileCache>,
        source: Arc<dyn CanonSource>,
        fetch_workers: usize,
    ) -> Self {
        Self {
            pool,
            hybrid,
            canon_files,
            articles,
            source,
            fetch_workers,
        }
    }

    pub fn hybrid(&self) -> &HybridCache {
        &self.hybrid
    }

    pub fn canon_files(&self) -> &CanonFileCache {
        &self.canon_files
    }

    /* ----------------------------------------------------------------------
    Reads
    ---------------------------------------------------------------------- */

    /// Full categorized dataset and the tier it came from.
    ///
    /// A failing or empty database falls through to the file snapshot; a
    /// missing or expired snapshot triggers a fresh fetch from the source,
    /// which is then saved to the file tier.
    pub async fn get_all_data(&self, universe: &str) -> Result<(CanonData, CacheTier), CacheError> {
        universe_config(universe)?;

        match WikiArticleRepo::list_active(&self.pool, universe).await {
            Ok(rows) if !rows.is_empty() => {
                tracing::debug!(universe, rows = rows.len(), "Serving canon data from database");
                return Ok((group_articles(rows), CacheTier::Database));
            }
            Ok(_) => tracing::debug!(universe, "Database tier empty"),
            Err(e) => tracing::warn!(universe, error = %e, "Database tier unavailable"),
        }

        match self.canon_files.load(universe).await {
            Ok(Some(data)) => return Ok((data, CacheTier::File)),
            Ok(None) => tracing::debug!(universe, "File tier missing or expired"),
            Err(e) => tracing::warn!(universe, error = %e, "File tier unreadable"),
        }

        tracing::info!(universe, "Fetching canon data from source");
        let data = self
            .source
            .fetch_canonical_data(universe, self.fetch_workers)
            .await?;
        if let Err(e) = self.canon_files.save(universe, &data).await {
            tracing::warn!(universe, error = %e, "Failed to save canon file cache");
        }
        Ok((data, CacheTier::Source))
    }

    /// Per-category counts: the category snapshot, else live counts, else
    /// the file tier.
    pub async fn summary(&self, universe: &str) -> Result<CanonSummary, CacheError> {
        universe_config(universe)?;

        match CategoryCacheRepo::list(&self.pool, universe).await {
            Ok(rows) if !rows.is_empty() => {
                let categories = rows
                    .into_iter()
                    .map(|r| (r.category, i64::from(r.article_count)))
                    .collect();
                return Ok(summary(universe, categories, CacheTier::Database));
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(universe, error = %e, "Category snapshot unavailable"),
        }

        match WikiArticleRepo::category_counts(&self.pool, universe).await {
            Ok(counts) if !counts.is_empty() => {
                let categories = counts.into_iter().map(|c| (c.category, c.count)).collect();
                return Ok(summary(universe, categories, CacheTier::Database));
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(universe, error = %e, "Live category counts unavailable"),
        }

        if let Ok(Some(data)) = self.canon_files.load(universe).await {
            let categories = data
                .iter()
                .map(|(name, items)| (name.clone(), items.len() as i64))
                .collect();
            return Ok(summary(universe, categories, CacheTier::File));
        }

        Ok(summary(universe, BTreeMap::new(), CacheTier::None))
    }

    /// Title search: database first, then a substring scan of the full
    /// dataset.
    pub async fn search(
        &self,
        universe: &str,
        query: &str,
        limit: i64,
    ) -> Result<CanonSearchResults, CacheError> {
        universe_config(universe)?;

        match WikiArticleRepo::search(&self.pool, universe, query, None, limit).await {
            Ok(rows) if !rows.is_empty() => {
                let results: Vec<CanonSearchHit> = rows
                    .into_iter()
                    .map(|a| CanonSearchHit {
                        description: a.description().map(str::to_string),
                        title: a.title,
                        category: a.category,
                        image_url: a.image_url,
                    })
                    .collect();
                return Ok(search_results(query, results, CacheTier::Database));
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(universe, error = %e, "Database search failed"),
        }

        let (data, tier) = self.get_all_data(universe).await?;
        let limit = usize::try_from(limit).unwrap_or(0);
        let results = data
            .iter()
            .flat_map(|(category, items)| items.iter().map(move |item| (category, item)))
            .filter(|(_, item)| title_matches(&item.title, query))
            .take(limit)
            .map(|(category, item)| CanonSearchHit {
                title: item.title.clone(),
                category: category.clone(),
                description: item.abstract_text.clone(),
                image_url: item.display_image().map(str::to_string),
            })
            .collect();
        Ok(search_results(query, results, tier))
    }

    /// One article by exact title: the database row (mirrored into the
    /// article file tier), else the article file tier.
    pub async fn get_article(
        &self,
        universe: &str,
        title: &str,
    ) -> Result<Option<(serde_json::Value, CacheTier)>, CacheError> {
        universe_config(universe)?;

        match WikiArticleRepo::find_by_title(&self.pool, universe, title).await {
            Ok(Some(article)) => {
                if let Err(e) = self.hybrid.ensure_image_cached(&article).await {
                    tracing::warn!(universe, title, error = %e, "Image caching failed");
                }
                let json = serde_json::to_value(&article)?;
                if let Err(e) = self.articles.put(universe, title, &json).await {
                    tracing::warn!(universe, title, error = %e, "Failed to mirror article to file cache");
                }
                return Ok(Some((json, CacheTier::Database)));
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(universe, title, error = %e, "Database article lookup failed"),
        }

        Ok(self
            .articles
            .get(universe, title)
            .await?
            .map(|json| (json, CacheTier::File)))
    }

    /* ----------------------------------------------------------------------
    Maintenance
    ---------------------------------------------------------------------- */

    /// Drop both tiers for a universe so the next read or prefetch refetches.
    pub async fn force_refresh_all(&self, universe: &str) -> Result<RefreshReport, CacheError> {
        universe_config(universe)?;
        let articles_deleted = self.hybrid.force_refresh(universe).await?;
        let file_cache_invalidated = self.canon_files.invalidate(universe).await?;
        Ok(RefreshReport {
            articles_deleted,
            file_cache_invalidated,
        })
    }

    pub async fn cache_info(&self, universe: &str) -> Result<CacheInfo, CacheError> {
        universe_config(universe)?;

        let file_cache = FileCacheInfo {
            exists: self.canon_files.exists(universe),
            valid: self.canon_files.is_valid(universe).await,
            path: self.canon_files.data_path(universe).display().to_string(),
            stats: self.canon_files.stats(universe).await,
        };
        let database = match WikiArticleRepo::stats(&self.pool, universe).await {
            Ok(stats) => DatabaseInfo::Stats(stats),
            Err(e) => DatabaseInfo::Unavailable {
                error: e.to_string(),
            },
        };

        Ok(CacheInfo {
            universe: universe.to_string(),
            backend: BACKEND_HYBRID,
            file_cache,
            database,
        })
    }
}

fn summary(universe: &str, categories: BTreeMap<String, i64>, backend: CacheTier) -> CanonSummary {
    CanonSummary {
        universe: universe.to_string(),
        total: categories.values().sum(),
        categories,
        backend,
    }
}

fn search_results(query: &str, results: Vec<CanonSearchHit>, backend: CacheTier) -> CanonSearchResults {
    CanonSearchResults {
        query: query.to_string(),
        total: results.len(),
        results,
        backend,
    }
}

/// Rebuild canon items from database rows, grouped by category.
pub fn group_articles(rows: Vec<WikiArticle>) -> CanonData {
    let mut data = CanonData::new();
    for article in rows {
        let item = article_to_item(&article);
        data.entry(article.category).or_default().push(item);
    }
    tracing::trace!(items = canon::total_items(&data), "Grouped database articles");
    data
}

fn article_to_item(article: &WikiArticle) -> CanonItem {
    let content = &article.content;
    CanonItem {
        id: content.get("id").and_then(|v| v.as_i64()).unwrap_or(article.id),
        title: article.title.clone(),
        url: article.source_url.clone(),
        categories: content
            .get("categories")
            .and_then(|v| v.as_array())
            .map(|cats| {
                cats.iter()
                    .filter_map(|c| c.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default(),
        abstract_text: article.description().map(str::to_string),
        thumbnail: None,
        image_url: article.image_url.clone(),
    }
}
