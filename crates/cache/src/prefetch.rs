//! Staged background warm-up of both cache tiers.
//!
//! ```text
//! Stage 1    fetching_via_api        source -> canon file snapshot
//! Stage 1.5  writing_to_postgresql   snapshot -> wiki_articles, category_cache
//! Stage 2    prefetching_images      missing images of visual categories
//! Stage 3    complete                scraping log closed
//! ```
//!
//! Stages 1 and 1.5 are skipped when either tier already holds data for
//! the universe, unless a forced refresh is requested. Only Stage 1 errors
//! fail the run; later errors are recorded in the progress and the log.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use loreforge_core::canon::{self, CanonData};
use loreforge_core::category::VISUAL_CATEGORIES;
use loreforge_core::prefetch::{
    PrefetchProgress, PrefetchStage, DEFAULT_IMAGE_LIMIT_PER_CATEGORY, DEFAULT_IMAGE_WORKERS,
    OPERATION_STARTUP_PREFETCH, UPSERT_BATCH_SIZE,
};
use loreforge_core::universe::DEFAULT_UNIVERSE;
use loreforge_db::models::scraping_log::{LogCompletion, LOG_STATUS_COMPLETED, LOG_STATUS_FAILED};
use loreforge_db::models::wiki_article::UpsertWikiArticle;
use loreforge_db::repositories::{CategoryCacheRepo, ScrapingLogRepo, WikiArticleRepo};
use loreforge_wiki::source::CanonSource;

use crate::canon_file::CanonFileCache;
use crate::hybrid::HybridCache;

/// Error recorded when a run is cancelled.
pub const CANCELLED: &str = "cancelled";

/// Parameters of one prefetch run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PrefetchOptions {
    pub universe: String,
    pub image_workers: usize,
    pub force_refresh: bool,
    pub image_limit_per_category: i64,
}

impl Default for PrefetchOptions {
    fn default() -> Self {
        Self {
            universe: DEFAULT_UNIVERSE.to_string(),
            image_workers: DEFAULT_IMAGE_WORKERS,
            force_refresh: false,
            image_limit_per_category: DEFAULT_IMAGE_LIMIT_PER_CATEGORY,
        }
    }
}

/// Body of `GET /prefetch/status`.
#[derive(Debug, Clone, Serialize)]
pub struct PrefetchStatus {
    pub is_complete: bool,
    pub progress: PrefetchProgress,
}

/// Owns the single prefetch task and its shared progress.
pub struct PrefetchService {
    pool: PgPool,
    canon_files: Arc<CanonFileCache>,
    hybrid: Arc<HybridCache>,
    source: Arc<dyn CanonSource>,
    progress: Arc<RwLock<PrefetchProgress>>,
    current: Mutex<Option<CancellationToken>>,
    shutdown: CancellationToken,
}

impl PrefetchService {
    /// `shutdown` cancels any run in progress when the server stops.
    pub fn new(
        pool: PgPool,
        canon_files: Arc<CanonFileCache>,
        hybrid: Arc<HybridCache>,
        source: Arc<dyn CanonSource>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            pool,
            canon_files,
            hybrid,
            source,
            progress: Arc::new(RwLock::new(PrefetchProgress::default())),
            current: Mutex::new(None),
            shutdown,
        }
    }

    /// Snapshot of the current or last run.
    pub async fn status(&self) -> PrefetchStatus {
        let progress = self.progress.read().await.clone();
        PrefetchStatus {
            is_complete: progress.is_complete,
            progress,
        }
    }

    pub async fn is_running(&self) -> bool {
        self.progress.read().await.is_running
    }

    /// Spawn a run in the background. Returns `false` if one is already in
    /// progress.
    pub async fn start(self: &Arc<Self>, options: PrefetchOptions) -> bool {
        let Some(token) = self.begin(&options.universe).await else {
            return false;
        };
        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.execute(options, token).await;
        });
        true
    }

    /// Run on the current task and return the final progress, or `None` if
    /// a run is already in progress.
    pub async fn run(&self, options: PrefetchOptions) -> Option<PrefetchProgress> {
        let token = self.begin(&options.universe).await?;
        self.execute(options, token).await;
        Some(self.progress.read().await.clone())
    }

    /// Cancel the run in progress, if any.
    pub async fn cancel(&self) {
        if let Some(token) = self.current.lock().await.as_ref() {
            token.cancel();
        }
    }

    /* ----------------------------------------------------------------------
    Run
    ---------------------------------------------------------------------- */

    async fn begin(&self, universe: &str) -> Option<CancellationToken> {
        {
            let mut progress = self.progress.write().await;
            if progress.is_running {
                tracing::warn!(universe, "Prefetch already running, ignoring start request");
                return None;
            }
            progress.begin(universe, Utc::now());
        }
        let token = self.shutdown.child_token();
        *self.current.lock().await = Some(token.clone());
        Some(token)
    }

    async fn execute(&self, options: PrefetchOptions, token: CancellationToken) {
        let universe = options.universe.as_str();
        tracing::info!(universe, force_refresh = options.force_refresh, "Prefetch started");

        let log_id = match ScrapingLogRepo::create(&self.pool, universe, OPERATION_STARTUP_PREFETCH).await {
            Ok(log) => {
                self.progress.write().await.log_id = Some(log.id);
                Some(log.id)
            }
            Err(e) => {
                tracing::warn!(universe, error = %e, "Could not open scraping log");
                None
            }
        };

        let error_message = self.run_stages(&options, &token).await.err();

        // The token must be gone before `is_running` clears, or a start
        // landing in between would lose its own token here.
        self.current.lock().await.take();
        let snapshot = {
            let mut progress = self.progress.write().await;
            match &error_message {
                None => progress.finish(Utc::now()),
                Some(message) => progress.fail(message.clone(), Utc::now()),
            }
            progress.clone()
        };
        match &error_message {
            None => tracing::info!(
                universe,
                articles_created = snapshot.articles_created,
                articles_updated = snapshot.articles_updated,
                images_downloaded = snapshot.images_downloaded,
                images_failed = snapshot.images_failed,
                errors = snapshot.errors_count,
                "Prefetch complete",
            ),
            Some(message) => tracing::error!(universe, error = %message, "Prefetch failed"),
        }

        if let Some(log_id) = log_id {
            let completion = completion_for(&snapshot, error_message);
            if let Err(e) = ScrapingLogRepo::complete(&self.pool, log_id, &completion).await {
                tracing::warn!(universe, log_id, error = %e, "Could not close scraping log");
            }
        }
    }

    async fn run_stages(
        &self,
        options: &PrefetchOptions,
        token: &CancellationToken,
    ) -> Result<(), String> {
        let universe = options.universe.as_str();

        if !options.force_refresh && self.has_cached_data(universe).await {
            tracing::info!(universe, "Cached data present, skipping fetch and database write");
        } else {
            let data = self.fetch_stage(universe, token).await?;
            self.write_stage(universe, &data, token).await?;
        }

        self.image_stage(options, token).await
    }

    async fn has_cached_data(&self, universe: &str) -> bool {
        if self.canon_files.is_valid(universe).await {
            return true;
        }
        match WikiArticleRepo::count_for_universe(&self.pool, universe).await {
            Ok(count) => count > 0,
            Err(e) => {
                tracing::warn!(universe, error = %e, "Could not count cached articles");
                false
            }
        }
    }

    /// Stage 1. Any failure here aborts the run.
    async fn fetch_stage(&self, universe: &str, token: &CancellationToken) -> Result<CanonData, String> {
        self.enter(universe, PrefetchStage::FetchingViaApi).await;

        let data = tokio::select! {
            _ = token.cancelled() => return Err(CANCELLED.to_string()),
            result = self.source.fetch_canonical_data(universe, DEFAULT_IMAGE_WORKERS) => {
                result.map_err(|e| format!("Fetching canon data failed: {e}"))?
            }
        };

        let total = canon::total_items(&data) as i64;
        self.progress.write().await.articles_total = total;
        tracing::info!(universe, articles = total, categories = data.len(), "Fetched canon data");

        if let Err(e) = self.canon_files.save(universe, &data).await {
            self.record_error(universe, format!("Saving canon file cache failed: {e}")).await;
        }
        Ok(data)
    }

    /// Stage 1.5. Batch failures are recorded, not raised.
    async fn write_stage(
        &self,
        universe: &str,
        data: &CanonData,
        token: &CancellationToken,
    ) -> Result<(), String> {
        self.enter(universe, PrefetchStage::WritingToPostgresql).await;
        let ttl_days = self.hybrid.ttl_days();

        for (category, items) in data {
            if token.is_cancelled() {
                return Err(CANCELLED.to_string());
            }
            if items.is_empty() {
                continue;
            }

            let inputs: Vec<UpsertWikiArticle> = items
                .iter()
                .map(|item| UpsertWikiArticle {
                    title: item.title.clone(),
                    universe: universe.to_string(),
                    category: category.clone(),
                    content: item.content_json(),
                    image_url: item.display_image().map(str::to_string),
                    source_url: item.url.clone(),
                })
                .collect();

            match WikiArticleRepo::bulk_upsert(&self.pool, &inputs, UPSERT_BATCH_SIZE, ttl_days).await {
                Ok(stats) => {
                    {
                        let mut progress = self.progress.write().await;
                        progress.articles_processed += inputs.len() as i64;
                        progress.articles_created += stats.created;
                        progress.articles_updated += stats.updated;
                    }
                    tracing::info!(
                        universe,
                        category = %category,
                        created = stats.created,
                        updated = stats.updated,
                        failed = stats.failed,
                        "Wrote category to database",
                    );
                    if stats.failed > 0 {
                        self.record_error(universe, format!("{category}: {} articles failed to save", stats.failed))
                            .await;
                    }
                }
                Err(e) => {
                    self.record_error(universe, format!("{category}: database write failed: {e}")).await;
                }
            }
        }

        if let Err(e) = CategoryCacheRepo::refresh(&self.pool, universe).await {
            self.record_error(universe, format!("Category snapshot refresh failed: {e}")).await;
        }
        Ok(())
    }

    /// Stage 2. Per-category failures are recorded, not raised.
    async fn image_stage(&self, options: &PrefetchOptions, token: &CancellationToken) -> Result<(), String> {
        let universe = options.universe.as_str();
        self.enter(universe, PrefetchStage::PrefetchingImages).await;

        for category in VISUAL_CATEGORIES {
            let result = tokio::select! {
                _ = token.cancelled() => return Err(CANCELLED.to_string()),
                result = self.hybrid.prefetch_images_for_category(
                    universe,
                    category,
                    options.image_limit_per_category,
                    options.image_workers,
                ) => result,
            };

            match result {
                Ok(stats) => {
                    {
                        let mut progress = self.progress.write().await;
                        progress.images_total += stats.total;
                        progress.images_downloaded += stats.downloaded;
                        progress.images_cached += stats.cached;
                        progress.images_failed += stats.failed;
                    }
                    if stats.failed > 0 {
                        self.record_error(universe, format!("{category}: {} images failed", stats.failed))
                            .await;
                    }
                }
                Err(e) => {
                    self.record_error(universe, format!("{category}: image prefetch failed: {e}")).await;
                }
            }
        }
        Ok(())
    }

    // ---- private helpers ----

    async fn enter(&self, universe: &str, stage: PrefetchStage) {
        self.progress.write().await.enter(stage);
        tracing::info!(universe, stage = %stage, "Prefetch stage started");
    }

    async fn record_error(&self, universe: &str, message: String) {
        tracing::warn!(universe, error = %message, "Prefetch step failed");
        self.progress.write().await.record_error(message);
    }
}

fn completion_for(progress: &PrefetchProgress, error_message: Option<String>) -> LogCompletion {
    LogCompletion {
        articles_processed: to_i32(progress.articles_processed),
        articles_created: to_i32(progress.articles_created),
        articles_updated: to_i32(progress.articles_updated),
        images_downloaded: to_i32(progress.images_downloaded),
        images_cached: to_i32(progress.images_cached),
        images_failed: to_i32(progress.images_failed),
        errors_count: to_i32(progress.errors_count),
        status: if error_message.is_some() {
            LOG_STATUS_FAILED
        } else {
            LOG_STATUS_COMPLETED
        }
        .to_string(),
        error_message,
    }
}

fn to_i32(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
