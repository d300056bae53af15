use std::sync::Arc;

use loreforge_cache::article_file::ArticleFileCache;
use loreforge_cache::canon_file::CanonFileCache;
use loreforge_cache::hybrid::HybridCache;
use loreforge_cache::prefetch::PrefetchService;
use loreforge_cache::unified::UnifiedCache;
use loreforge_cache::CacheError;
use loreforge_core::prefetch::DEFAULT_IMAGE_WORKERS;
use loreforge_wiki::image::ImageFetcher;
use loreforge_wiki::source::CanonSource;
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: every field is a pool handle or an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: loreforge_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// WebSocket connections grouped into campaign rooms.
    pub ws_manager: Arc<WsManager>,
    /// Tier-fallback reads.
    pub unified: Arc<UnifiedCache>,
    /// Relational tier and image bookkeeping.
    pub hybrid: Arc<HybridCache>,
    /// Canon snapshot file tier.
    pub canon_files: Arc<CanonFileCache>,
    /// Background warm-up of both tiers.
    pub prefetch: Arc<PrefetchService>,
}

impl AppState {
    /// Wire the cache tiers on top of `pool`, pulling fresh data from
    /// `source`. Cancelling `shutdown` stops any prefetch run.
    ///
    /// Creates the configured cache directories if they are missing.
    pub fn new(
        pool: loreforge_db::DbPool,
        config: ServerConfig,
        source: Arc<dyn CanonSource>,
        shutdown: CancellationToken,
    ) -> Result<Self, CacheError> {
        let cache = &config.cache;
        let canon_files = Arc::new(CanonFileCache::new(&cache.canon_cache_dir, cache.ttl_days)?);
        let articles = Arc::new(ArticleFileCache::new(&cache.article_cache_dir)?);
        let images = Arc::new(ImageFetcher::new(&cache.image_cache_dir)?);
        let hybrid = Arc::new(HybridCache::new(pool.clone(), images, cache.ttl_days));

        let unified = Arc::new(UnifiedCache::new(
            pool.clone(),
            Arc::clone(&hybrid),
            Arc::clone(&canon_files),
            articles,
            Arc::clone(&source),
            DEFAULT_IMAGE_WORKERS,
        ));
        let prefetch = Arc::new(PrefetchService::new(
            pool.clone(),
            Arc::clone(&canon_files),
            Arc::clone(&hybrid),
            source,
            shutdown,
        ));

        Ok(Self {
            pool,
            config: Arc::new(config),
            ws_manager: Arc::new(WsManager::new()),
            unified,
            hybrid,
            canon_files,
            prefetch,
        })
    }
}
