//! Shared fixtures for cache integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use loreforge_cache::article_file::ArticleFileCache;
use loreforge_cache::canon_file::CanonFileCache;
use loreforge_cache::hybrid::HybridCache;
use loreforge_cache::prefetch::PrefetchService;
use loreforge_cache::unified::UnifiedCache;
use loreforge_core::canon::{CanonData, CanonItem};
use loreforge_wiki::image::ImageFetcher;
use loreforge_wiki::source::CanonSource;
use loreforge_wiki::WikiError;

/// Canon source returning a fixed dataset and counting calls.
pub struct StubSource {
    pub data: CanonData,
    pub calls: AtomicUsize,
    pub fail: bool,
    /// Time each fetch takes before answering.
    pub delay: Option<Duration>,
}

impl StubSource {
    pub fn new(data: CanonData) -> Self {
        Self {
            data,
            calls: AtomicUsize::new(0),
            fail: false,
            delay: None,
        }
    }

    pub fn slow(data: CanonData, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(data)
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(CanonData::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CanonSource for StubSource {
    async fn fetch_canonical_data(
        &self,
        _universe: &str,
        _max_workers: usize,
    ) -> Result<CanonData, WikiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(WikiError::Api {
                status: 503,
                body: "wiki down".to_string(),
            });
        }
        Ok(self.data.clone())
    }
}

pub fn item(id: i64, title: &str, image_url: Option<&str>) -> CanonItem {
    CanonItem {
        id,
        title: title.to_string(),
        url: Some(format!("https://starwars.fandom.com/wiki/{title}")),
        categories: vec!["Test".to_string()],
        abstract_text: Some(format!("About {title}")),
        thumbnail: image_url.map(str::to_string),
        image_url: image_url.map(str::to_string),
    }
}

/// Three planets (one with an image) and one droid.
pub fn sample_data() -> CanonData {
    let mut data = CanonData::new();
    data.insert(
        "planets".to_string(),
        vec![
            item(1, "Tatooine", Some("https://img.test/tatooine.png")),
            item(2, "Hoth", None),
            item(3, "Endor", None),
        ],
    );
    data.insert("droids".to_string(), vec![item(4, "R2-D2", None)]);
    data
}

/// Every cache component wired to temporary directories.
pub struct Harness {
    pub dir: TempDir,
    pub canon_files: Arc<CanonFileCache>,
    pub hybrid: Arc<HybridCache>,
    pub unified: UnifiedCache,
    pub prefetch: Arc<PrefetchService>,
    pub source: Arc<StubSource>,
    /// Server shutdown token the prefetch runs under.
    pub shutdown: CancellationToken,
}

pub fn harness(pool: PgPool, source: StubSource) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let canon_files = Arc::new(CanonFileCache::new(dir.path().join("canon"), 7).unwrap());
    let articles = Arc::new(ArticleFileCache::new(dir.path().join("articles")).unwrap());
    let images = Arc::new(ImageFetcher::new(dir.path().join("images")).unwrap());
    let hybrid = Arc::new(HybridCache::new(pool.clone(), images, 7));
    let source = Arc::new(source);

    let unified = UnifiedCache::new(
        pool.clone(),
        Arc::clone(&hybrid),
        Arc::clone(&canon_files),
        articles,
        source.clone(),
        4,
    );
    let shutdown = CancellationToken::new();
    let prefetch = Arc::new(PrefetchService::new(
        pool,
        Arc::clone(&canon_files),
        Arc::clone(&hybrid),
        source.clone(),
        shutdown.clone(),
    ));

    Harness {
        dir,
        canon_files,
        hybrid,
        unified,
        prefetch,
        source,
        shutdown,
    }
}
