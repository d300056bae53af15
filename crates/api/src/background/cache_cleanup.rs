//! Periodic purge of expired cache entries.
//!
//! Deletes expired `wiki_articles` rows across all universes plus image
//! files and registry rows past their retention window.

use std::sync::Arc;
use std::time::Duration;

use loreforge_cache::hybrid::HybridCache;
use tokio_util::sync::CancellationToken;

/// Run the cleanup loop every `every` until `cancel` is triggered.
///
/// The first pass runs one full interval after startup so it never races
/// the startup prefetch.
pub async fn run(hybrid: Arc<HybridCache>, every: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = every.as_secs(), "Cache cleanup job started");

    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + every, every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Cache cleanup job stopping");
                break;
            }
            _ = interval.tick() => {
                match hybrid.cleanup_expired(None).await {
                    Ok(report) => {
                        if report.articles_deleted > 0 || report.image_files_deleted > 0 {
                            tracing::info!(
                                articles_deleted = report.articles_deleted,
                                image_files_deleted = report.image_files_deleted,
                                "Cache cleanup: purged expired entries"
                            );
                        } else {
                            tracing::debug!("Cache cleanup: nothing to purge");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Cache cleanup failed");
                    }
                }
            }
        }
    }
}
