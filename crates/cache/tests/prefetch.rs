//! Integration tests for the staged prefetch.

mod common;

use std::time::{Duration, SystemTime};

use sqlx::PgPool;
use loreforge_cache::prefetch::{PrefetchOptions, CANCELLED};
use loreforge_core::prefetch::PrefetchStage;
use loreforge_db::repositories::{CategoryCacheRepo, ScrapingLogRepo, WikiArticleRepo};

use common::{harness, sample_data, Harness, StubSource};

const TATOOINE_IMAGE: &str = "https://img.test/tatooine.png";

/// Put the sample image on disk so image stages never touch the network.
fn seed_image(h: &Harness) {
    std::fs::write(h.hybrid.images().cache_path(TATOOINE_IMAGE), b"png").unwrap();
}

/// Poll until the background run has stopped.
async fn wait_until_idle(h: &Harness) {
    for _ in 0..200 {
        if !h.prefetch.is_running().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("prefetch did not stop");
}

fn options() -> PrefetchOptions {
    PrefetchOptions {
        image_workers: 2,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Test: status before any run
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn status_is_idle_before_first_run(pool: PgPool) {
    let h = harness(pool, StubSource::new(sample_data()));
    let status = h.prefetch.status().await;
    assert!(!status.is_complete);
    assert_eq!(status.progress.stage, PrefetchStage::Idle);
    assert!(!status.progress.is_running);
}

// ---------------------------------------------------------------------------
// Test: full run
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn full_run_populates_both_tiers(pool: PgPool) {
    let h = harness(pool.clone(), StubSource::new(sample_data()));

    seed_image(&h);

    let progress = h.prefetch.run(options()).await.expect("no run in progress");

    assert_eq!(progress.stage, PrefetchStage::Complete);
    assert!(progress.is_complete);
    assert!(!progress.is_running);
    assert_eq!(progress.articles_total, 4);
    assert_eq!(progress.articles_created, 4);
    assert_eq!(progress.articles_updated, 0);
    assert_eq!(progress.images_total, 1);
    assert_eq!(progress.images_cached, 1);
    assert!(progress.errors.is_empty(), "{:?}", progress.errors);
    assert_eq!(h.source.calls(), 1);

    assert!(h.canon_files.is_valid("star_wars").await);

    let snapshot = CategoryCacheRepo::list(&pool, "star_wars").await.unwrap();
    assert_eq!(snapshot.len(), 2);

    let tatooine = WikiArticleRepo::find_by_title(&pool, "star_wars", "Tatooine")
        .await
        .unwrap()
        .unwrap();
    assert!(tatooine.image_cached);
    assert_eq!(tatooine.description(), Some("About Tatooine"));
    assert_eq!(tatooine.content["id"], 1);

    let log = ScrapingLogRepo::recent(&pool, Some("star_wars"), 1).await.unwrap();
    assert_eq!(log[0].status, "completed");
    assert_eq!(log[0].articles_created, 4);
    assert_eq!(Some(log[0].id), progress.log_id);
}

// ---------------------------------------------------------------------------
// Test: skip rule
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn second_run_skips_fetch_when_data_exists(pool: PgPool) {
    let h = harness(pool, StubSource::new(sample_data()));
    seed_image(&h);
    h.prefetch.run(options()).await.unwrap();

    let second = h.prefetch.run(options()).await.unwrap();
    assert_eq!(second.stage, PrefetchStage::Complete);
    assert_eq!(second.articles_created, 0);
    assert_eq!(h.source.calls(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn forced_run_refetches_and_updates(pool: PgPool) {
    let h = harness(pool, StubSource::new(sample_data()));
    seed_image(&h);
    h.prefetch.run(options()).await.unwrap();

    let forced = h
        .prefetch
        .run(PrefetchOptions {
            force_refresh: true,
            ..options()
        })
        .await
        .unwrap();
    assert_eq!(forced.articles_created, 0);
    assert_eq!(forced.articles_updated, 4);
    assert_eq!(h.source.calls(), 2);
}

// ---------------------------------------------------------------------------
// Test: failures
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn source_failure_fails_the_run(pool: PgPool) {
    let h = harness(pool.clone(), StubSource::failing());
    let progress = h.prefetch.run(options()).await.unwrap();

    assert_eq!(progress.stage, PrefetchStage::Failed);
    assert!(!progress.is_complete);
    assert!(progress.errors[0].contains("wiki down"));

    let log = ScrapingLogRepo::recent(&pool, Some("star_wars"), 1).await.unwrap();
    assert_eq!(log[0].status, "failed");
    assert!(log[0].error_message.as_deref().unwrap().contains("wiki down"));
}

// ---------------------------------------------------------------------------
// Test: background start
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn second_start_is_refused_while_running(pool: PgPool) {
    let h = harness(pool, StubSource::new(sample_data()));
    seed_image(&h);

    assert!(h.prefetch.start(options()).await);
    assert!(!h.prefetch.start(options()).await);

    wait_until_idle(&h).await;
    let status = h.prefetch.status().await;
    assert!(status.is_complete);
    assert_eq!(h.source.calls(), 1);
}

// ---------------------------------------------------------------------------
// Test: cancellation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn cancel_stops_a_run_mid_fetch(pool: PgPool) {
    let h = harness(pool.clone(), StubSource::slow(sample_data(), Duration::from_secs(30)));

    assert!(h.prefetch.start(options()).await);
    tokio::time::sleep(Duration::from_millis(100)).await;
    h.prefetch.cancel().await;
    wait_until_idle(&h).await;

    let status = h.prefetch.status().await;
    assert!(!status.is_complete);
    assert_eq!(status.progress.stage, PrefetchStage::Failed);
    assert_eq!(status.progress.errors, vec![CANCELLED.to_string()]);
    assert_eq!(status.progress.errors_count, 1);
    assert_eq!(WikiArticleRepo::count_for_universe(&pool, "star_wars").await.unwrap(), 0);
    assert!(!h.canon_files.exists("star_wars"));

    let log = ScrapingLogRepo::recent(&pool, Some("star_wars"), 1).await.unwrap();
    assert_eq!(log[0].status, "failed");
    assert_eq!(log[0].error_message.as_deref(), Some(CANCELLED));
    assert_eq!(log[0].errors_count, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn server_shutdown_cancels_the_run(pool: PgPool) {
    let h = harness(pool, StubSource::slow(sample_data(), Duration::from_secs(30)));

    assert!(h.prefetch.start(options()).await);
    h.shutdown.cancel();
    wait_until_idle(&h).await;

    let status = h.prefetch.status().await;
    assert_eq!(status.progress.stage, PrefetchStage::Failed);
    assert_eq!(status.progress.errors.last().map(String::as_str), Some(CANCELLED));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn cancel_reaches_a_run_started_after_another_finished(pool: PgPool) {
    let h = harness(pool, StubSource::slow(sample_data(), Duration::from_millis(200)));
    seed_image(&h);

    let first = h.prefetch.run(options()).await.unwrap();
    assert_eq!(first.stage, PrefetchStage::Complete);

    let forced = PrefetchOptions {
        force_refresh: true,
        ..options()
    };
    assert!(h.prefetch.start(forced).await);
    h.prefetch.cancel().await;
    wait_until_idle(&h).await;

    let status = h.prefetch.status().await;
    assert_eq!(status.progress.stage, PrefetchStage::Failed);
    assert_eq!(status.progress.errors, vec![CANCELLED.to_string()]);
}

// ---------------------------------------------------------------------------
// Test: image cleanup re-queues downloads
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn cleanup_of_old_images_requeues_their_articles(pool: PgPool) {
    let h = harness(pool.clone(), StubSource::new(sample_data()));
    seed_image(&h);
    h.prefetch.run(options()).await.unwrap();

    let path = h.hybrid.images().cache_path(TATOOINE_IMAGE);
    let forty_days_ago = SystemTime::now() - Duration::from_secs(40 * 24 * 3600);
    std::fs::File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(forty_days_ago)
        .unwrap();
    sqlx::query("UPDATE image_cache SET cached_at = now() - INTERVAL '40 days'")
        .execute(&pool)
        .await
        .unwrap();

    let report = h.hybrid.cleanup_expired(Some("star_wars")).await.unwrap();
    assert_eq!(report.image_files_deleted, 1);
    assert_eq!(report.image_rows_deleted, 1);
    assert_eq!(report.image_marks_cleared, 1);
    assert!(!path.exists());

    let tatooine = WikiArticleRepo::find_by_title(&pool, "star_wars", "Tatooine")
        .await
        .unwrap()
        .unwrap();
    assert!(!tatooine.image_cached);
    assert!(tatooine.image_cache_path.is_none());

    let missing = WikiArticleRepo::list_missing_images(&pool, "star_wars", "planets", 10)
        .await
        .unwrap();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].title, "Tatooine");
}
