//! Integration tests for tier fallback and hybrid reads.

mod common;

use serde_json::json;
use sqlx::PgPool;
use loreforge_cache::unified::CacheTier;
use loreforge_cache::CacheError;
use loreforge_db::models::wiki_article::UpsertWikiArticle;
use loreforge_db::repositories::{CategoryCacheRepo, WikiArticleRepo};

use common::{harness, sample_data, StubSource};

fn article(title: &str, category: &str) -> UpsertWikiArticle {
    UpsertWikiArticle {
        title: title.to_string(),
        universe: "star_wars".to_string(),
        category: category.to_string(),
        content: json!({ "id": 99, "description": format!("About {title}") }),
        image_url: None,
        source_url: None,
    }
}

// ---------------------------------------------------------------------------
// Test: tier fallback
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn empty_tiers_fall_back_to_source_and_save_file(pool: PgPool) {
    let h = harness(pool, StubSource::new(sample_data()));

    let (data, tier) = h.unified.get_all_data("star_wars").await.unwrap();
    assert_eq!(tier, CacheTier::Source);
    assert_eq!(data["planets"].len(), 3);
    assert!(h.canon_files.is_valid("star_wars").await);

    let (_, tier) = h.unified.get_all_data("star_wars").await.unwrap();
    assert_eq!(tier, CacheTier::File);
    assert_eq!(h.source.calls(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn database_rows_win_over_other_tiers(pool: PgPool) {
    let h = harness(pool.clone(), StubSource::new(sample_data()));
    WikiArticleRepo::upsert(&pool, &article("Kamino", "planets"), 7).await.unwrap();

    let (data, tier) = h.unified.get_all_data("star_wars").await.unwrap();
    assert_eq!(tier, CacheTier::Database);
    assert_eq!(data["planets"][0].title, "Kamino");
    assert_eq!(data["planets"][0].id, 99);
    assert_eq!(h.source.calls(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_universe_is_rejected(pool: PgPool) {
    let h = harness(pool, StubSource::new(sample_data()));
    let err = h.unified.get_all_data("discworld").await.unwrap_err();
    assert!(matches!(err, CacheError::Core(_)));
}

// ---------------------------------------------------------------------------
// Test: summary and search
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn summary_prefers_category_snapshot(pool: PgPool) {
    let h = harness(pool.clone(), StubSource::new(sample_data()));

    let empty = h.unified.summary("star_wars").await.unwrap();
    assert_eq!(empty.backend, CacheTier::None);
    assert_eq!(empty.total, 0);

    WikiArticleRepo::upsert(&pool, &article("Kamino", "planets"), 7).await.unwrap();
    WikiArticleRepo::upsert(&pool, &article("BB-8", "droids"), 7).await.unwrap();
    CategoryCacheRepo::refresh(&pool, "star_wars").await.unwrap();

    let summary = h.unified.summary("star_wars").await.unwrap();
    assert_eq!(summary.backend, CacheTier::Database);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.categories["droids"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn search_falls_back_to_dataset_scan(pool: PgPool) {
    let h = harness(pool, StubSource::new(sample_data()));

    let results = h.unified.search("star_wars", "hoth", 10).await.unwrap();
    assert_eq!(results.backend, CacheTier::Source);
    assert_eq!(results.total, 1);
    assert_eq!(results.results[0].category, "planets");
}

// ---------------------------------------------------------------------------
// Test: articles
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn article_lookup_mirrors_to_file_tier(pool: PgPool) {
    let h = harness(pool.clone(), StubSource::new(sample_data()));
    WikiArticleRepo::upsert(&pool, &article("Kamino", "planets"), 7).await.unwrap();

    let (json, tier) = h.unified.get_article("star_wars", "Kamino").await.unwrap().unwrap();
    assert_eq!(tier, CacheTier::Database);
    assert_eq!(json["title"], "Kamino");

    // Once the row is gone the mirrored file still answers.
    h.hybrid.force_refresh("star_wars").await.unwrap();
    let (_, tier) = h.unified.get_article("star_wars", "Kamino").await.unwrap().unwrap();
    assert_eq!(tier, CacheTier::File);

    assert!(h.unified.get_article("star_wars", "Nowhere").await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Test: hybrid reads and maintenance
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn category_page_reports_totals(pool: PgPool) {
    let h = harness(pool.clone(), StubSource::new(sample_data()));
    for title in ["Alderaan", "Bespin", "Coruscant"] {
        WikiArticleRepo::upsert(&pool, &article(title, "planets"), 7).await.unwrap();
    }

    let page = h
        .hybrid
        .category_with_metadata("star_wars", "planets", 2, 0, None)
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.returned, 2);
    assert_eq!(page.items[0].name, "Alderaan");
    assert_eq!(page.items[0].description.as_deref(), Some("About Alderaan"));

    let filtered = h
        .hybrid
        .category_with_metadata("star_wars", "planets", 10, 0, Some("besp"))
        .await
        .unwrap();
    assert_eq!(filtered.total, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn search_all_omits_empty_categories(pool: PgPool) {
    let h = harness(pool.clone(), StubSource::new(sample_data()));
    WikiArticleRepo::upsert(&pool, &article("Naboo", "planets"), 7).await.unwrap();
    WikiArticleRepo::upsert(&pool, &article("Naboo Royal Starship", "vehicles"), 7).await.unwrap();

    let results = h.hybrid.search_all_categories("star_wars", "naboo", 10).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results["vehicles"][0].name, "Naboo Royal Starship");
    assert!(!results.contains_key("droids"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn cleanup_and_refresh_drop_rows(pool: PgPool) {
    let h = harness(pool.clone(), StubSource::new(sample_data()));
    WikiArticleRepo::upsert(&pool, &article("Kamino", "planets"), 7).await.unwrap();
    WikiArticleRepo::upsert(&pool, &article("Scarif", "planets"), -1).await.unwrap();

    let report = h.hybrid.cleanup_expired(Some("star_wars")).await.unwrap();
    assert_eq!(report.articles_deleted, 1);

    h.canon_files.save("star_wars", &sample_data()).await.unwrap();
    let refresh = h.unified.force_refresh_all("star_wars").await.unwrap();
    assert_eq!(refresh.articles_deleted, 1);
    assert!(refresh.file_cache_invalidated);

    let info = h.unified.cache_info("star_wars").await.unwrap();
    assert!(!info.file_cache.exists);
    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json["database"]["total"], 0);
    assert_eq!(json["backend"], "hybrid");
}
