//! HTTP-level tests for canon browsing and the image proxy.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, TestApp};
use loreforge_cache::prefetch::PrefetchOptions;
use sqlx::PgPool;

async fn warm(t: &TestApp) {
    let progress = t
        .state
        .prefetch
        .run(PrefetchOptions {
            image_workers: 2,
            ..PrefetchOptions::default()
        })
        .await
        .expect("no prefetch in progress");
    assert!(progress.is_complete, "prefetch failed: {:?}", progress.errors);
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn invalid_category_lists_available_categories(pool: PgPool) {
    let t = common::build_test_app(pool);
    let response = get(t.app(), "/api/v1/canon/star_wars/category/spaceships").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    let error = json["error"].as_str().unwrap();
    assert!(error.contains("Available"));
    assert!(error.contains("planets"));
    assert!(error.contains("droids"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_universe_returns_400(pool: PgPool) {
    let t = common::build_test_app(pool);

    let response = get(t.app(), "/api/v1/canon/narnia/summary").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = get(t.app(), "/api/v1/canon/narnia/category/planets").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(t.source.calls(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn search_requires_a_query(pool: PgPool) {
    let t = common::build_test_app(pool);

    let response = get(t.app(), "/api/v1/canon/star_wars/search").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = get(t.app(), "/api/v1/canon/star_wars/search-all?q=%20%20").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn items_with_images_accepts_equipment_categories_only(pool: PgPool) {
    let t = common::build_test_app(pool);

    let response = get(t.app(), "/api/v1/canon/star_wars/items/planets/with-images").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("weapons"));

    let response = get(t.app(), "/api/v1/canon/star_wars/items/droids/with-images").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["total"], 0);
    assert_eq!(json["limit"], 50);

    let response = get(
        t.app(),
        "/api/v1/canon/star_wars/items/droids/with-images?limit=5000",
    )
    .await;
    assert_eq!(body_json(response).await["limit"], 200);
}

// ---------------------------------------------------------------------------
// Tier fallback
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn all_data_falls_back_to_source_then_file(pool: PgPool) {
    let t = common::build_test_app(pool);

    let response = get(t.app(), "/api/v1/canon/star_wars/all").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["backend"], "source");
    assert_eq!(json["total"], 4);
    assert_eq!(json["data"]["planets"][0]["title"], "Tatooine");

    let response = get(t.app(), "/api/v1/canon/star_wars/all").await;
    let json = body_json(response).await;
    assert_eq!(json["backend"], "file");
    assert_eq!(t.source.calls(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn search_falls_back_to_full_dataset(pool: PgPool) {
    let t = common::build_test_app(pool);

    let response = get(t.app(), "/api/v1/canon/star_wars/search?q=HOTH").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["results"][0]["title"], "Hoth");
    assert_eq!(json["results"][0]["category"], "planets");
    assert_eq!(json["backend"], "source");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_article_returns_404(pool: PgPool) {
    let t = common::build_test_app(pool);
    let response = get(t.app(), "/api/v1/canon/star_wars/articles/Nowhere").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn warmed_database_serves_reads(pool: PgPool) {
    let t = common::build_test_app(pool);
    warm(&t).await;

    let response = get(t.app(), "/api/v1/canon/star_wars/summary").await;
    let json = body_json(response).await;
    assert_eq!(json["backend"], "database");
    assert_eq!(json["total"], 4);
    assert_eq!(json["categories"]["planets"], 2);

    let response = get(
        t.app(),
        "/api/v1/canon/star_wars/category/planets?limit=1&search=tat",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["returned"], 1);
    assert_eq!(json["items"][0]["name"], "Tatooine");
    assert_eq!(json["items"][0]["description"], "About Tatooine");

    let response = get(t.app(), "/api/v1/canon/star_wars/search-all?q=hoth").await;
    let json = body_json(response).await;
    assert_eq!(json["results"]["planets"][0]["name"], "Hoth");
    assert!(json["results"].get("droids").is_none());

    let response = get(t.app(), "/api/v1/canon/star_wars/articles/R2-D2").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["backend"], "database");
    assert_eq!(json["article"]["category"], "droids");

    assert_eq!(t.source.calls(), 1);
}

// ---------------------------------------------------------------------------
// Image proxy
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn image_proxy_rejects_invalid_urls(pool: PgPool) {
    let t = common::build_test_app(pool);

    let response = get(t.app(), "/api/v1/image-proxy").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = get(t.app(), "/api/v1/image-proxy?url=ftp%3A%2F%2Fimg.test%2Fa.png").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn image_proxy_serves_cached_bytes(pool: PgPool) {
    let t = common::build_test_app(pool);
    let url = "https://img.test/tatooine.png";
    std::fs::write(t.state.hybrid.images().cache_path(url), b"png-bytes").unwrap();

    let response = get(
        t.app(),
        "/api/v1/image-proxy?url=https%3A%2F%2Fimg.test%2Ftatooine.png",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/png");
}
