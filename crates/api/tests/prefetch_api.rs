//! HTTP-level tests for prefetch control and cache maintenance.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use common::{
    admin_token, body_json, get, post_auth, post_json_auth, sample_data, user_token, StubSource,
    TestApp,
};
use loreforge_db::models::wiki_article::UpsertWikiArticle;
use loreforge_db::repositories::WikiArticleRepo;
use serde_json::json;
use sqlx::PgPool;

/// Poll the status endpoint until the current run finishes.
async fn wait_for_prefetch(t: &TestApp) -> serde_json::Value {
    for _ in 0..200 {
        let json = body_json(get(t.app(), "/api/v1/prefetch/status").await).await;
        if json["progress"]["is_running"] == false && json["progress"]["stage"] != "idle" {
            return json;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("prefetch did not finish in time");
}

// ---------------------------------------------------------------------------
// Prefetch
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn status_is_idle_before_any_run(pool: PgPool) {
    let t = common::build_test_app(pool);
    let response = get(t.app(), "/api/v1/prefetch/status").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["is_complete"], false);
    assert_eq!(json["progress"]["stage"], "idle");
    assert_eq!(json["progress"]["is_running"], false);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn start_requires_admin(pool: PgPool) {
    let t = common::build_test_app(pool);

    let response = common::post_json(t.app(), "/api/v1/prefetch/start", json!({})).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = post_auth(t.app(), "/api/v1/prefetch/start", &user_token(5)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(t.source.calls(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn start_rejects_unknown_universe(pool: PgPool) {
    let t = common::build_test_app(pool);
    let response = post_json_auth(
        t.app(),
        "/api/v1/prefetch/start",
        json!({"universe": "narnia"}),
        &admin_token(1),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_start_runs_to_completion(pool: PgPool) {
    let t = common::build_test_app(pool);

    let response = post_auth(t.app(), "/api/v1/prefetch/start", &admin_token(1)).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = body_json(response).await;
    assert_eq!(json["started"], true);
    assert_eq!(json["universe"], "star_wars");

    let status = wait_for_prefetch(&t).await;
    assert_eq!(status["is_complete"], true);
    assert_eq!(status["progress"]["stage"], "complete");
    assert_eq!(status["progress"]["articles_created"], 4);

    let response = get(t.app(), "/api/v1/cache/star_wars/info").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["backend"], "hybrid");
    assert_eq!(json["database"]["total"], 4);
    assert_eq!(json["file_cache"]["valid"], true);
}

// ---------------------------------------------------------------------------
// Cache maintenance
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn maintenance_requires_admin(pool: PgPool) {
    let t = common::build_test_app(pool);
    let token = user_token(5);

    for uri in [
        "/api/v1/cache/star_wars/invalidate",
        "/api/v1/cache/star_wars/refresh",
        "/api/v1/cache/cleanup",
    ] {
        let response = post_auth(t.app(), uri, &token).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn stats_and_cleanup_on_empty_cache(pool: PgPool) {
    let t = common::build_test_app(pool);

    let response = get(t.app(), "/api/v1/cache/star_wars/stats").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["file_cache"].is_null());
    assert_eq!(json["hybrid"]["postgresql"]["total"], 0);
    assert_eq!(json["image_files"]["files"], 0);

    let response = post_auth(t.app(), "/api/v1/cache/cleanup", &admin_token(1)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["articles_deleted"], 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn invalidate_then_refresh(pool: PgPool) {
    let t = common::build_test_app(pool);
    let admin = admin_token(1);

    // Populate the file tier through a read.
    get(t.app(), "/api/v1/canon/star_wars/all").await;

    let response = post_auth(t.app(), "/api/v1/cache/star_wars/invalidate", &admin).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["invalidated"], true);

    let response = post_auth(t.app(), "/api/v1/cache/star_wars/refresh", &admin).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["articles_deleted"], 0);
    assert_eq!(json["prefetch_started"], true);

    let status = wait_for_prefetch(&t).await;
    assert_eq!(status["is_complete"], true);
    assert_eq!(t.source.calls(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn refresh_is_refused_while_a_prefetch_runs(pool: PgPool) {
    let t = common::build_test_app_with_source(
        pool.clone(),
        StubSource::slow(sample_data(), Duration::from_secs(30)),
    );
    let admin = admin_token(1);
    let hoth = UpsertWikiArticle {
        title: "Hoth".to_string(),
        universe: "star_wars".to_string(),
        category: "planets".to_string(),
        content: json!({ "description": "Ice planet" }),
        image_url: None,
        source_url: None,
    };
    WikiArticleRepo::upsert(&pool, &hoth, 7).await.unwrap();

    let response = post_json_auth(
        t.app(),
        "/api/v1/prefetch/start",
        json!({ "force_refresh": true }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let response = post_auth(t.app(), "/api/v1/cache/star_wars/refresh", &admin).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "CONFLICT");
    assert_eq!(WikiArticleRepo::count_for_universe(&pool, "star_wars").await.unwrap(), 1);

    t.state.prefetch.cancel().await;
    let status = wait_for_prefetch(&t).await;
    assert_eq!(status["progress"]["stage"], "failed");
}
