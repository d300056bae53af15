//! HTTP-level tests for the `/characters` resource.

mod common;

use axum::http::StatusCode;
use common::{body_json, delete_auth, get, get_auth, post_json_auth, put_json_auth, user_token};
use serde_json::json;
use sqlx::PgPool;

async fn create_character(t: &common::TestApp, token: &str, name: &str) -> i64 {
    let response = post_json_auth(
        t.app(),
        "/api/v1/characters",
        json!({"name": name, "universe": "star_wars", "race": "Human", "level": 3}),
        token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_returns_201_with_owner(pool: PgPool) {
    let t = common::build_test_app(pool);
    let token = user_token(7);
    let response = post_json_auth(
        t.app(),
        "/api/v1/characters",
        json!({"name": "Kira Vell", "universe": "star_wars", "homeworld": "Corellia"}),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Kira Vell");
    assert_eq!(json["data"]["owner_id"], 7);
    assert_eq!(json["data"]["homeworld"], "Corellia");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_rejects_unknown_universe_and_blank_name(pool: PgPool) {
    let t = common::build_test_app(pool);
    let token = user_token(7);

    let response = post_json_auth(
        t.app(),
        "/api/v1/characters",
        json!({"name": "Frodo", "universe": "middle_earth"}),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json_auth(
        t.app(),
        "/api/v1/characters",
        json!({"name": "   ", "universe": "star_wars"}),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_returns_only_own_characters(pool: PgPool) {
    let t = common::build_test_app(pool);
    let alice = user_token(1);
    let bob = user_token(2);
    create_character(&t, &alice, "Alice One").await;
    create_character(&t, &alice, "Alice Two").await;
    create_character(&t, &bob, "Bob One").await;

    let response = get_auth(t.app(), "/api/v1/characters", &alice).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let names: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.iter().all(|n| n.starts_with("Alice")));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn other_users_character_reads_as_not_found(pool: PgPool) {
    let t = common::build_test_app(pool);
    let id = create_character(&t, &user_token(1), "Secret").await;

    let response = get_auth(t.app(), &format!("/api/v1/characters/{id}"), &user_token(2)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = delete_auth(t.app(), &format!("/api/v1/characters/{id}"), &user_token(2)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_then_delete(pool: PgPool) {
    let t = common::build_test_app(pool);
    let token = user_token(3);
    let id = create_character(&t, &token, "Original").await;

    let response = put_json_auth(
        t.app(),
        &format!("/api/v1/characters/{id}"),
        json!({"name": "Renamed", "level": 5}),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Renamed");
    assert_eq!(json["data"]["level"], 5);
    assert_eq!(json["data"]["race"], "Human");

    let response = delete_auth(t.app(), &format!("/api/v1/characters/{id}"), &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(t.app(), &format!("/api/v1/characters/{id}"), &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn characters_require_a_token(pool: PgPool) {
    let t = common::build_test_app(pool);
    let response = get(t.app(), "/api/v1/characters").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
