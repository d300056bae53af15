//! Shared fixtures for API integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use loreforge_api::auth::jwt::{generate_access_token, JwtConfig};
use loreforge_api::config::{CacheConfig, ServerConfig};
use loreforge_api::router::build_app_router;
use loreforge_api::state::AppState;
use loreforge_core::canon::{CanonData, CanonItem};
use loreforge_core::roles::{ROLE_ADMIN, ROLE_USER};
use loreforge_wiki::source::CanonSource;
use loreforge_wiki::WikiError;

pub const TEST_JWT_SECRET: &str = "test-secret-for-integration-tests";

/// Canon source returning a fixed dataset and counting calls.
pub struct StubSource {
    pub data: CanonData,
    pub calls: AtomicUsize,
    /// Time each fetch takes before answering.
    pub delay: Option<Duration>,
}

impl StubSource {
    pub fn new(data: CanonData) -> Self {
        Self {
            data,
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn slow(data: CanonData, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(data)
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
        Ok(self.data.clone())
    }
}

fn item(id: i64, title: &str) -> CanonItem {
    CanonItem {
        id,
        title: title.to_string(),
        url: Some(format!("https://starwars.fandom.com/wiki/{title}")),
        categories: vec!["Test".to_string()],
        abstract_text: Some(format!("About {title}")),
        thumbnail: None,
        image_url: None,
    }
}

/// Two planets, one droid and one vehicle, none with images so the image
/// stage of a prefetch never reaches the network.
pub fn sample_data() -> CanonData {
    let mut data = CanonData::new();
    data.insert(
        "planets".to_string(),
        vec![item(1, "Tatooine"), item(2, "Hoth")],
    );
    data.insert("droids".to_string(), vec![item(3, "R2-D2")]);
    data.insert("vehicles".to_string(), vec![item(4, "X-wing")]);
    data
}

pub fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: TEST_JWT_SECRET.to_string(),
        access_token_expiry_mins: 15,
    }
}

/// Build a test `ServerConfig` with cache directories under `dir`.
pub fn test_config(dir: &TempDir) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: jwt_config(),
        cache: CacheConfig {
            canon_cache_dir: dir.path().join("canon"),
            article_cache_dir: dir.path().join("articles"),
            image_cache_dir: dir.path().join("images"),
            ttl_days: 7,
            prefetch_enabled: false,
            prefetch_universe: "star_wars".to_string(),
            prefetch_image_workers: 2,
            prefetch_force_refresh: false,
            wiki_rate_limit_calls: 150,
            wiki_rate_limit_period: Duration::from_secs(60),
            cleanup_interval: Duration::from_secs(21_600),
        },
    }
}

/// A router over the full middleware stack plus handles into its state.
///
/// Keeps the temporary cache directory alive for the life of the test.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub source: Arc<StubSource>,
    _dir: TempDir,
}

impl TestApp {
    /// A fresh handle to the router (each `oneshot` consumes one).
    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

pub fn build_test_app(pool: PgPool) -> TestApp {
    build_test_app_with_source(pool, StubSource::new(sample_data()))
}

pub fn build_test_app_with_source(pool: PgPool, source: StubSource) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    let source = Arc::new(source);

    let state = AppState::new(pool, config.clone(), source.clone(), CancellationToken::new())
        .expect("cache tiers initialize");
    let router = build_app_router(state.clone(), &config);

    TestApp {
        router,
        state,
        source,
        _dir: dir,
    }
}

/// Bearer token for a regular user.
pub fn user_token(user_id: i64) -> String {
    generate_access_token(user_id, ROLE_USER, &jwt_config()).unwrap()
}

/// Bearer token for an administrator.
pub fn admin_token(user_id: i64) -> String {
    generate_access_token(user_id, ROLE_ADMIN, &jwt_config()).unwrap()
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
