use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use loreforge_api::background::cache_cleanup;
use loreforge_api::config::ServerConfig;
use loreforge_api::router::build_app_router;
use loreforge_api::state::AppState;
use loreforge_api::ws;
use loreforge_wiki::client::build_http_client;
use loreforge_wiki::rate_limit::WikiRateLimiter;
use loreforge_wiki::source::WikiCanonSource;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "loreforge_api=debug,loreforge_cache=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = loreforge_db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    loreforge_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::info!("Database health check passed");

    loreforge_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    // --- Wiki source ---
    let limiter = Arc::new(WikiRateLimiter::new(
        config.cache.wiki_rate_limit_calls,
        config.cache.wiki_rate_limit_period,
    ));
    let http = build_http_client().context("Failed to build wiki HTTP client")?;
    let source = Arc::new(WikiCanonSource::new(http, limiter));

    // --- App state ---
    let shutdown = CancellationToken::new();
    let state = AppState::new(pool, config.clone(), source, shutdown.clone())
        .context("Failed to initialize cache tiers")?;

    // --- Background tasks ---
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&state.ws_manager), shutdown.clone());
    let cleanup_handle = tokio::spawn(cache_cleanup::run(
        Arc::clone(&state.hybrid),
        config.cache.cleanup_interval,
        shutdown.clone(),
    ));

    if config.cache.prefetch_enabled {
        let options = config.cache.prefetch_options();
        tracing::info!(universe = %options.universe, "Starting background prefetch");
        state.prefetch.start(options).await;
    } else {
        tracing::info!("Startup prefetch disabled");
    }

    let ws_manager = Arc::clone(&state.ws_manager);
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().context("Invalid HOST address")?,
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    shutdown.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), cleanup_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), heartbeat_handle).await;
    tracing::info!("Background tasks stopped");

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
