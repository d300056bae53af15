use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use loreforge_cache::prefetch::PrefetchOptions;
use loreforge_core::cache_ttl::DEFAULT_TTL_DAYS;
use loreforge_core::prefetch::{DEFAULT_IMAGE_LIMIT_PER_CATEGORY, DEFAULT_IMAGE_WORKERS};
use loreforge_core::universe::{validate_universe, DEFAULT_UNIVERSE};
use loreforge_wiki::rate_limit::{DEFAULT_CALLS, DEFAULT_PERIOD};

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development except the
/// database URL and JWT secret.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT validation settings.
    pub jwt: JwtConfig,
    /// Cache directories, TTL and prefetch settings.
    pub cache: CacheConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            host,
            port: env_or("PORT", 3000),
            cors_origins,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30),
            jwt: JwtConfig::from_env(),
            cache: CacheConfig::from_env(),
        }
    }
}

/// Cache and prefetch settings.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory of the per-universe canon snapshots.
    pub canon_cache_dir: PathBuf,
    /// Directory of the per-article content cache.
    pub article_cache_dir: PathBuf,
    /// Directory of downloaded images.
    pub image_cache_dir: PathBuf,
    /// Lifetime of cached articles and snapshots.
    pub ttl_days: i64,
    /// Run a prefetch in the background at startup.
    pub prefetch_enabled: bool,
    pub prefetch_universe: String,
    pub prefetch_image_workers: usize,
    pub prefetch_force_refresh: bool,
    /// Wiki API calls allowed per `wiki_rate_limit_period`.
    pub wiki_rate_limit_calls: u32,
    pub wiki_rate_limit_period: Duration,
    /// How often expired cache entries are purged.
    pub cleanup_interval: Duration,
}

impl CacheConfig {
    /// Load cache settings from environment variables.
    ///
    /// | Env Var                       | Default          |
    /// |-------------------------------|------------------|
    /// | `CANON_CACHE_DIR`             | `cache/canon`    |
    /// | `ARTICLE_CACHE_DIR`           | `cache/articles` |
    /// | `IMAGE_CACHE_DIR`             | `./image_cache`  |
    /// | `CACHE_TTL_DAYS`              | `7`              |
    /// | `PREFETCH_ENABLED`            | `true`           |
    /// | `PREFETCH_UNIVERSE`           | `star_wars`      |
    /// | `PREFETCH_IMAGE_WORKERS`      | `20`             |
    /// | `PREFETCH_FORCE_REFRESH`      | `false`          |
    /// | `WIKI_RATE_LIMIT_CALLS`       | `150`            |
    /// | `WIKI_RATE_LIMIT_PERIOD_SECS` | `60`             |
    /// | `CACHE_CLEANUP_INTERVAL_SECS` | `21600`          |
    ///
    /// # Panics
    ///
    /// Panics if a value does not parse or `PREFETCH_UNIVERSE` is unknown.
    pub fn from_env() -> Self {
        let prefetch_universe =
            std::env::var("PREFETCH_UNIVERSE").unwrap_or_else(|_| DEFAULT_UNIVERSE.into());
        if let Err(e) = validate_universe(&prefetch_universe) {
            panic!("PREFETCH_UNIVERSE is invalid: {e}");
        }

        Self {
            canon_cache_dir: env_or("CANON_CACHE_DIR", PathBuf::from("cache/canon")),
            article_cache_dir: env_or("ARTICLE_CACHE_DIR", PathBuf::from("cache/articles")),
            image_cache_dir: env_or("IMAGE_CACHE_DIR", PathBuf::from("./image_cache")),
            ttl_days: env_or("CACHE_TTL_DAYS", DEFAULT_TTL_DAYS),
            prefetch_enabled: env_or("PREFETCH_ENABLED", true),
            prefetch_universe,
            prefetch_image_workers: env_or("PREFETCH_IMAGE_WORKERS", DEFAULT_IMAGE_WORKERS),
            prefetch_force_refresh: env_or("PREFETCH_FORCE_REFRESH", false),
            wiki_rate_limit_calls: env_or("WIKI_RATE_LIMIT_CALLS", DEFAULT_CALLS),
            wiki_rate_limit_period: Duration::from_secs(env_or(
                "WIKI_RATE_LIMIT_PERIOD_SECS",
                DEFAULT_PERIOD.as_secs(),
            )),
            cleanup_interval: Duration::from_secs(env_or("CACHE_CLEANUP_INTERVAL_SECS", 21_600)),
        }
    }

    /// Options for the startup prefetch run.
    pub fn prefetch_options(&self) -> PrefetchOptions {
        PrefetchOptions {
            universe: self.prefetch_universe.clone(),
            image_workers: self.prefetch_image_workers,
            force_refresh: self.prefetch_force_refresh,
            image_limit_per_category: DEFAULT_IMAGE_LIMIT_PER_CATEGORY,
        }
    }
}

/// Parse `key` from the environment, falling back to `default` when unset.
fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key} has an invalid value '{raw}': {e}")),
        Err(_) => default,
    }
}
