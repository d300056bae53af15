//! File tier: one JSON snapshot of a universe's canon data.
//!
//! Each universe is stored as `{universe}_depth{depth}.json` with a sibling
//! `{universe}_depth{depth}_meta.json`. The snapshot is valid only while
//! both files exist and the meta's `expires_at` lies in the future.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use loreforge_core::cache_ttl::{self, CacheAge};
use loreforge_core::canon::{self, CanonData};
use loreforge_core::types::Timestamp;

use crate::error::CacheError;

/// Crawl depth recorded in snapshot file names.
pub const CANON_DEPTH: u32 = 3;

/// Metadata stored next to a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonCacheMeta {
    pub created_at: Timestamp,
    pub universe: String,
    pub depth: u32,
    pub total_items: usize,
    pub categories_count: usize,
    /// Categories holding at least one item.
    pub categories: Vec<String>,
    pub ttl_days: i64,
    pub expires_at: Timestamp,
}

/// Meta plus age information.
#[derive(Debug, Clone, Serialize)]
pub struct CanonCacheStats {
    #[serde(flatten)]
    pub meta: CanonCacheMeta,
    #[serde(flatten)]
    pub age: CacheAge,
}

/// Snapshot store rooted at one directory.
pub struct CanonFileCache {
    dir: PathBuf,
    ttl_days: i64,
}

impl CanonFileCache {
    /// Open the store, creating `dir` if needed.
    pub fn new(dir: impl Into<PathBuf>, ttl_days: i64) -> Result<Self, CacheError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, ttl_days })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn data_path(&self, universe: &str) -> PathBuf {
        self.dir.join(format!("{universe}_depth{CANON_DEPTH}.json"))
    }

    pub fn meta_path(&self, universe: &str) -> PathBuf {
        self.dir.join(format!("{universe}_depth{CANON_DEPTH}_meta.json"))
    }

    /// Whether the data file exists, regardless of expiry.
    pub fn exists(&self, universe: &str) -> bool {
        self.data_path(universe).is_file()
    }

    /// Read the meta file, if present and parseable.
    pub async fn read_meta(&self, universe: &str) -> Option<CanonCacheMeta> {
        let raw = tokio::fs::read(self.meta_path(universe)).await.ok()?;
        match serde_json::from_slice(&raw) {
            Ok(meta) => Some(meta),
            Err(e) => {
                tracing::warn!(universe, error = %e, "Ignoring unreadable canon cache meta");
                None
            }
        }
    }

    /// Whether both files exist and the snapshot has not expired.
    pub async fn is_valid(&self, universe: &str) -> bool {
        if !self.exists(universe) {
            return false;
        }
        match self.read_meta(universe).await {
            Some(meta) => !cache_ttl::is_expired(meta.expires_at, Utc::now()),
            None => false,
        }
    }

    /// Load a valid snapshot.
    pub async fn load(&self, universe: &str) -> Result<Option<CanonData>, CacheError> {
        if !self.is_valid(universe).await {
            return Ok(None);
        }
        let raw = tokio::fs::read(self.data_path(universe)).await?;
        let data: CanonData = serde_json::from_slice(&raw)?;
        tracing::debug!(universe, items = canon::total_items(&data), "Loaded canon file cache");
        Ok(Some(data))
    }

    /// Write a snapshot and its meta, replacing any existing one.
    pub async fn save(&self, universe: &str, data: &CanonData) -> Result<CanonCacheMeta, CacheError> {
        let now = Utc::now();
        let categories = canon::non_empty_categories(data);
        let meta = CanonCacheMeta {
            created_at: now,
            universe: universe.to_string(),
            depth: CANON_DEPTH,
            total_items: canon::total_items(data),
            categories_count: categories.len(),
            categories,
            ttl_days: self.ttl_days,
            expires_at: cache_ttl::expires_at(now, self.ttl_days),
        };

        write_atomic(&self.data_path(universe), &serde_json::to_vec(data)?).await?;
        write_atomic(&self.meta_path(universe), &serde_json::to_vec_pretty(&meta)?).await?;

        tracing::info!(
            universe,
            total_items = meta.total_items,
            categories = meta.categories_count,
            "Saved canon file cache",
        );
        Ok(meta)
    }

    /// Delete the snapshot. Returns `true` if anything was removed.
    pub async fn invalidate(&self, universe: &str) -> Result<bool, CacheError> {
        let mut removed = false;
        for path in [self.data_path(universe), self.meta_path(universe)] {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed = true,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        if removed {
            tracing::info!(universe, "Invalidated canon file cache");
        }
        Ok(removed)
    }

    /// Meta with age and remaining lifetime, if a meta file exists.
    pub async fn stats(&self, universe: &str) -> Option<CanonCacheStats> {
        let meta = self.read_meta(universe).await?;
        let age = CacheAge::compute(meta.created_at, meta.expires_at, Utc::now());
        Some(CanonCacheStats { meta, age })
    }
}

/// Write `bytes` to a uniquely named temporary sibling and rename it over
/// `path`, so concurrent writers never share a partial file.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let path = path.to_path_buf();
    let bytes = bytes.to_vec();
    tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(std::io::Error::other)?
}
