//! Downloads wiki images into a flat on-disk cache.
//!
//! Files are named `{sha256(url)}.img`. A cached file is served without any
//! network access. Downloads are written to a temporary file first and then
//! renamed into place.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use futures::stream::{self, StreamExt};
use serde::Serialize;
use loreforge_core::hashing::sha256_hex;

use crate::client::USER_AGENT;
use crate::error::WikiError;

/// Timeout of a single image download.
pub const IMAGE_TIMEOUT: Duration = Duration::from_secs(15);

/// Download attempts per image. Only timeouts are retried.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

const CACHE_EXTENSION: &str = "img";

/// Result of fetching one image.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub success: bool,
    /// Served from the local cache without downloading.
    pub was_cached: bool,
    pub bytes: Option<Vec<u8>>,
    pub path: Option<PathBuf>,
    pub error: Option<String>,
}

impl FetchOutcome {
    fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    fn ok(bytes: Vec<u8>, path: PathBuf, was_cached: bool) -> Self {
        Self {
            success: true,
            was_cached,
            bytes: Some(bytes),
            path: Some(path),
            error: None,
        }
    }

    /// Size of the fetched image in bytes.
    pub fn size(&self) -> Option<i64> {
        self.bytes.as_ref().map(|b| b.len() as i64)
    }
}

/// Tally of a batch download.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub downloaded: i64,
    pub cached: i64,
    pub failed: i64,
    pub total: i64,
}

impl BatchStats {
    pub fn record(&mut self, outcome: &FetchOutcome) {
        self.total += 1;
        match outcome {
            FetchOutcome { success: false, .. } => self.failed += 1,
            FetchOutcome { was_cached: true, .. } => self.cached += 1,
            _ => self.downloaded += 1,
        }
    }
}

/// Contents of the image directory.
#[derive(Debug, Clone, Serialize)]
pub struct ImageDirStats {
    pub files: u64,
    pub size_bytes: u64,
    pub size_mb: f64,
    pub cache_dir: String,
}

/// Whether `url` is worth attempting to download.
///
/// Rejects empty and non-HTTP URLs, plus values with a stray quote prefix
/// left over from scraped markup.
pub fn validate_url(url: &str) -> bool {
    !url.is_empty()
        && url.starts_with("http")
        && !url.starts_with("'d")
        && !url.starts_with("\"d")
}

/// Best-effort image format from a URL path (Fandom puts the file name
/// before `/revision/...`).
pub fn image_format(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_lowercase();
    ["png", "jpeg", "jpg", "gif", "webp", "svg"]
        .into_iter()
        .find(|ext| {
            path.split('/')
                .any(|segment| segment.ends_with(&format!(".{ext}")))
        })
        .map(|ext| if ext == "jpeg" { "jpg" } else { ext }.to_string())
}

/// Fetches images through the on-disk cache.
pub struct ImageFetcher {
    cache_dir: PathBuf,
    client: reqwest::Client,
    max_attempts: u32,
}

impl ImageFetcher {
    /// Create a fetcher, creating `cache_dir` if needed.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self, WikiError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(IMAGE_TIMEOUT)
            .build()?;
        Self::with_client(cache_dir, client)
    }

    /// Create a fetcher reusing an existing [`reqwest::Client`].
    pub fn with_client(
        cache_dir: impl Into<PathBuf>,
        client: reqwest::Client,
    ) -> Result<Self, WikiError> {
        let cache_dir = cache_dir.into();
        std::fs::create_dir_all(&cache_dir)?;
        Ok(Self {
            cache_dir,
            client,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Cache file for `url`.
    pub fn cache_path(&self, url: &str) -> PathBuf {
        self.cache_dir
            .join(format!("{}.{CACHE_EXTENSION}", sha256_hex(url.as_bytes())))
    }

    pub fn is_cached(&self, url: &str) -> bool {
        self.cache_path(url).is_file()
    }

    /// Fetch one image, serving the cached copy when present.
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        if !validate_url(url) {
            return FetchOutcome::failed("invalid image url");
        }

        let path = self.cache_path(url);
        if let Ok(bytes) = tokio::fs::read(&path).await {
            return FetchOutcome::ok(bytes, path, true);
        }

        let bytes = match self.download(url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(url, error = %e, "Image download failed");
                return FetchOutcome::failed(e.to_string());
            }
        };

        match write_atomic(&path, &bytes).await {
            Ok(()) => FetchOutcome::ok(bytes, path, false),
            Err(e) => {
                tracing::warn!(url, error = %e, "Failed to write image cache file");
                FetchOutcome::failed(e.to_string())
            }
        }
    }

    /// Fetch many images with at most `max_workers` in flight, keeping each
    /// URL's outcome.
    pub async fn fetch_all(
        &self,
        urls: Vec<String>,
        max_workers: usize,
    ) -> Vec<(String, FetchOutcome)> {
        stream::iter(urls)
            .map(|url| async move {
                let outcome = self.fetch(&url).await;
                (url, outcome)
            })
            .buffer_unordered(max_workers.max(1))
            .collect()
            .await
    }

    /// Fetch many images and return only the tally.
    pub async fn fetch_batch(&self, urls: Vec<String>, max_workers: usize) -> BatchStats {
        let mut stats = BatchStats::default();
        for (_, outcome) in self.fetch_all(urls, max_workers).await {
            stats.record(&outcome);
        }
        stats
    }

    /// Delete cached files, all of them or only those last modified more
    /// than `older_than_days` ago. Returns the paths removed.
    pub async fn clear_cache(&self, older_than_days: Option<i64>) -> Result<Vec<PathBuf>, WikiError> {
        let cutoff = older_than_days.map(|days| {
            SystemTime::now() - Duration::from_secs(days.max(0) as u64 * 24 * 3600)
        });

        let mut removed = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.cache_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !is_cache_file(&path) {
                continue;
            }
            if let Some(cutoff) = cutoff {
                let modified = entry.metadata().await?.modified()?;
                if modified >= cutoff {
                    continue;
                }
            }
            tokio::fs::remove_file(&path).await?;
            removed.push(path);
        }

        tracing::info!(removed = removed.len(), cache_dir = %self.cache_dir.display(), "Cleared image cache");
        Ok(removed)
    }

    /// Count and size of cached files.
    pub async fn stats(&self) -> Result<ImageDirStats, WikiError> {
        let mut files = 0;
        let mut size_bytes = 0;
        let mut entries = tokio::fs::read_dir(&self.cache_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if is_cache_file(&entry.path()) {
                files += 1;
                size_bytes += entry.metadata().await?.len();
            }
        }

        Ok(ImageDirStats {
            files,
            size_bytes,
            size_mb: (size_bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0,
            cache_dir: self.cache_dir.display().to_string(),
        })
    }

    // ---- private helpers ----

    async fn download(&self, url: &str) -> Result<Vec<u8>, WikiError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_download(url).await {
                Err(WikiError::Request(e)) if e.is_timeout() && attempt < self.max_attempts => {
                    tracing::warn!(url, attempt, "Image download timed out, retrying");
                }
                other => return other,
            }
        }
    }

    async fn try_download(&self, url: &str) -> Result<Vec<u8>, WikiError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(WikiError::Api {
                status: status.as_u16(),
                body: String::new(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

fn is_cache_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == CACHE_EXTENSION)
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
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
