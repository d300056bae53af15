//! File tier for single articles, keyed by universe and title.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use loreforge_core::cache_ttl::ARTICLE_FILE_VALIDITY_HOURS;
use loreforge_core::types::Timestamp;

use crate::canon_file::write_atomic;
use crate::error::CacheError;

/// Longest sanitized title used in a file name.
const MAX_FILENAME_TITLE: usize = 100;

static UNSAFE_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}_-]").expect("valid regex"));

/// Turn a title into a file-name-safe fragment.
pub fn sanitize_title(title: &str) -> String {
    let replaced = title.replace(['/', '\\', ' '], "_");
    UNSAFE_CHARS_RE
        .replace_all(&replaced, "")
        .chars()
        .take(MAX_FILENAME_TITLE)
        .collect()
}

/// On-disk form of a cached article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedArticle {
    pub universe: String,
    pub title: String,
    pub cached_at: Timestamp,
    pub content: serde_json::Value,
}

/// A keyword search hit.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleHit {
    pub title: String,
    pub relevance: usize,
    pub content: serde_json::Value,
}

pub struct ArticleFileCache {
    dir: PathBuf,
}

impl ArticleFileCache {
    /// Open the store, creating `dir` if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn path(&self, universe: &str, title: &str) -> PathBuf {
        self.dir
            .join(format!("{universe}_{}.json", sanitize_title(title)))
    }

    /// Cached content for an article younger than the validity window.
    ///
    /// Distinct titles can sanitize to the same file name, so an entry
    /// stored under another title is a miss.
    pub async fn get(
        &self,
        universe: &str,
        title: &str,
    ) -> Result<Option<serde_json::Value>, CacheError> {
        let Some(entry) = read_entry(&self.path(universe, title)).await? else {
            return Ok(None);
        };
        if entry.universe == universe && entry.title == title && is_fresh(&entry) {
            Ok(Some(entry.content))
        } else {
            Ok(None)
        }
    }

    /// Store an article.
    pub async fn put(
        &self,
        universe: &str,
        title: &str,
        content: &serde_json::Value,
    ) -> Result<(), CacheError> {
        let entry = CachedArticle {
            universe: universe.to_string(),
            title: title.to_string(),
            cached_at: Utc::now(),
            content: content.clone(),
        };
        write_atomic(&self.path(universe, title), &serde_json::to_vec(&entry)?).await?;
        Ok(())
    }

    /// Fresh articles of a universe whose content mentions `keyword`,
    /// most mentions first.
    pub async fn search_by_keyword(
        &self,
        universe: &str,
        keyword: &str,
    ) -> Result<Vec<ArticleHit>, CacheError> {
        let needle = keyword.to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let prefix = format!("{universe}_");

        let mut hits = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(dirent) = entries.next_entry().await? {
            let name = dirent.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.starts_with(&prefix) || !name.ends_with(".json") {
                continue;
            }

            let Some(entry) = read_entry(&dirent.path()).await? else { continue };
            if entry.universe != universe || !is_fresh(&entry) {
                continue;
            }

            let haystack = entry.content.to_string().to_lowercase();
            let relevance = haystack.matches(&needle).count();
            if relevance > 0 {
                hits.push(ArticleHit {
                    title: entry.title,
                    relevance,
                    content: entry.content,
                });
            }
        }

        hits.sort_by(|a, b| b.relevance.cmp(&a.relevance).then_with(|| a.title.cmp(&b.title)));
        Ok(hits)
    }
}

fn is_fresh(entry: &CachedArticle) -> bool {
    Utc::now() - entry.cached_at < Duration::hours(ARTICLE_FILE_VALIDITY_HOURS)
}

async fn read_entry(path: &Path) -> Result<Option<CachedArticle>, CacheError> {
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    match serde_json::from_slice(&raw) {
        Ok(entry) => Ok(Some(entry)),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Skipping corrupt article cache file");
            Ok(None)
        }
    }
}
