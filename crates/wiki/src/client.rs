//! Rate-limited client for a Fandom wiki.
//!
//! Two APIs are used. The MediaWiki action API (`/api.php`) lists category
//! members and page categories. The Fandom REST API (`/api/v1`) supplies
//! abstracts and thumbnails. Every request waits on the shared
//! [`WikiRateLimiter`] first.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::Deserialize;
use tokio::sync::Semaphore;
use loreforge_core::canon::{CanonData, CanonItem};
use loreforge_core::category::{categorize_article, normalize_wiki_category};
use loreforge_core::universe::WikiUniverse;

use crate::error::WikiError;
use crate::rate_limit::WikiRateLimiter;

/// `User-Agent` sent with every wiki request.
pub const USER_AGENT: &str = "Loreforge/0.1 (canon reference cache)";

/// Total timeout of a single wiki request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on members listed from a single category.
pub const MAX_CATEGORY_MEMBERS: usize = 100_000;

/// Members returned per `categorymembers` page.
const MEMBERS_PAGE_SIZE: u32 = 500;

/// Page ids per `prop=categories` request (MediaWiki maximum).
const CATEGORY_BATCH_SIZE: usize = 50;

/// Page ids handled by one categorization work unit.
const CATEGORIZE_BATCH_SIZE: usize = 100;

/// Page ids per `Articles/Details` request.
const DETAILS_BATCH_SIZE: usize = 100;

/// Abstract length requested from `Articles/Details`.
const ABSTRACT_LENGTH: u32 = 500;

/// Build the HTTP client shared by wiki clients.
pub fn build_http_client() -> Result<reqwest::Client, WikiError> {
    Ok(reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()?)
}

/// A page returned by a category listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRef {
    pub page_id: i64,
    pub title: String,
}

/// Abstract, thumbnail and canonical URL of an article.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleDetail {
    pub abstract_text: Option<String>,
    pub thumbnail: Option<String>,
    pub url: Option<String>,
}

/// HTTP client for one universe's wiki.
pub struct WikiClient {
    universe: &'static WikiUniverse,
    http: reqwest::Client,
    rate_limiter: Arc<WikiRateLimiter>,
}

impl WikiClient {
    pub fn new(
        universe: &'static WikiUniverse,
        http: reqwest::Client,
        rate_limiter: Arc<WikiRateLimiter>,
    ) -> Self {
        Self {
            universe,
            http,
            rate_limiter,
        }
    }

    pub fn universe(&self) -> &'static WikiUniverse {
        self.universe
    }

    /* ----------------------------------------------------------------------
    MediaWiki action API
    ---------------------------------------------------------------------- */

    /// List the pages of `Category:{category}`, following continuation
    /// tokens until exhausted or `max_total` pages are collected.
    pub async fn category_members(
        &self,
        category: &str,
        max_total: usize,
    ) -> Result<Vec<PageRef>, WikiError> {
        let url = self.universe.mediawiki_api_url();
        let cmtitle = format!("Category:{category}");
        let cmlimit = MEMBERS_PAGE_SIZE.to_string();
        let mut members = Vec::new();
        let mut continue_token: Option<String> = None;

        loop {
            let mut params = vec![
                ("action", "query"),
                ("list", "categorymembers"),
                ("cmtitle", cmtitle.as_str()),
                ("cmlimit", cmlimit.as_str()),
                ("cmtype", "page"),
                ("format", "json"),
            ];
            if let Some(token) = continue_token.as_deref() {
                params.push(("cmcontinue", token));
            }

            let body = self.get_json(&url, &params).await?;
            let (page, next) = parse_category_members(body)?;
            members.extend(page);

            tracing::debug!(
                universe = self.universe.key,
                category,
                collected = members.len(),
                "Listed category members page",
            );

            match next {
                Some(token) if members.len() < max_total => continue_token = Some(token),
                _ => break,
            }
        }

        members.truncate(max_total);
        Ok(members)
    }

    /// Fetch the visible wiki categories of each page, normalized.
    ///
    /// A failed request leaves empty category lists for its pages.
    pub async fn page_categories(&self, page_ids: &[i64]) -> HashMap<i64, Vec<String>> {
        let url = self.universe.mediawiki_api_url();
        let mut result = HashMap::with_capacity(page_ids.len());

        for batch in page_ids.chunks(CATEGORY_BATCH_SIZE) {
            let ids = join_ids(batch, "|");
            let params = [
                ("action", "query"),
                ("pageids", ids.as_str()),
                ("prop", "categories"),
                ("cllimit", "500"),
                ("clshow", "!hidden"),
                ("format", "json"),
            ];

            match self.get_json(&url, &params).await.and_then(parse_page_categories) {
                Ok(map) => result.extend(map),
                Err(e) => {
                    tracing::warn!(
                        universe = self.universe.key,
                        batch_len = batch.len(),
                        error = %e,
                        "Page categories batch failed",
                    );
                    for id in batch {
                        result.insert(*id, Vec::new());
                    }
                }
            }
        }

        result
    }

    /* ----------------------------------------------------------------------
    Fandom REST API
    ---------------------------------------------------------------------- */

    /// Fetch abstracts, thumbnails and URLs, `DETAILS_BATCH_SIZE` ids per
    /// request. Failed batches are skipped.
    pub async fn article_details(
        &self,
        page_ids: &[i64],
        max_workers: usize,
    ) -> HashMap<i64, ArticleDetail> {
        let url = format!("{}/Articles/Details", self.universe.fandom_api_url());
        let abstract_len = ABSTRACT_LENGTH.to_string();

        let batches: Vec<Vec<i64>> = page_ids
            .chunks(DETAILS_BATCH_SIZE)
            .map(<[i64]>::to_vec)
            .collect();

        let results: Vec<_> = stream::iter(batches)
            .map(|batch| {
                let url = &url;
                let abstract_len = &abstract_len;
                async move {
                    let ids = join_ids(&batch, ",");
                    let params = [("ids", ids.as_str()), ("abstract", abstract_len.as_str())];
                    let outcome = self
                        .get_json(url, &params)
                        .await
                        .and_then(|body| parse_article_details(body, self.universe.base_url));
                    (batch.len(), outcome)
                }
            })
            .buffer_unordered(max_workers.max(1))
            .collect()
            .await;

        let mut details = HashMap::with_capacity(page_ids.len());
        for (batch_len, outcome) in results {
            match outcome {
                Ok(map) => details.extend(map),
                Err(e) => tracing::warn!(
                    universe = self.universe.key,
                    batch_len,
                    error = %e,
                    "Article details batch failed",
                ),
            }
        }
        details
    }

    /* ----------------------------------------------------------------------
    Ingestion
    ---------------------------------------------------------------------- */

    /// Build the full categorized canon dataset for this universe.
    ///
    /// Lists the canon category, categorizes pages by their wiki
    /// categories (at most `max_workers` batches in flight), drops pages
    /// that match no category, then enriches the rest with details.
    pub async fn fetch_canonical_data(&self, max_workers: usize) -> Result<CanonData, WikiError> {
        let universe = self.universe.key;
        let members = self
            .category_members(self.universe.canon_category, MAX_CATEGORY_MEMBERS)
            .await?;

        if members.is_empty() {
            tracing::warn!(universe, category = self.universe.canon_category, "Canon category is empty");
            return Ok(CanonData::new());
        }
        tracing::info!(universe, articles = members.len(), "Listed canon articles");

        let semaphore = Arc::new(Semaphore::new(max_workers.max(1)));
        let ids: Vec<i64> = members.iter().map(|m| m.page_id).collect();
        let batches = ids.chunks(CATEGORIZE_BATCH_SIZE).map(|batch| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                let _permit = semaphore.acquire_owned().await;
                self.page_categories(batch).await
            }
        });
        let mut page_categories = HashMap::with_capacity(ids.len());
        for map in futures::future::join_all(batches).await {
            page_categories.extend(map);
        }

        let mut data = categorize_pages(members, &mut page_categories);
        let uncategorized = ids.len() - loreforge_core::canon::total_items(&data);
        tracing::info!(
            universe,
            categorized = ids.len() - uncategorized,
            uncategorized,
            categories = data.len(),
            "Categorized canon articles",
        );

        for (category, items) in data.iter_mut() {
            let ids: Vec<i64> = items.iter().map(|i| i.id).collect();
            let details = self.article_details(&ids, max_workers).await;
            enrich_items(items, &details);
            tracing::debug!(universe, category = %category, items = items.len(), "Enriched category");
        }

        Ok(data)
    }

    // ---- private helpers ----

    async fn get_json(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<serde_json::Value, WikiError> {
        self.rate_limiter.acquire().await;

        let response = self.http.get(url).query(params).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(WikiError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<serde_json::Value>().await?)
    }
}

fn join_ids(ids: &[i64], sep: &str) -> String {
    ids.iter().map(i64::to_string).collect::<Vec<_>>().join(sep)
}

/* --------------------------------------------------------------------------
Response parsing
-------------------------------------------------------------------------- */

#[derive(Deserialize)]
struct CategoryMembersResponse {
    #[serde(default)]
    query: Option<CategoryMembersQuery>,
    #[serde(rename = "continue", default)]
    continuation: Option<Continuation>,
}

#[derive(Deserialize)]
struct CategoryMembersQuery {
    #[serde(default)]
    categorymembers: Vec<RawMember>,
}

#[derive(Deserialize)]
struct RawMember {
    pageid: i64,
    title: String,
}

#[derive(Deserialize)]
struct Continuation {
    cmcontinue: Option<String>,
}

#[derive(Deserialize)]
struct PageCategoriesResponse {
    #[serde(default)]
    query: Option<PageCategoriesQuery>,
}

#[derive(Deserialize)]
struct PageCategoriesQuery {
    #[serde(default)]
    pages: HashMap<String, RawPage>,
}

#[derive(Deserialize)]
struct RawPage {
    #[serde(default)]
    categories: Vec<RawCategory>,
}

#[derive(Deserialize)]
struct RawCategory {
    title: String,
}

#[derive(Deserialize)]
struct RawDetail {
    #[serde(rename = "abstract", default)]
    abstract_text: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// Parse one `list=categorymembers` page into members and the next
/// continuation token.
pub fn parse_category_members(
    body: serde_json::Value,
) -> Result<(Vec<PageRef>, Option<String>), WikiError> {
    let parsed: CategoryMembersResponse = serde_json::from_value(body)?;
    let members = parsed
        .query
        .map(|q| q.categorymembers)
        .unwrap_or_default()
        .into_iter()
        .map(|m| PageRef {
            page_id: m.pageid,
            title: m.title,
        })
        .collect();
    let next = parsed.continuation.and_then(|c| c.cmcontinue);
    Ok((members, next))
}

/// Parse a `prop=categories` response into normalized category names per
/// page id. Pages keyed by a non-numeric or negative id (missing pages) are
/// skipped.
pub fn parse_page_categories(
    body: serde_json::Value,
) -> Result<HashMap<i64, Vec<String>>, WikiError> {
    let parsed: PageCategoriesResponse = serde_json::from_value(body)?;
    let pages = parsed.query.map(|q| q.pages).unwrap_or_default();

    Ok(pages
        .into_iter()
        .filter_map(|(key, page)| {
            let id = key.parse::<i64>().ok().filter(|id| *id > 0)?;
            let names = page
                .categories
                .iter()
                .filter_map(|c| normalize_wiki_category(&c.title))
                .collect();
            Some((id, names))
        })
        .collect())
}

/// Parse an `Articles/Details` response. Relative URLs are resolved against
/// the response `basepath`, or `base_url` when absent.
///
/// Fandom answers an empty lookup with `"items": []`, which yields an empty
/// map.
pub fn parse_article_details(
    body: serde_json::Value,
    base_url: &str,
) -> Result<HashMap<i64, ArticleDetail>, WikiError> {
    let basepath = body
        .get("basepath")
        .and_then(|v| v.as_str())
        .unwrap_or(base_url)
        .trim_end_matches('/')
        .to_string();

    let Some(items) = body.get("items").and_then(|v| v.as_object()) else {
        return Ok(HashMap::new());
    };

    let mut details = HashMap::with_capacity(items.len());
    for (key, value) in items {
        let Ok(id) = key.parse::<i64>() else { continue };
        let raw: RawDetail = serde_json::from_value(value.clone())?;
        let url = raw.url.map(|u| {
            if u.starts_with("http") {
                u
            } else {
                format!("{basepath}{u}")
            }
        });
        details.insert(
            id,
            ArticleDetail {
                abstract_text: raw.abstract_text.filter(|a| !a.is_empty()),
                thumbnail: raw.thumbnail,
                url,
            },
        );
    }
    Ok(details)
}

/// Group pages under the application category their wiki categories score
/// highest for. Pages without a match are dropped.
pub fn categorize_pages(
    members: Vec<PageRef>,
    page_categories: &mut HashMap<i64, Vec<String>>,
) -> CanonData {
    let mut data = CanonData::new();
    for member in members {
        let categories = page_categories.remove(&member.page_id).unwrap_or_default();
        if let Some(category) = categorize_article(&categories) {
            data.entry(category.to_string()).or_default().push(CanonItem {
                id: member.page_id,
                title: member.title,
                categories,
                ..Default::default()
            });
        }
    }
    data
}

/// Copy abstracts, thumbnails and URLs onto items. The thumbnail doubles as
/// the item's image.
pub fn enrich_items(items: &mut [CanonItem], details: &HashMap<i64, ArticleDetail>) {
    for item in items {
        if let Some(detail) = details.get(&item.id) {
            item.abstract_text = detail.abstract_text.clone();
            item.thumbnail = detail.thumbnail.clone();
            item.image_url = detail.thumbnail.clone();
            item.url = detail.url.clone();
        }
    }
}
