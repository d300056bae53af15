//! Where fresh canon data comes from.

use std::sync::Arc;

use async_trait::async_trait;
use loreforge_core::canon::CanonData;
use loreforge_core::universe::universe_config;

use crate::client::WikiClient;
use crate::error::WikiError;
use crate::rate_limit::WikiRateLimiter;

/// Produces a full categorized dataset for a universe.
///
/// The cache layer only depends on this trait, so tests can substitute a
/// fixed dataset for the live wiki.
#[async_trait]
pub trait CanonSource: Send + Sync {
    async fn fetch_canonical_data(
        &self,
        universe: &str,
        max_workers: usize,
    ) -> Result<CanonData, WikiError>;
}

/// [`CanonSource`] backed by the live Fandom wikis.
///
/// One HTTP client and one rate limiter are shared by every universe.
pub struct WikiCanonSource {
    http: reqwest::Client,
    rate_limiter: Arc<WikiRateLimiter>,
}

impl WikiCanonSource {
    pub fn new(http: reqwest::Client, rate_limiter: Arc<WikiRateLimiter>) -> Self {
        Self { http, rate_limiter }
    }

    /// Client for a single universe.
    pub fn client(&self, universe: &str) -> Result<WikiClient, WikiError> {
        let config = universe_config(universe)?;
        Ok(WikiClient::new(
            config,
            self.http.clone(),
            Arc::clone(&self.rate_limiter),
        ))
    }
}

#[async_trait]
impl CanonSource for WikiCanonSource {
    async fn fetch_canonical_data(
        &self,
        universe: &str,
        max_workers: usize,
    ) -> Result<CanonData, WikiError> {
        self.client(universe)?.fetch_canonical_data(max_workers).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_universe_is_rejected() {
        let source = WikiCanonSource::new(reqwest::Client::new(), Arc::new(WikiRateLimiter::default()));
        assert!(matches!(
            source.client("discworld"),
            Err(WikiError::UnsupportedUniverse(_))
        ));
        assert_eq!(source.client("lotr").unwrap().universe().name, "The One Wiki to Rule Them All");
    }
}
