//! Hybrid canon content cache.
//!
//! Two tiers back every read: PostgreSQL (`wiki_articles` and friends) and
//! JSON files on disk. [`unified::UnifiedCache`] falls back from one tier to
//! the next and finally to the live wiki. [`prefetch::PrefetchService`]
//! warms both tiers in the background.

pub mod article_file;
pub mod canon_file;
pub mod error;
pub mod hybrid;
pub mod prefetch;
pub mod unified;

pub use error::CacheError;
