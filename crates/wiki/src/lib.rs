//! Fandom/MediaWiki client library.
//!
//! Provides the rate-limited wiki API client that builds [`CanonData`],
//! the on-disk image fetcher, and the [`CanonSource`] seam the cache layer
//! pulls fresh data through.
//!
//! [`CanonData`]: loreforge_core::canon::CanonData
//! [`CanonSource`]: source::CanonSource

pub mod client;
pub mod error;
pub mod image;
pub mod rate_limit;
pub mod source;

pub use error::WikiError;
