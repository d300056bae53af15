//! Time-to-live rules shared by the file and database cache tiers.

use chrono::Duration;
use serde::Serialize;

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default lifetime of cached canon data (file tier and `wiki_articles`).
pub const DEFAULT_TTL_DAYS: i64 = 7;

/// Downloaded image files older than this are removed by cleanup.
pub const IMAGE_FILE_MAX_AGE_DAYS: i64 = 30;

/// Lifetime of a single cached article file.
pub const ARTICLE_FILE_VALIDITY_HOURS: i64 = 168;

/// Compute an expiry timestamp `days` after `now`.
pub fn expires_at(now: Timestamp, days: i64) -> Timestamp {
    now + Duration::days(days)
}

/// Whether an entry expiring at `expires_at` is stale at `now`.
pub fn is_expired(expires_at: Timestamp, now: Timestamp) -> bool {
    now >= expires_at
}

/// Age information reported by cache stats endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheAge {
    pub age_hours: f64,
    pub remaining_hours: f64,
    pub expired: bool,
}

impl CacheAge {
    /// Derive age and remaining lifetime from creation and expiry timestamps.
    ///
    /// Values are rounded to one decimal place; `remaining_hours` never goes
    /// negative.
    pub fn compute(created_at: Timestamp, expires_at: Timestamp, now: Timestamp) -> Self {
        let age = (now - created_at).num_seconds() as f64 / 3600.0;
        let remaining = (expires_at - now).num_seconds() as f64 / 3600.0;
        Self {
            age_hours: round1(age.max(0.0)),
            remaining_hours: round1(remaining.max(0.0)),
            expired: is_expired(expires_at, now),
        }
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
