//! Progress model for the staged startup prefetch.
//!
//! The prefetch orchestrator in `loreforge-cache` owns a single
//! [`PrefetchProgress`] behind a lock and mutates it as stages advance; the
//! status endpoint serializes a clone of it.

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

/// `scraping_logs.operation_type` recorded for a full prefetch run.
pub const OPERATION_STARTUP_PREFETCH: &str = "startup_prefetch_all";

/// Rows written per `bulk_upsert` batch.
pub const UPSERT_BATCH_SIZE: usize = 500;

/// Default number of concurrent image downloads.
pub const DEFAULT_IMAGE_WORKERS: usize = 20;

/// Default cap on images fetched per visual category.
pub const DEFAULT_IMAGE_LIMIT_PER_CATEGORY: i64 = 5000;

/// Non-fatal error messages beyond this count are counted but not kept.
pub const MAX_RECORDED_ERRORS: usize = 100;

/// Stage of a prefetch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PrefetchStage {
    #[default]
    Idle,
    FetchingViaApi,
    WritingToPostgresql,
    PrefetchingImages,
    Complete,
    Failed,
}

impl PrefetchStage {
    /// Wire name of the stage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::FetchingViaApi => "fetching_via_api",
            Self::WritingToPostgresql => "writing_to_postgresql",
            Self::PrefetchingImages => "prefetching_images",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }

    /// Whether the run has reached a final stage.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

impl std::fmt::Display for PrefetchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a prefetch run, as reported by `GET /prefetch/status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrefetchProgress {
    pub stage: PrefetchStage,
    pub universe: Option<String>,
    pub articles_total: i64,
    pub articles_processed: i64,
    pub articles_created: i64,
    pub articles_updated: i64,
    pub images_total: i64,
    pub images_downloaded: i64,
    pub images_cached: i64,
    pub images_failed: i64,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub errors: Vec<String>,
    /// Every error of the run, including those not kept in `errors`.
    pub errors_count: i64,
    pub log_id: Option<DbId>,
    pub is_running: bool,
    pub is_complete: bool,
}

impl PrefetchProgress {
    /// Reset counters and mark a new run as started.
    pub fn begin(&mut self, universe: &str, now: Timestamp) {
        *self = Self {
            universe: Some(universe.to_string()),
            started_at: Some(now),
            is_running: true,
            ..Self::default()
        };
    }

    /// Move to the next stage.
    pub fn enter(&mut self, stage: PrefetchStage) {
        self.stage = stage;
    }

    /// Record a non-fatal error, keeping at most [`MAX_RECORDED_ERRORS`]
    /// messages.
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.errors_count += 1;
        if self.errors.len() < MAX_RECORDED_ERRORS {
            self.errors.push(message.into());
        }
    }

    /// Mark the run as successfully finished.
    pub fn finish(&mut self, now: Timestamp) {
        self.stage = PrefetchStage::Complete;
        self.completed_at = Some(now);
        self.is_running = false;
        self.is_complete = true;
    }

    /// Mark the run as failed with a fatal error.
    ///
    /// The fatal message is always kept, even past the recording cap.
    pub fn fail(&mut self, message: impl Into<String>, now: Timestamp) {
        self.errors_count += 1;
        self.errors.push(message.into());
        self.stage = PrefetchStage::Failed;
        self.completed_at = Some(now);
        self.is_running = false;
        self.is_complete = false;
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn stage_serializes_snake_case() {
        let json = serde_json::to_string(&PrefetchStage::WritingToPostgresql).unwrap();
        assert_eq!(json, "\"writing_to_postgresql\"");
        assert_eq!(PrefetchStage::FetchingViaApi.to_string(), "fetching_via_api");
    }

    #[test]
    fn begin_resets_previous_run() {
        let mut p = PrefetchProgress {
            articles_created: 12,
            errors: vec!["old".into()],
            is_complete: true,
            ..Default::default()
        };
        p.begin("star_wars", Utc::now());
        assert_eq!(p.articles_created, 0);
        assert!(p.errors.is_empty());
        assert!(p.is_running);
        assert!(!p.is_complete);
        assert_eq!(p.stage, PrefetchStage::Idle);
        assert_eq!(p.universe.as_deref(), Some("star_wars"));
    }

    #[test]
    fn finish_and_fail_are_terminal() {
        let mut p = PrefetchProgress::default();
        p.begin("lotr", Utc::now());
        p.finish(Utc::now());
        assert!(p.is_complete && !p.is_running);
        assert!(p.stage.is_terminal());

        p.begin("lotr", Utc::now());
        p.fail("boom", Utc::now());
        assert_eq!(p.stage, PrefetchStage::Failed);
        assert!(!p.is_complete);
        assert_eq!(p.errors, vec!["boom".to_string()]);
    }

    #[test]
    fn recorded_errors_are_bounded() {
        let mut p = PrefetchProgress::default();
        for i in 0..(MAX_RECORDED_ERRORS + 10) {
            p.record_error(format!("e{i}"));
        }
        assert_eq!(p.errors.len(), MAX_RECORDED_ERRORS);
        assert_eq!(p.errors_count, MAX_RECORDED_ERRORS as i64 + 10);
    }

    #[test]
    fn fatal_error_is_kept_past_the_cap() {
        let mut p = PrefetchProgress::default();
        p.begin("star_wars", Utc::now());
        for i in 0..MAX_RECORDED_ERRORS {
            p.record_error(format!("e{i}"));
        }
        p.fail("cancelled", Utc::now());

        assert_eq!(p.errors.last().map(String::as_str), Some("cancelled"));
        assert_eq!(p.errors_count, MAX_RECORDED_ERRORS as i64 + 1);
    }
}
