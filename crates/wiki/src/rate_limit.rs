//! Token-bucket limiter shared by every request a wiki client makes.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};

/// Default number of wiki calls allowed per period.
pub const DEFAULT_CALLS: u32 = 150;

/// Default replenish period.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(60);

/// Allows `calls` requests per `period`, with the full allowance available
/// as an initial burst.
pub struct WikiRateLimiter {
    limiter: DefaultDirectRateLimiter,
    calls: NonZeroU32,
    period: Duration,
}

impl WikiRateLimiter {
    pub fn new(calls: u32, period: Duration) -> Self {
        let calls = NonZeroU32::new(calls).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(period / calls.get())
            .unwrap_or_else(|| Quota::per_second(calls))
            .allow_burst(calls);

        Self {
            limiter: RateLimiter::direct(quota),
            calls,
            period,
        }
    }

    /// Wait until a call may be made.
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }

    /// Take a token if one is available right now.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }

    pub fn calls(&self) -> u32 {
        self.calls.get()
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Default for WikiRateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_CALLS, DEFAULT_PERIOD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_is_capped_at_calls() {
        let limiter = WikiRateLimiter::new(3, Duration::from_secs(60));
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[test]
    fn zero_calls_is_clamped_to_one() {
        let limiter = WikiRateLimiter::new(0, Duration::from_secs(60));
        assert_eq!(limiter.calls(), 1);
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[tokio::test]
    async fn acquire_returns_while_tokens_remain() {
        let limiter = WikiRateLimiter::default();
        for _ in 0..10 {
            limiter.acquire().await;
        }
        assert_eq!(limiter.period(), DEFAULT_PERIOD);
    }
}
