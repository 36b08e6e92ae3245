// ── Outbound rate limiting ──
//
// GCRA limiter shared by every site task of one orchestration. Injected
// into the orchestrator; there is no process-wide limiter.

use std::fmt;
use std::num::NonZeroU32;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota};
use tracing::trace;

use crate::config::RateLimitConfig;

/// `burst` calls may go out back to back, after which calls are admitted
/// at `per_second`.
pub struct RateLimiter {
    inner: DefaultDirectRateLimiter,
    per_second: f64,
    burst: NonZeroU32,
}

impl RateLimiter {
    /// `None` unless `per_second` is positive and finite. A `burst` of
    /// zero is raised to one.
    pub fn new(per_second: f64, burst: u32) -> Option<Self> {
        if !per_second.is_finite() || per_second <= 0.0 {
            return None;
        }
        let period = Duration::try_from_secs_f64(per_second.recip()).ok()?;
        let burst = NonZeroU32::new(burst).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(period)?.allow_burst(burst);
        Some(Self {
            inner: governor::RateLimiter::direct(quota),
            per_second,
            burst,
        })
    }

    /// `None` when the configured rate disables throttling.
    pub fn from_config(config: &RateLimitConfig) -> Option<Self> {
        Self::new(config.per_second, config.burst)
    }

    /// Take a token if one is available right now.
    pub fn try_acquire(&self) -> bool {
        self.inner.check().is_ok()
    }

    /// Wait until a token is available, then take it.
    pub async fn acquire(&self) {
        if self.try_acquire() {
            return;
        }
        trace!(per_second = self.per_second, "rate limited");
        self.inner.until_ready().await;
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("per_second", &self.per_second)
            .field("burst", &self.burst)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Instant;

    use super::*;

    #[tokio::test]
    async fn allows_burst_then_throttles() {
        let limiter = RateLimiter::new(10.0, 3).unwrap();

        for _ in 0..3 {
            assert!(limiter.try_acquire());
        }
        assert!(!limiter.try_acquire());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(limiter.try_acquire());
    }

    #[tokio::test]
    async fn acquire_waits_for_refill() {
        let limiter = RateLimiter::new(20.0, 1).unwrap();
        let start = Instant::now();

        limiter.acquire().await;
        limiter.acquire().await;

        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn unusable_rates_build_nothing() {
        for rate in [0.0, -2.0, f64::NAN, f64::INFINITY] {
            assert!(RateLimiter::new(rate, 5).is_none(), "{rate} accepted");
        }
    }

    #[test]
    fn zero_rate_disables_throttling() {
        let disabled = RateLimitConfig {
            per_second: 0.0,
            burst: 5,
        };
        assert!(RateLimiter::from_config(&disabled).is_none());

        let enabled = RateLimitConfig {
            per_second: 1.5,
            burst: 0,
        };
        let limiter = RateLimiter::from_config(&enabled);
        assert!(limiter.is_some_and(|l| l.burst.get() == 1));
    }
}
