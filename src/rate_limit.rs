//! Call-budget rate limiter.
//!
//! Wraps the provider's per-category remaining-call counter and
//! time-to-reset. Nothing is cached: every check re-reads the session, so
//! concurrent waiters race on the provider's own counter, which stays
//! authoritative.
//!
//! # Example
//!
//! ```ignore
//! let limiter = RateLimiter::new(session);
//!
//! limiter.wait_until_available(LimitKind::NonTrade).await;
//! provider.request()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, trace};

use crate::provider::{LimitKind, Session};

// ============================================================================
// Constants
// ============================================================================

/// Default floor for each backoff sleep, in milliseconds.
pub const DEFAULT_MIN_BACKOFF_MS: u64 = 10;

// ============================================================================
// RateLimiter
// ============================================================================

/// Defers requests until the provider's call budget allows them.
///
/// The wait is unbounded: the provider resets its counters periodically.
#[derive(Clone)]
pub struct RateLimiter {
    session: Arc<dyn Session>,
    min_backoff: Duration,
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("min_backoff", &self.min_backoff)
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    /// Creates a limiter reading `session` with the default backoff floor.
    #[must_use]
    pub fn new(session: Arc<dyn Session>) -> Self {
        Self::with_min_backoff(session, Duration::from_millis(DEFAULT_MIN_BACKOFF_MS))
    }

    /// Creates a limiter with a custom floor for each sleep.
    ///
    /// The provider may report 0 ms to reset while the count is still 0;
    /// the floor keeps the wait loop from spinning.
    #[must_use]
    pub fn with_min_backoff(session: Arc<dyn Session>, min_backoff: Duration) -> Self {
        Self {
            session,
            min_backoff,
        }
    }

    /// Calls left in the current window for `kind`.
    #[inline]
    #[must_use]
    pub fn remaining_calls(&self, kind: LimitKind) -> i64 {
        self.session.limit_remain_count(kind)
    }

    /// Milliseconds until the window for `kind` resets.
    #[inline]
    #[must_use]
    pub fn remaining_millis(&self, kind: LimitKind) -> u64 {
        self.session.limit_remain_time(kind)
    }

    /// Suspends until at least one call of `kind` is available.
    ///
    /// Returns immediately when the budget is positive.
    pub async fn wait_until_available(&self, kind: LimitKind) {
        let mut waited = 0u32;
        while self.remaining_calls(kind) <= 0 {
            let delay = self.backoff(kind);
            trace!(
                kind = %kind,
                delay_ms = whole_millis(delay),
                "Call budget exhausted, sleeping"
            );
            tokio::time::sleep(delay).await;
            waited += 1;
        }
        if waited > 0 {
            debug!(kind = %kind, rounds = waited, "Call budget available again");
        }
    }

    /// Blocks the calling thread until at least one call of `kind` is
    /// available.
    ///
    /// Must not be called from inside an async task.
    pub fn block_until_available(&self, kind: LimitKind) {
        let mut waited = 0u32;
        while self.remaining_calls(kind) <= 0 {
            let delay = self.backoff(kind);
            trace!(
                kind = %kind,
                delay_ms = whole_millis(delay),
                "Call budget exhausted, sleeping"
            );
            thread::sleep(delay);
            waited += 1;
        }
        if waited > 0 {
            debug!(kind = %kind, rounds = waited, "Call budget available again");
        }
    }

    fn backoff(&self, kind: LimitKind) -> Duration {
        Duration::from_millis(self.remaining_millis(kind)).max(self.min_backoff)
    }
}

/// Milliseconds in `delay`, saturating at `u64::MAX`.
#[inline]
fn whole_millis(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// Tests
// ============================================================================
