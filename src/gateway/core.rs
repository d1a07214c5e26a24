//! Owning context for one provider connection.
//!
//! A [`Gateway`] ties one worker pool and one rate limiter to the lifetime
//! of one session. Every [`Transaction`] created from it shares both.
//!
//! # Example
//!
//! ```ignore
//! let gateway = Gateway::builder().session(session).build()?;
//!
//! gateway
//!     .scoped(|gw| async move {
//!         let tx = gw.transaction(chart);
//!         tx.submit(query).await?;
//!         Ok(())
//!     })
//!     .await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::Result;
use crate::pool::WorkerPool;
use crate::provider::{Provider, Session};
use crate::rate_limit::RateLimiter;
use crate::transaction::Transaction;

use super::builder::GatewayBuilder;
use super::options::GatewayOptions;

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for the gateway.
struct GatewayInner {
    /// Provider connection status and counters.
    session: Arc<dyn Session>,
    /// Workers lent to transactions.
    pool: WorkerPool,
    /// Call budget gate.
    limiter: RateLimiter,
    /// Settings the gateway was built with.
    options: GatewayOptions,
}

// ============================================================================
// Gateway
// ============================================================================

/// Handle to a pool and rate limiter bound to one provider session.
///
/// Clones share the same pool.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<GatewayInner>,
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway")
            .field("pool", &self.inner.pool)
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Gateway - Construction & Accessors
// ============================================================================

impl Gateway {
    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::new()
    }

    pub(crate) fn new(session: Arc<dyn Session>, options: GatewayOptions) -> Self {
        let pool = WorkerPool::workers(options.max_workers, options.worker_prefix.clone());
        let limiter = RateLimiter::with_min_backoff(Arc::clone(&session), options.min_backoff());

        info!(
            max_workers = options.max_workers,
            limit_kind = %options.limit_kind,
            "Gateway created"
        );

        Self {
            inner: Arc::new(GatewayInner {
                session,
                pool,
                limiter,
                options,
            }),
        }
    }

    /// Creates a transaction issuing requests on `provider`.
    #[must_use]
    pub fn transaction(&self, provider: Arc<dyn Provider>) -> Transaction {
        Transaction::new(self.clone(), provider)
    }

    /// The worker pool.
    #[inline]
    #[must_use]
    pub fn pool(&self) -> &WorkerPool {
        &self.inner.pool
    }

    /// The rate limiter.
    #[inline]
    #[must_use]
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.inner.limiter
    }

    /// The provider session.
    #[inline]
    #[must_use]
    pub fn session(&self) -> &Arc<dyn Session> {
        &self.inner.session
    }

    /// Settings the gateway was built with.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &GatewayOptions {
        &self.inner.options
    }

    /// Reads the session's live connection state.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.session.is_connected()
    }
}

// ============================================================================
// Gateway - Shutdown
// ============================================================================

impl Gateway {
    /// Shuts the worker pool down. See [`ResourcePool::shutdown`].
    ///
    /// Must not be called from inside an async task.
    ///
    /// [`ResourcePool::shutdown`]: crate::pool::ResourcePool::shutdown
    pub fn shutdown(&self, force: bool) {
        self.inner.pool.shutdown(force);
    }

    /// Suspending variant of [`shutdown`](Self::shutdown).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Join`](crate::Error::Join) if the background task failed.
    pub async fn shutdown_async(&self, force: bool) -> Result<()> {
        self.inner.pool.shutdown_async(force).await
    }

    /// Runs `body` with this gateway, then shuts the pool down.
    ///
    /// Shutdown is forced when `body` returns an error, graceful otherwise.
    ///
    /// # Errors
    ///
    /// Returns the body's error, or the shutdown error if the body succeeded.
    pub async fn scoped<F, Fut, R>(&self, body: F) -> Result<R>
    where
        F: FnOnce(Gateway) -> Fut,
        Fut: Future<Output = Result<R>>,
    {
        let result = body(self.clone()).await;
        let shutdown = self.shutdown_async(result.is_err()).await;

        match (result, shutdown) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), shutdown) => {
                if let Err(shutdown_err) = shutdown {
                    warn!(error = %shutdown_err, "Shutdown after failed scope also failed");
                }
                Err(e)
            }
        }
    }
}
