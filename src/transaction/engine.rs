//! Transaction engine.
//!
//! Drives one logical request through as many physical round trips as its
//! pager asks for:
//!
//! ```text
//! Idle -> Provisioning -> AwaitingCompletion -> Delivering -> Paging
//!                               ^                               |
//!                               +---------- more pages ---------+
//!                                                               |
//!                                              Cleanup -> Done / Failed
//! ```
//!
//! Cleanup (listener detach, worker return) runs whatever stage failed, and
//! also when the request future is dropped before it completes. Pages
//! delivered before a failure are not rolled back.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::result::Result as StdResult;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{BoxError, Error, Result};
use crate::gateway::Gateway;
use crate::identifiers::TransactionId;
use crate::provider::Provider;

use super::context::{Lease, RequestContext, StateTracker, TransactionState};
use super::page::Page;
use super::query::Query;

// ============================================================================
// Types
// ============================================================================

/// What a per-page callback returns. An error aborts the request.
pub type CallbackResult = StdResult<(), BoxError>;

/// Outcome of a completed logical request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransactionReport {
    /// Request identifier used in log lines.
    pub id: TransactionId,
    /// Round trips delivered to the callback.
    pub pages: usize,
    /// Records still owed, for count-driven pagers.
    pub remaining: Option<u64>,
}

/// Pages delivered and the pager's final remaining count.
type Delivered = (usize, Option<u64>);

// ============================================================================
// Transaction
// ============================================================================

/// Request/response entry point for one provider object.
///
/// Obtained from [`Gateway::transaction`]. Clones share the provider.
#[derive(Clone)]
pub struct Transaction {
    gateway: Gateway,
    provider: Arc<dyn Provider>,
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("gateway", &self.gateway)
            .finish_non_exhaustive()
    }
}

impl Transaction {
    /// Creates a transaction issuing requests on `provider`.
    #[must_use]
    pub fn new(gateway: Gateway, provider: Arc<dyn Provider>) -> Self {
        Self { gateway, provider }
    }

    /// The provider object requests are issued on.
    #[inline]
    #[must_use]
    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// The owning gateway.
    #[inline]
    #[must_use]
    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }
}

// ============================================================================
// Transaction - Suspending Form
// ============================================================================

impl Transaction {
    /// Sends `query`, calling `callback` once per page.
    ///
    /// Provider calls, the callback and the pager all run on a pooled
    /// worker thread. The caller only suspends.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] before anything is allocated
    /// - [`Error::PoolShuttingDown`] if no worker can be lent
    /// - [`Error::ProviderFault`] if the dib status is non-zero before a send
    /// - [`Error::Callback`] if `callback` fails
    /// - [`Error::ResponseTimeout`] if a response timeout is configured and hit
    /// - [`Error::WorkerStopped`] if the worker is torn down mid-request
    pub async fn send<Q, F>(&self, query: Q, callback: F) -> Result<TransactionReport>
    where
        Q: Query,
        F: FnMut(&Page<'_>) -> CallbackResult + Send + 'static,
    {
        let id = TransactionId::generate();
        let mut tracker = StateTracker::new(id);

        if !self.gateway.is_connected() {
            tracker.advance(TransactionState::Failed);
            return Err(Error::NotConnected);
        }

        tracker.advance(TransactionState::Provisioning);
        let (lease, ctx) = match self.provision().await {
            Ok(provisioned) => provisioned,
            Err(e) => return finish(&mut tracker, Err(e)),
        };
        debug!(
            transaction = %id,
            worker = %ctx.worker.name(),
            cookie = %ctx.cookie,
            "Request provisioned"
        );

        let outcome = self.run_paged(&ctx, &mut tracker, query, callback).await;

        tracker.advance(TransactionState::Cleanup);
        lease.release().await;

        finish(&mut tracker, outcome)
    }

    /// Sends `query` and discards the responses.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send).
    pub async fn submit<Q: Query>(&self, query: Q) -> Result<TransactionReport> {
        self.send(query, |_page: &Page<'_>| Ok(())).await
    }

    /// Lends a worker and attaches the completion listener.
    async fn provision(&self) -> Result<(Lease, RequestContext)> {
        let pool = self.gateway.pool();
        let worker = pool.get_async().await?;
        let mut lease = Lease::new(pool.clone(), worker);

        let attached = lease
            .worker()
            .on_async(Arc::clone(&self.provider), lease.signal().clone())
            .await;

        match attached {
            Ok(cookie) => {
                let ctx = lease.attach(cookie);
                Ok((lease, ctx))
            }
            Err(e) => {
                lease.release().await;
                Err(e)
            }
        }
    }

    async fn run_paged<Q, F>(
        &self,
        ctx: &RequestContext,
        tracker: &mut StateTracker,
        query: Q,
        mut callback: F,
    ) -> Result<Delivered>
    where
        Q: Query,
        F: FnMut(&Page<'_>) -> CallbackResult + Send + 'static,
    {
        let kind = self.gateway.options().limit_kind;
        let mut pager = query.pager();

        let provider = Arc::clone(&self.provider);
        ctx.worker
            .invoke_async(move || query.serialize(&*provider))
            .await?;

        let mut pages = 0usize;
        loop {
            tracker.advance(TransactionState::AwaitingCompletion);
            self.gateway.rate_limiter().wait_until_available(kind).await;

            ctx.signal.reset();
            let provider = Arc::clone(&self.provider);
            ctx.worker
                .invoke_async(move || issue(&*provider, false))
                .await?;
            self.await_response(ctx).await?;

            tracker.advance(TransactionState::Delivering);
            let provider = Arc::clone(&self.provider);
            let index = pages;
            callback = ctx
                .worker
                .invoke_async(move || {
                    callback(&Page::new(&*provider, index)).map_err(|e| Error::callback(index, e))?;
                    Ok(callback)
                })
                .await?;
            pages += 1;

            tracker.advance(TransactionState::Paging);
            let provider = Arc::clone(&self.provider);
            let (returned, more) = ctx
                .worker
                .invoke_async(move || {
                    let more = pager.has_more(&*provider)?;
                    Ok((pager, more))
                })
                .await?;
            pager = returned;

            if !more {
                return Ok((pages, pager.remaining()));
            }
        }
    }

    /// Waits for the listener to fire. A detached listener means the worker
    /// exited and no response will come.
    async fn await_response(&self, ctx: &RequestContext) -> Result<()> {
        let signal = &ctx.signal;
        match self.gateway.options().response_timeout_ms {
            Some(ms) => {
                if !signal.wait_timeout(Duration::from_millis(ms)).await {
                    return Err(Error::response_timeout(ms));
                }
            }
            None => signal.wait().await,
        }

        if signal.is_set() {
            Ok(())
        } else {
            warn!(worker = %ctx.worker.name(), cookie = %ctx.cookie, "Listener detached while awaiting response");
            Err(Error::worker_stopped(ctx.worker.name()))
        }
    }
}

// ============================================================================
// Transaction - Blocking Form
// ============================================================================

impl Transaction {
    /// Sends `query` on the calling thread, calling `callback` once per page.
    ///
    /// Uses the provider's synchronous request entry point and bypasses the
    /// worker pool, so the calling thread must be allowed to call the
    /// provider. Must not be called from inside an async task.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send), minus pool and timeout errors.
    pub fn blocking_send<Q, F>(&self, query: Q, mut callback: F) -> Result<TransactionReport>
    where
        Q: Query,
        F: FnMut(&Page<'_>) -> CallbackResult,
    {
        let id = TransactionId::generate();
        let mut tracker = StateTracker::new(id);

        if !self.gateway.is_connected() {
            tracker.advance(TransactionState::Failed);
            return Err(Error::NotConnected);
        }

        let outcome = self.run_blocking(&mut tracker, &query, &mut callback);
        finish(&mut tracker, outcome)
    }

    /// Blocking variant of [`submit`](Self::submit).
    ///
    /// # Errors
    ///
    /// Same as [`blocking_send`](Self::blocking_send).
    pub fn blocking_submit<Q: Query>(&self, query: Q) -> Result<TransactionReport> {
        self.blocking_send(query, |_page: &Page<'_>| Ok(()))
    }

    fn run_blocking<Q, F>(
        &self,
        tracker: &mut StateTracker,
        query: &Q,
        callback: &mut F,
    ) -> Result<Delivered>
    where
        Q: Query,
        F: FnMut(&Page<'_>) -> CallbackResult,
    {
        let provider = &*self.provider;
        let kind = self.gateway.options().limit_kind;
        let limiter = self.gateway.rate_limiter();

        tracker.advance(TransactionState::Provisioning);
        query.serialize(provider)?;
        let mut pager = query.pager();

        let mut pages = 0usize;
        loop {
            tracker.advance(TransactionState::AwaitingCompletion);
            limiter.block_until_available(kind);
            issue(provider, true)?;

            tracker.advance(TransactionState::Delivering);
            callback(&Page::new(provider, pages)).map_err(|e| Error::callback(pages, e))?;
            pages += 1;

            tracker.advance(TransactionState::Paging);
            if !pager.has_more(provider)? {
                return Ok((pages, pager.remaining()));
            }
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Checks the dib status, then issues one physical round trip.
fn issue(provider: &dyn Provider, blocking: bool) -> Result<()> {
    let status = provider.dib_status();
    if status != 0 {
        warn!(status, "Provider fault before send");
        return Err(Error::provider_fault(status));
    }

    if blocking {
        provider.block_request()
    } else {
        provider.request()
    }
}

fn finish(tracker: &mut StateTracker, outcome: Result<Delivered>) -> Result<TransactionReport> {
    let id = tracker.id();
    match outcome {
        Ok((pages, remaining)) => {
            tracker.advance(TransactionState::Done);
            debug!(transaction = %id, pages, "Transaction complete");
            Ok(TransactionReport {
                id,
                pages,
                remaining,
            })
        }
        Err(e) => {
            let stage = tracker.state();
            tracker.advance(TransactionState::Failed);
            debug!(transaction = %id, stage = %stage, error = %e, "Transaction failed");
            Err(e)
        }
    }
}
