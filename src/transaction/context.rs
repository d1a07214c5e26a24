//! Per-request bookkeeping.

use std::fmt;

use serde::Serialize;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::identifiers::{Cookie, TransactionId};
use crate::pool::WorkerPool;
use crate::worker::Worker;

use super::signal::CompletionSignal;

// ============================================================================
// RequestContext
// ============================================================================

/// Resources held while a logical request is in flight.
///
/// Produced by provisioning, consumed by cleanup.
#[derive(Debug)]
pub struct RequestContext {
    /// Worker lent by the pool.
    pub worker: Worker,
    /// Set by the listener when a response is ready.
    pub signal: CompletionSignal,
    /// Listener registration on `worker`.
    pub cookie: Cookie,
}

// ============================================================================
// Lease
// ============================================================================

/// A worker lent to one request, returned to its pool exactly once.
///
/// [`release`](Self::release) detaches the listener and returns the worker.
/// Dropping an unreleased lease (the request future was cancelled) does the
/// same in the background: on the current runtime if there is one,
/// otherwise inline.
pub(crate) struct Lease {
    pool: WorkerPool,
    worker: Worker,
    signal: CompletionSignal,
    cookie: Option<Cookie>,
    released: bool,
}

impl Lease {
    pub(crate) fn new(pool: WorkerPool, worker: Worker) -> Self {
        Self {
            pool,
            worker,
            signal: CompletionSignal::new(),
            cookie: None,
            released: false,
        }
    }

    #[inline]
    pub(crate) fn worker(&self) -> &Worker {
        &self.worker
    }

    #[inline]
    pub(crate) fn signal(&self) -> &CompletionSignal {
        &self.signal
    }

    /// Records the listener registration and returns the request's context.
    pub(crate) fn attach(&mut self, cookie: Cookie) -> RequestContext {
        self.cookie = Some(cookie);
        RequestContext {
            worker: self.worker.clone(),
            signal: self.signal.clone(),
            cookie,
        }
    }

    /// Detaches the listener, then returns the worker. Never fails.
    pub(crate) async fn release(mut self) {
        if let Some(cookie) = self.cookie {
            log_detach(&self.worker, cookie, self.worker.off_async(cookie).await);
        }
        // Cancelled before this point, the drop path redoes both steps.
        self.released = true;
        give_back(&self.pool, self.worker.clone());
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        warn!(worker = %self.worker.name(), "Request dropped in flight, releasing worker");

        let pool = self.pool.clone();
        let worker = self.worker.clone();
        let cookie = self.cookie;
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Some(cookie) = cookie {
                        log_detach(&worker, cookie, worker.off_async(cookie).await);
                    }
                    give_back(&pool, worker);
                });
            }
            Err(_) => {
                if let Some(cookie) = cookie {
                    log_detach(&worker, cookie, worker.off(cookie));
                }
                give_back(&pool, worker);
            }
        }
    }
}

fn log_detach(worker: &Worker, cookie: Cookie, outcome: Result<bool>) {
    match outcome {
        Ok(true) => {}
        // Exiting workers detach everything themselves.
        Err(Error::WorkerStopped { .. }) => {
            debug!(worker = %worker.name(), cookie = %cookie, "Worker stopped, listener already detached");
        }
        Ok(false) => {
            warn!(worker = %worker.name(), cookie = %cookie, "Listener was already detached");
        }
        Err(e) => {
            warn!(worker = %worker.name(), cookie = %cookie, error = %e, "Failed to detach listener");
        }
    }
}

fn give_back(pool: &WorkerPool, worker: Worker) {
    if let Err(e) = pool.put(worker) {
        warn!(error = %e, "Failed to return worker to pool");
    }
}

// ============================================================================
// TransactionState
// ============================================================================

/// Stage of a logical request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
    Idle,
    Provisioning,
    AwaitingCompletion,
    Delivering,
    Paging,
    Cleanup,
    Done,
    Failed,
}

impl TransactionState {
    /// Returns `true` for `Done` and `Failed`.
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Provisioning => "provisioning",
            Self::AwaitingCompletion => "awaiting_completion",
            Self::Delivering => "delivering",
            Self::Paging => "paging",
            Self::Cleanup => "cleanup",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Current state of one logical request, logging each transition.
#[derive(Debug)]
pub(crate) struct StateTracker {
    id: TransactionId,
    state: TransactionState,
}

impl StateTracker {
    pub(crate) fn new(id: TransactionId) -> Self {
        Self {
            id,
            state: TransactionState::Idle,
        }
    }

    #[inline]
    pub(crate) fn id(&self) -> TransactionId {
        self.id
    }

    #[inline]
    pub(crate) fn state(&self) -> TransactionState {
        self.state
    }

    pub(crate) fn advance(&mut self, next: TransactionState) {
        debug!(transaction = %self.id, from = %self.state, to = %next, "Transaction state");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreleased_lease_returns_worker_on_drop() {
        let pool = WorkerPool::workers(1, "lease");
        let worker = pool.get().unwrap();

        let lease = Lease::new(pool.clone(), worker.clone());
        assert_eq!(pool.in_use_count(), 1);
        drop(lease);

        assert_eq!(pool.in_use_count(), 0);
        assert_eq!(pool.get().unwrap(), worker);
        pool.shutdown(true);
    }

    #[test]
    fn test_tracker_starts_idle() {
        let mut tracker = StateTracker::new(TransactionId::generate());
        assert_eq!(tracker.state(), TransactionState::Idle);

        tracker.advance(TransactionState::Provisioning);
        assert_eq!(tracker.state(), TransactionState::Provisioning);
        assert!(!tracker.state().is_terminal());

        tracker.advance(TransactionState::Failed);
        assert!(tracker.state().is_terminal());
    }

    #[test]
    fn test_state_display_matches_serde() {
        let state = TransactionState::AwaitingCompletion;
        assert_eq!(
            serde_json::to_string(&state).unwrap(),
            format!("\"{state}\"")
        );
    }
}
