//! Reusable completion signal.
//!
//! Set from the worker thread when the provider reports data ready, awaited
//! by the transaction. Reset before every round trip so one listener
//! registration serves all pages of a logical request.
//!
//! The signal doubles as the listener itself: it is set on a received event
//! and closed when its subscription is detached. A closed signal releases
//! waiters for good, so a request whose worker exits stops waiting.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::pin::pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;

use crate::provider::EventSink;

// ============================================================================
// CompletionSignal
// ============================================================================

struct SignalInner {
    fired: AtomicBool,
    /// Subscription gone; never cleared.
    closed: AtomicBool,
    notify: Notify,
}

/// Level-triggered event shared between a listener and its waiter.
#[derive(Clone)]
pub struct CompletionSignal {
    inner: Arc<SignalInner>,
}

impl Default for CompletionSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CompletionSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionSignal")
            .field("set", &self.is_set())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl CompletionSignal {
    /// Creates an unset signal.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SignalInner {
                fired: AtomicBool::new(false),
                closed: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    /// Sets the signal and wakes every waiter.
    pub fn set(&self) {
        self.inner.fired.store(true, Ordering::Release);
        self.inner.notify.notify_waiters();
    }

    /// Closes the signal and wakes every waiter. Not undone by `reset`.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        self.inner.notify.notify_waiters();
    }

    /// Clears the signal.
    #[inline]
    pub fn reset(&self) {
        self.inner.fired.store(false, Ordering::Release);
    }

    /// Returns `true` if the signal is set.
    #[inline]
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.inner.fired.load(Ordering::Acquire)
    }

    /// Returns `true` once the signal has been closed.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Waits until the signal is set or closed. Returns at once if it
    /// already is; check [`is_set`](Self::is_set) to tell the two apart.
    pub async fn wait(&self) {
        loop {
            let mut notified = pin!(self.inner.notify.notified());
            // Register before checking so a concurrent `set` is not missed.
            notified.as_mut().enable();
            if self.is_set() || self.is_closed() {
                return;
            }
            notified.await;
        }
    }

    /// Waits at most `timeout`. Returns `false` on timeout.
    pub async fn wait_timeout(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.wait()).await.is_ok()
    }
}

impl EventSink for CompletionSignal {
    fn on_received(&mut self) {
        self.set();
    }

    fn on_detached(&mut self) {
        self.close();
    }
}

// ============================================================================
// Tests
// ============================================================================
