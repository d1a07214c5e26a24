//! Event listener contracts and the worker-bound event port.
//!
//! A provider delivers its callbacks through an [`EventPort`]. Posting is
//! allowed from any thread; the worker that owns the port dispatches each
//! event to its [`EventSink`] on the worker's own thread.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use tokio::sync::mpsc;
use tracing::trace;

use crate::identifiers::{Cookie, WorkerId};

// ============================================================================
// Types
// ============================================================================

/// Notification kinds a provider can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A response is ready to be read.
    Received,
}

/// One event posted by a provider to a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderEvent {
    /// Registration the event is addressed to.
    pub cookie: Cookie,
    /// What happened.
    pub kind: EventKind,
}

// ============================================================================
// EventSink
// ============================================================================

/// Listener bound to one provider subscription.
///
/// Always invoked on the worker thread that registered it.
pub trait EventSink: Send + 'static {
    /// Called when the provider reports that data is ready.
    fn on_received(&mut self);

    /// Called once when the subscription is detached, either by `off` or
    /// because the worker exited. No events follow.
    fn on_detached(&mut self) {}
}

impl<F> EventSink for F
where
    F: FnMut() + Send + 'static,
{
    fn on_received(&mut self) {
        self()
    }
}

// ============================================================================
// EventPort
// ============================================================================

/// Handle a provider uses to post events to one worker registration.
#[derive(Clone)]
pub struct EventPort {
    worker: WorkerId,
    cookie: Cookie,
    tx: mpsc::UnboundedSender<ProviderEvent>,
}

impl EventPort {
    /// Creates a port for `cookie` on the worker owning `tx`.
    pub(crate) fn new(
        worker: WorkerId,
        cookie: Cookie,
        tx: mpsc::UnboundedSender<ProviderEvent>,
    ) -> Self {
        Self { worker, cookie, tx }
    }

    /// Worker this port delivers to.
    #[inline]
    #[must_use]
    pub fn worker(&self) -> WorkerId {
        self.worker
    }

    /// Registration this port delivers to.
    #[inline]
    #[must_use]
    pub fn cookie(&self) -> Cookie {
        self.cookie
    }

    /// Posts an event. Returns `false` if the worker has exited.
    pub fn post(&self, kind: EventKind) -> bool {
        let delivered = self
            .tx
            .send(ProviderEvent {
                cookie: self.cookie,
                kind,
            })
            .is_ok();
        if !delivered {
            trace!(worker = %self.worker, cookie = %self.cookie, "Event dropped, worker gone");
        }
        delivered
    }

    /// Posts a data-ready notification.
    #[inline]
    pub fn received(&self) -> bool {
        self.post(EventKind::Received)
    }
}

impl PartialEq for EventPort {
    fn eq(&self, other: &Self) -> bool {
        self.cookie == other.cookie && self.tx.same_channel(&other.tx)
    }
}

impl Eq for EventPort {}

impl fmt::Debug for EventPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventPort")
            .field("worker", &self.worker)
            .field("cookie", &self.cookie)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cookie(raw: u32) -> Cookie {
        Cookie::new(raw).unwrap()
    }

    #[test]
    fn test_port_posts_to_channel() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let port = EventPort::new(WorkerId::new(0), cookie(1), tx);

        assert!(port.received());
        let event = rx.try_recv().unwrap();
        assert_eq!(event.cookie, cookie(1));
        assert_eq!(event.kind, EventKind::Received);
    }

    #[test]
    fn test_port_reports_closed_worker() {
        let (tx, rx) = mpsc::unbounded_channel();
        let port = EventPort::new(WorkerId::new(0), cookie(1), tx);
        drop(rx);
        assert!(!port.received());
    }

    #[test]
    fn test_port_equality_requires_same_worker_channel() {
        let (tx_a, _rx_a) = mpsc::unbounded_channel();
        let (tx_b, _rx_b) = mpsc::unbounded_channel();
        let a = EventPort::new(WorkerId::new(0), cookie(1), tx_a.clone());
        let a2 = EventPort::new(WorkerId::new(0), cookie(1), tx_a);
        let b = EventPort::new(WorkerId::new(0), cookie(1), tx_b);

        assert_eq!(a, a2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_closure_is_event_sink() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let mut sink: Box<dyn EventSink> = Box::new(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        sink.on_received();
        sink.on_received();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
