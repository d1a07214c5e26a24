//! Per-worker listener registry.
//!
//! Maps cookies to provider subscriptions. Only the owning worker thread
//! touches a registry, so it needs no locking.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::identifiers::{Cookie, WorkerId};
use crate::provider::{EventKind, EventPort, EventSink, Provider, ProviderEvent};

use super::cookie::CookieJar;

// ============================================================================
// Subscription
// ============================================================================

/// One attached listener: the provider, its port and the sink it feeds.
struct Subscription {
    source: Arc<dyn Provider>,
    port: EventPort,
    sink: Box<dyn EventSink>,
}

// ============================================================================
// ListenerRegistry
// ============================================================================

/// Cookie-keyed listener table owned by one worker.
pub struct ListenerRegistry {
    worker: WorkerId,
    events: mpsc::UnboundedSender<ProviderEvent>,
    cookies: CookieJar,
    subscriptions: FxHashMap<Cookie, Subscription>,
}

impl ListenerRegistry {
    /// Creates a registry whose ports post into `events`.
    pub fn new(worker: WorkerId, events: mpsc::UnboundedSender<ProviderEvent>) -> Self {
        Self {
            worker,
            events,
            cookies: CookieJar::new(),
            subscriptions: FxHashMap::default(),
        }
    }

    /// Attaches `sink` to `source` and returns its cookie.
    ///
    /// # Errors
    ///
    /// Propagates the provider's attach failure; the cookie is released.
    pub fn register(&mut self, source: Arc<dyn Provider>, sink: Box<dyn EventSink>) -> Result<Cookie> {
        let cookie = self.cookies.alloc();
        let port = EventPort::new(self.worker, cookie, self.events.clone());

        if let Err(e) = source.advise(port.clone()) {
            self.cookies.free(cookie);
            return Err(e);
        }

        self.subscriptions
            .insert(cookie, Subscription { source, port, sink });
        debug!(worker = %self.worker, cookie = %cookie, "Listener registered");

        Ok(cookie)
    }

    /// Detaches the listener behind `cookie`.
    ///
    /// Returns `false` when the cookie is not registered.
    pub fn unregister(&mut self, cookie: Cookie) -> bool {
        let Some(mut subscription) = self.subscriptions.remove(&cookie) else {
            trace!(worker = %self.worker, cookie = %cookie, "Unregister of unknown cookie");
            return false;
        };

        if let Err(e) = subscription.source.unadvise(&subscription.port) {
            warn!(worker = %self.worker, cookie = %cookie, error = %e, "Provider detach failed");
        }
        subscription.sink.on_detached();
        self.cookies.free(cookie);
        debug!(worker = %self.worker, cookie = %cookie, "Listener unregistered");

        true
    }

    /// Delivers one event to its sink.
    pub fn dispatch(&mut self, event: ProviderEvent) {
        match self.subscriptions.get_mut(&event.cookie) {
            Some(subscription) => match event.kind {
                EventKind::Received => {
                    trace!(worker = %self.worker, cookie = %event.cookie, "Delivering received event");
                    subscription.sink.on_received();
                }
            },
            None => {
                trace!(worker = %self.worker, cookie = %event.cookie, "Event for unregistered cookie dropped");
            }
        }
    }

    /// Detaches every listener.
    pub fn clear(&mut self) {
        let cookies: Vec<Cookie> = self.subscriptions.keys().copied().collect();
        for cookie in cookies {
            self.unregister(cookie);
        }
    }

    /// Number of active registrations.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Returns `true` when nothing is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
