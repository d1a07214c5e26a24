//! Commands accepted by a worker's run loop.

// ============================================================================
// Imports
// ============================================================================

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::error;

use crate::error::{Error, Result};
use crate::identifiers::Cookie;
use crate::provider::{EventSink, Provider};

// ============================================================================
// Types
// ============================================================================

/// Type-erased custom command. Carries its own reply channel.
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// One command slot posted to a worker.
pub(crate) enum Command {
    /// Run a custom command on the worker thread.
    Call(Job),
    /// Attach a listener (built-in `on`).
    Advise {
        source: Arc<dyn Provider>,
        sink: Box<dyn EventSink>,
        reply: oneshot::Sender<Result<Cookie>>,
    },
    /// Detach a listener (built-in `off`).
    Unadvise {
        cookie: Cookie,
        reply: oneshot::Sender<Result<bool>>,
    },
    /// Leave the run loop.
    Stop,
}

// ============================================================================
// Panic Containment
// ============================================================================

/// Runs `f`, turning a panic into [`Error::CommandPanicked`].
pub(crate) fn contain<R>(worker: &str, f: impl FnOnce() -> Result<R>) -> Result<R> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(worker, message = %message, "Command panicked");
            Err(Error::command_panicked(worker, message))
        }
    }
}

/// Wraps a typed command into a [`Job`] answering on `reply`.
pub(crate) fn job<R, F>(worker: String, f: F, reply: oneshot::Sender<Result<R>>) -> Job
where
    F: FnOnce() -> Result<R> + Send + 'static,
    R: Send + 'static,
{
    Box::new(move || {
        let outcome = contain(&worker, f);
        let _ = reply.send(outcome);
    })
}

/// Extracts a readable message from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================
