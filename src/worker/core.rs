//! Command worker: one dedicated thread per provider apartment.
//!
//! The worker thread runs a current-thread runtime whose loop waits on two
//! wakeup sources in the same poll:
//!
//! - Commands posted by callers (custom calls, `on`, `off`, stop)
//! - Provider events posted through [`EventPort`](crate::provider::EventPort)s
//!
//! Both are serviced on the same thread because providers only accept calls
//! and deliver callbacks on the thread that created a subscription.
//!
//! # Example
//!
//! ```ignore
//! let worker = Worker::new(WorkerId::new(0), "worker-00");
//! worker.start()?;
//!
//! let cookie = worker.on(provider.clone(), move || signal.set())?;
//! worker.invoke({
//!     let provider = provider.clone();
//!     move || provider.request()
//! })?;
//! worker.off(cookie)?;
//!
//! worker.stop()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tokio::runtime::Builder as RuntimeBuilder;
use tokio::sync::{Mutex as AsyncMutex, mpsc, oneshot};
use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::identifiers::{Cookie, WorkerId};
use crate::provider::{EventSink, Provider, ProviderEvent};

use super::command::{self, Command};
use super::registry::ListenerRegistry;

// ============================================================================
// Types
// ============================================================================

/// Run state of the worker thread.
enum Lifecycle {
    /// No thread. Initial and terminal state.
    Stopped,
    /// Thread is in its run loop.
    Running {
        commands: mpsc::UnboundedSender<Command>,
        thread: JoinHandle<()>,
    },
}

/// Internal shared state for a worker.
struct WorkerInner {
    /// Pool index.
    id: WorkerId,
    /// Thread name.
    name: String,
    /// Call gate: one command in flight per worker.
    gate: AsyncMutex<()>,
    /// Thread lifecycle.
    lifecycle: Mutex<Lifecycle>,
}

impl Drop for WorkerInner {
    fn drop(&mut self) {
        // Last handle gone: let the thread exit on its own, never join here.
        if let Lifecycle::Running { commands, .. } = &*self.lifecycle.lock() {
            let _ = commands.send(Command::Stop);
        }
    }
}

// ============================================================================
// Worker
// ============================================================================

/// Handle to a dedicated worker thread.
///
/// Clones share the same thread. Equality and hashing follow handle
/// identity, so two workers compare equal only if they are the same worker.
///
/// Blocking methods (`start`, `stop`, `invoke`, `on`, `off`) must not be
/// called from inside an async task; use the `_async` variants there.
#[derive(Clone)]
pub struct Worker {
    inner: Arc<WorkerInner>,
}

// ============================================================================
// Worker - Display & Identity
// ============================================================================

impl fmt::Debug for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("running", &self.is_running())
            .finish()
    }
}

impl PartialEq for Worker {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Worker {}

impl Hash for Worker {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.inner) as usize).hash(state);
    }
}

// ============================================================================
// Worker - Lifecycle
// ============================================================================

impl Worker {
    /// Creates a stopped worker.
    #[must_use]
    pub fn new(id: WorkerId, name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(WorkerInner {
                id,
                name: name.into(),
                gate: AsyncMutex::new(()),
                lifecycle: Mutex::new(Lifecycle::Stopped),
            }),
        }
    }

    /// Pool index of this worker.
    #[inline]
    #[must_use]
    pub fn id(&self) -> WorkerId {
        self.inner.id
    }

    /// Thread name of this worker.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns `true` while the thread is in its run loop.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(*self.inner.lifecycle.lock(), Lifecycle::Running { .. })
    }

    /// Spawns the thread and blocks until it is ready for commands.
    ///
    /// Idempotent while running.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerStart`] if the thread or its runtime could not
    /// be created.
    pub fn start(&self) -> Result<()> {
        let _gate = self.inner.gate.blocking_lock();
        let mut lifecycle = self.inner.lifecycle.lock();
        if matches!(*lifecycle, Lifecycle::Running { .. }) {
            return Ok(());
        }

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();
        let id = self.inner.id;
        let name = self.inner.name.clone();

        let thread = thread::Builder::new()
            .name(name.clone())
            .spawn(move || run_thread(id, name, command_rx, ready_tx))
            .map_err(|e| Error::worker_start(&self.inner.name, e.to_string()))?;

        let ready = ready_rx
            .blocking_recv()
            .unwrap_or_else(|_| Err(Error::worker_start(&self.inner.name, "thread exited before ready")));
        if let Err(e) = ready {
            let _ = thread.join();
            return Err(e);
        }

        *lifecycle = Lifecycle::Running {
            commands: command_tx,
            thread,
        };
        info!(worker = %self.inner.name, id = %self.inner.id, "Worker started");

        Ok(())
    }

    /// Stops the run loop and joins the thread.
    ///
    /// Idempotent once stopped. Must not be called from the worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CommandPanicked`] if the thread itself panicked.
    pub fn stop(&self) -> Result<()> {
        let _gate = self.inner.gate.blocking_lock();
        let previous = std::mem::replace(&mut *self.inner.lifecycle.lock(), Lifecycle::Stopped);
        let Lifecycle::Running { commands, thread } = previous else {
            return Ok(());
        };

        let _ = commands.send(Command::Stop);
        drop(commands);

        thread
            .join()
            .map_err(|_| Error::command_panicked(&self.inner.name, "worker thread panicked"))?;
        info!(worker = %self.inner.name, "Worker stopped");

        Ok(())
    }
}

// ============================================================================
// Worker - Commands
// ============================================================================

impl Worker {
    /// Runs `f` on the worker thread and blocks for its result.
    ///
    /// Errors and panics raised by `f` are returned to the caller; the
    /// worker keeps running.
    ///
    /// # Errors
    ///
    /// - [`Error::WorkerStopped`] if the worker is not running
    /// - [`Error::CommandPanicked`] if `f` panicked
    /// - Any error returned by `f`
    pub fn invoke<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce() -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let _gate = self.inner.gate.blocking_lock();
        let reply = self.post_call(f)?;
        reply
            .blocking_recv()
            .unwrap_or_else(|_| Err(self.stopped()))
    }

    /// Suspending variant of [`invoke`](Self::invoke).
    ///
    /// # Errors
    ///
    /// Same as [`invoke`](Self::invoke).
    pub async fn invoke_async<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce() -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let _gate = self.inner.gate.lock().await;
        let reply = self.post_call(f)?;
        reply.await.unwrap_or_else(|_| Err(self.stopped()))
    }

    /// Attaches `sink` to `source` on the worker thread.
    ///
    /// # Errors
    ///
    /// - [`Error::WorkerStopped`] if the worker is not running
    /// - The provider's attach error
    pub fn on(&self, source: Arc<dyn Provider>, sink: impl EventSink) -> Result<Cookie> {
        let _gate = self.inner.gate.blocking_lock();
        let (reply, rx) = oneshot::channel();
        self.send(Command::Advise {
            source,
            sink: Box::new(sink),
            reply,
        })?;
        rx.blocking_recv().unwrap_or_else(|_| Err(self.stopped()))
    }

    /// Suspending variant of [`on`](Self::on).
    ///
    /// # Errors
    ///
    /// Same as [`on`](Self::on).
    pub async fn on_async(&self, source: Arc<dyn Provider>, sink: impl EventSink) -> Result<Cookie> {
        let _gate = self.inner.gate.lock().await;
        let (reply, rx) = oneshot::channel();
        self.send(Command::Advise {
            source,
            sink: Box::new(sink),
            reply,
        })?;
        rx.await.unwrap_or_else(|_| Err(self.stopped()))
    }

    /// Detaches the listener behind `cookie`.
    ///
    /// Returns `false` if the cookie was not registered (double `off`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerStopped`] if the worker is not running.
    pub fn off(&self, cookie: Cookie) -> Result<bool> {
        let _gate = self.inner.gate.blocking_lock();
        let (reply, rx) = oneshot::channel();
        self.send(Command::Unadvise { cookie, reply })?;
        rx.blocking_recv().unwrap_or_else(|_| Err(self.stopped()))
    }

    /// Suspending variant of [`off`](Self::off).
    ///
    /// # Errors
    ///
    /// Same as [`off`](Self::off).
    pub async fn off_async(&self, cookie: Cookie) -> Result<bool> {
        let _gate = self.inner.gate.lock().await;
        let (reply, rx) = oneshot::channel();
        self.send(Command::Unadvise { cookie, reply })?;
        rx.await.unwrap_or_else(|_| Err(self.stopped()))
    }

    /// Posts a custom command and returns its reply channel.
    fn post_call<R, F>(&self, f: F) -> Result<oneshot::Receiver<Result<R>>>
    where
        F: FnOnce() -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Call(command::job(self.inner.name.clone(), f, reply)))?;
        Ok(rx)
    }

    /// Hands a command to the run loop.
    fn send(&self, command: Command) -> Result<()> {
        match &*self.inner.lifecycle.lock() {
            Lifecycle::Running { commands, .. } => {
                commands.send(command).map_err(|_| self.stopped())
            }
            Lifecycle::Stopped => Err(self.stopped()),
        }
    }

    #[inline]
    fn stopped(&self) -> Error {
        Error::worker_stopped(&self.inner.name)
    }
}

// ============================================================================
// Run Loop
// ============================================================================

/// Thread entry: builds the runtime, then serves the loop.
fn run_thread(
    id: WorkerId,
    name: String,
    commands: mpsc::UnboundedReceiver<Command>,
    ready: oneshot::Sender<Result<()>>,
) {
    let runtime = match RuntimeBuilder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(worker = %name, error = %e, "Worker runtime failed");
            let _ = ready.send(Err(Error::worker_start(&name, e.to_string())));
            return;
        }
    };

    runtime.block_on(run_loop(id, name, commands, ready));
}

/// Command and event pump.
async fn run_loop(
    id: WorkerId,
    name: String,
    mut commands: mpsc::UnboundedReceiver<Command>,
    ready: oneshot::Sender<Result<()>>,
) {
    let (event_tx, mut events) = mpsc::unbounded_channel::<ProviderEvent>();
    let mut registry = ListenerRegistry::new(id, event_tx);

    let _ = ready.send(Ok(()));
    debug!(worker = %name, "Run loop entered");

    loop {
        tokio::select! {
            command = commands.recv() => {
                match command {
                    Some(Command::Call(job)) => job(),

                    Some(Command::Advise { source, sink, reply }) => {
                        let cookie = command::contain(&name, || registry.register(source, sink));
                        let _ = reply.send(cookie);
                    }

                    Some(Command::Unadvise { cookie, reply }) => {
                        let removed = command::contain(&name, || Ok(registry.unregister(cookie)));
                        let _ = reply.send(removed);
                    }

                    Some(Command::Stop) => {
                        debug!(worker = %name, "Stop command received");
                        break;
                    }

                    None => {
                        debug!(worker = %name, "Command channel closed");
                        break;
                    }
                }
            }

            Some(event) = events.recv() => {
                let _ = command::contain(&name, || {
                    registry.dispatch(event);
                    Ok(())
                });
            }
        }
    }

    if !registry.is_empty() {
        debug!(worker = %name, count = registry.len(), "Detaching remaining listeners");
    }
    registry.clear();

    debug!(worker = %name, "Run loop terminated");
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    #[test]
    fn test_start_invoke_stop() {
        let worker = Worker::new(WorkerId::new(0), "worker-00");
        assert!(!worker.is_running());

        worker.start().unwrap();
        worker.start().unwrap();
        assert!(worker.is_running());

        let thread_name = worker
            .invoke(|| Ok(thread::current().name().map(str::to_string)))
            .unwrap();
        assert_eq!(thread_name.as_deref(), Some("worker-00"));

        worker.stop().unwrap();
        worker.stop().unwrap();
        assert!(!worker.is_running());
    }

    #[test]
    fn test_invoke_on_stopped_worker_fails() {
        let worker = Worker::new(WorkerId::new(1), "worker-01");
        let err = worker.invoke(|| Ok(())).unwrap_err();
        assert!(matches!(err, Error::WorkerStopped { .. }));
    }

    #[test]
    fn test_invoke_propagates_errors_and_panics() {
        let worker = Worker::new(WorkerId::new(0), "worker-00");
        worker.start().unwrap();

        let err = worker
            .invoke::<(), _>(|| Err(Error::provider("rejected")))
            .unwrap_err();
        assert!(matches!(err, Error::Provider { .. }));

        let err = worker.invoke::<(), _>(|| panic!("handler blew up")).unwrap_err();
        assert!(matches!(err, Error::CommandPanicked { .. }));

        // Loop survives both.
        assert_eq!(worker.invoke(|| Ok(41 + 1)).unwrap(), 42);
        worker.stop().unwrap();
    }

    #[test]
    fn test_restart_after_stop() {
        let worker = Worker::new(WorkerId::new(0), "worker-00");
        worker.start().unwrap();
        worker.stop().unwrap();
        worker.start().unwrap();
        assert_eq!(worker.invoke(|| Ok("again")).unwrap(), "again");
        worker.stop().unwrap();
    }

    #[test]
    fn test_identity_equality() {
        let a = Worker::new(WorkerId::new(0), "worker-00");
        let b = Worker::new(WorkerId::new(0), "worker-00");
        let a2 = a.clone();

        assert_eq!(a, a2);
        assert_ne!(a, b);

        let set: HashSet<Worker> = [a, a2, b].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_invoke_async() {
        let worker = Worker::new(WorkerId::new(0), "worker-00");
        let started = worker.clone();
        tokio::task::spawn_blocking(move || started.start())
            .await
            .unwrap()
            .unwrap();

        let value = worker.invoke_async(|| Ok(5 * 5)).await.unwrap();
        assert_eq!(value, 25);

        tokio::task::spawn_blocking(move || worker.stop())
            .await
            .unwrap()
            .unwrap();
    }
}
