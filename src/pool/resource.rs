//! Generic bounded-or-unbounded resource pool.
//!
//! Resources are created on demand through a factory, lent to one caller at
//! a time, and returned for reuse. Shutdown is drain-based: idle resources
//! are disposed at once and lent ones when they come back.
//!
//! # Example
//!
//! ```ignore
//! let pool = ResourcePool::with_dispose(2, |index| Ok(index), |_| Ok(()));
//!
//! let a = pool.get()?;      // creates 0
//! let b = pool.get()?;      // creates 1
//! pool.put(a)?;
//! let c = pool.get()?;      // reuses 0
//!
//! pool.put(b)?;
//! pool.put(c)?;
//! pool.shutdown(false);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::thread;

use parking_lot::{Condvar, Mutex};
use rustc_hash::FxHashSet;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};

// ============================================================================
// Types
// ============================================================================

/// Anything a [`ResourcePool`] can hold.
///
/// Identity (`Eq + Hash`) decides in-use membership.
pub trait Resource: Clone + Eq + Hash + Send + Sync + fmt::Debug + 'static {}

impl<T> Resource for T where T: Clone + Eq + Hash + Send + Sync + fmt::Debug + 'static {}

/// Factory receiving the 0-based index of the resource to create.
type CreateFn<T> = Box<dyn Fn(usize) -> Result<T> + Send + Sync>;

/// Teardown called once per resource on shutdown.
type DisposeFn<T> = Box<dyn Fn(T) -> Result<()> + Send + Sync>;

/// Pool bookkeeping, guarded by one mutex.
struct PoolState<T> {
    /// Idle resources ready to lend.
    available: Vec<T>,
    /// Lent resources.
    in_use: FxHashSet<T>,
    /// Creation slots reserved but not yet filled.
    creating: usize,
    /// Index handed to the next factory call.
    next_index: usize,
    /// Resources successfully created.
    created: usize,
    /// Set once by `shutdown`.
    shutting_down: bool,
}

impl<T> PoolState<T> {
    /// Resources counted against capacity.
    #[inline]
    fn outstanding(&self) -> usize {
        self.in_use.len() + self.creating
    }
}

/// Internal shared state for the pool.
struct PoolInner<T> {
    /// Maximum lent resources, 0 for unbounded.
    capacity: usize,
    state: Mutex<PoolState<T>>,
    /// Signalled on every put, failed creation and shutdown.
    changed: Condvar,
    create: CreateFn<T>,
    dispose: Option<DisposeFn<T>>,
}

// ============================================================================
// ResourcePool
// ============================================================================

/// Pool lending resources of type `T`.
///
/// Clones share the same pool.
pub struct ResourcePool<T: Resource> {
    inner: Arc<PoolInner<T>>,
}

impl<T: Resource> Clone for ResourcePool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Resource> fmt::Debug for ResourcePool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("ResourcePool")
            .field("capacity", &self.inner.capacity)
            .field("available", &state.available.len())
            .field("in_use", &state.in_use.len())
            .field("shutting_down", &state.shutting_down)
            .finish()
    }
}

// ============================================================================
// ResourcePool - Constructors
// ============================================================================

impl<T: Resource> ResourcePool<T> {
    /// Creates a pool without a teardown step.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum resources lent at once, 0 for unbounded
    /// * `create` - Factory receiving the new resource's index
    pub fn new<C>(capacity: usize, create: C) -> Self
    where
        C: Fn(usize) -> Result<T> + Send + Sync + 'static,
    {
        Self::build(capacity, Box::new(create), None)
    }

    /// Creates a pool that disposes resources on shutdown.
    pub fn with_dispose<C, D>(capacity: usize, create: C, dispose: D) -> Self
    where
        C: Fn(usize) -> Result<T> + Send + Sync + 'static,
        D: Fn(T) -> Result<()> + Send + Sync + 'static,
    {
        Self::build(capacity, Box::new(create), Some(Box::new(dispose)))
    }

    fn build(capacity: usize, create: CreateFn<T>, dispose: Option<DisposeFn<T>>) -> Self {
        debug!(capacity, "Resource pool created");
        Self {
            inner: Arc::new(PoolInner {
                capacity,
                state: Mutex::new(PoolState {
                    available: Vec::new(),
                    in_use: FxHashSet::default(),
                    creating: 0,
                    next_index: 0,
                    created: 0,
                    shutting_down: false,
                }),
                changed: Condvar::new(),
                create,
                dispose,
            }),
        }
    }
}

// ============================================================================
// ResourcePool - Lending
// ============================================================================

impl<T: Resource> ResourcePool<T> {
    /// Lends a resource, creating one if none is idle.
    ///
    /// Blocks while a bounded pool is at capacity.
    ///
    /// # Errors
    ///
    /// - [`Error::PoolShuttingDown`] once shutdown has begun
    /// - Any error returned by the factory
    pub fn get(&self) -> Result<T> {
        let mut state = self.inner.state.lock();
        loop {
            if state.shutting_down {
                return Err(Error::PoolShuttingDown);
            }

            if let Some(resource) = state.available.pop() {
                debug!(resource = ?resource, "Reusing resource");
                state.in_use.insert(resource.clone());
                return Ok(resource);
            }

            if self.inner.capacity == 0 || state.outstanding() < self.inner.capacity {
                break;
            }

            self.inner.changed.wait(&mut state);
        }

        // Reserve the slot, run the factory unlocked.
        let index = state.next_index;
        state.next_index += 1;
        state.creating += 1;
        drop(state);

        let created = (self.inner.create)(index);

        let mut state = self.inner.state.lock();
        state.creating -= 1;

        let resource = match created {
            Ok(resource) => resource,
            Err(e) => {
                drop(state);
                self.inner.changed.notify_all();
                warn!(index, error = %e, "Resource creation failed");
                return Err(e);
            }
        };

        if state.shutting_down {
            drop(state);
            self.inner.changed.notify_all();
            debug!(index, "Pool shut down during creation, disposing");
            self.dispose_all(vec![resource]);
            return Err(Error::PoolShuttingDown);
        }

        state.created += 1;
        state.in_use.insert(resource.clone());
        info!(index, resource = ?resource, "Created new resource");

        Ok(resource)
    }

    /// Returns a lent resource to the idle set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceNotInUse`] if `resource` is not currently
    /// lent by this pool. The pool itself is unaffected. Resources a forced
    /// shutdown already disposed are accepted and ignored.
    pub fn put(&self, resource: T) -> Result<()> {
        let mut state = self.inner.state.lock();
        if !state.in_use.remove(&resource) {
            let shutting_down = state.shutting_down;
            drop(state);
            if shutting_down {
                debug!(resource = ?resource, "Resource returned after shutdown, already disposed");
                return Ok(());
            }
            error!(resource = ?resource, "Resource not in use");
            return Err(Error::resource_not_in_use(format!("{resource:?}")));
        }

        debug!(resource = ?resource, "Released resource");
        state.available.push(resource);

        if state.in_use.is_empty() {
            debug!(shutting_down = state.shutting_down, "All resources are returned");
        }
        drop(state);
        self.inner.changed.notify_all();

        Ok(())
    }

    /// Suspending variant of [`get`](Self::get).
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    ///
    /// If the returned future is dropped while the blocking `get` is still
    /// running, the resource it obtains goes straight back to the pool.
    pub async fn get_async(&self) -> Result<T> {
        let pool = self.clone();
        let handoff = tokio::task::spawn_blocking(move || {
            let resource = pool.get()?;
            Ok::<_, Error>(Handoff {
                pool,
                resource: Some(resource),
            })
        })
        .await??;
        handoff.claim().ok_or(Error::PoolShuttingDown)
    }

    /// Suspending variant of [`put`](Self::put).
    ///
    /// # Errors
    ///
    /// Same as [`put`](Self::put).
    pub async fn put_async(&self, resource: T) -> Result<()> {
        let pool = self.clone();
        tokio::task::spawn_blocking(move || pool.put(resource)).await?
    }
}

// ============================================================================
// Handoff
// ============================================================================

/// Resource on its way from a blocking `get` to an async caller.
///
/// Put back on drop unless claimed.
struct Handoff<T: Resource> {
    pool: ResourcePool<T>,
    resource: Option<T>,
}

impl<T: Resource> Handoff<T> {
    fn claim(mut self) -> Option<T> {
        self.resource.take()
    }
}

impl<T: Resource> Drop for Handoff<T> {
    fn drop(&mut self) {
        if let Some(resource) = self.resource.take() {
            debug!(resource = ?resource, "Async getter gone, returning resource");
            if let Err(e) = self.pool.put(resource) {
                warn!(error = %e, "Failed to return unclaimed resource");
            }
        }
    }
}

// ============================================================================
// ResourcePool - Shutdown
// ============================================================================

impl<T: Resource> ResourcePool<T> {
    /// Shuts the pool down. Idempotent.
    ///
    /// With `force`, idle and lent resources are disposed immediately; lent
    /// ones may still be in use by their holder. Otherwise idle resources are
    /// disposed immediately and the call blocks until every lent resource is
    /// returned, then disposes those.
    pub fn shutdown(&self, force: bool) {
        info!(force, "Shutting down the resource pool");

        let mut state = self.inner.state.lock();
        if state.shutting_down {
            info!("Pool is already shutting down");
            return;
        }
        state.shutting_down = true;

        let mut doomed: Vec<T> = state.available.drain(..).collect();
        if force {
            doomed.extend(state.in_use.drain());
        }
        drop(state);

        // Wake blocked getters so they fail fast.
        self.inner.changed.notify_all();
        self.dispose_all(doomed);

        if !force {
            let mut state = self.inner.state.lock();
            if state.outstanding() > 0 {
                info!(in_use = state.in_use.len(), "Waiting for all resources to be returned");
            }
            while state.outstanding() > 0 {
                self.inner.changed.wait(&mut state);
            }
            let returned: Vec<T> = state.available.drain(..).collect();
            drop(state);

            debug!(count = returned.len(), "All resources are returned, disposing");
            self.dispose_all(returned);
        }

        info!("Resource pool shutdown complete");
    }

    /// Suspending variant of [`shutdown`](Self::shutdown).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Join`] if the background task failed.
    pub async fn shutdown_async(&self, force: bool) -> Result<()> {
        let pool = self.clone();
        tokio::task::spawn_blocking(move || pool.shutdown(force)).await?;
        Ok(())
    }

    /// Runs `f` with this pool, then shuts it down.
    ///
    /// Shutdown is forced when `f` returns an error or panics.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returned.
    pub fn scope<R>(&self, f: impl FnOnce(&Self) -> Result<R>) -> Result<R> {
        let mut guard = ScopeGuard {
            pool: self,
            force: true,
        };
        let result = f(self);
        guard.force = result.is_err();
        result
    }

    fn dispose_all(&self, resources: Vec<T>) {
        let Some(dispose) = &self.inner.dispose else {
            return;
        };
        for resource in resources {
            let label = format!("{resource:?}");
            if let Err(e) = dispose(resource) {
                warn!(resource = %label, error = %e, "Resource disposal failed");
            }
        }
    }
}

/// Shuts the pool down when a scope ends, forced on error or panic.
struct ScopeGuard<'a, T: Resource> {
    pool: &'a ResourcePool<T>,
    force: bool,
}

impl<T: Resource> Drop for ScopeGuard<'_, T> {
    fn drop(&mut self) {
        self.pool.shutdown(self.force || thread::panicking());
    }
}

// ============================================================================
// ResourcePool - Introspection
// ============================================================================

impl<T: Resource> ResourcePool<T> {
    /// Capacity bound, 0 for unbounded.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Number of idle resources.
    #[must_use]
    pub fn available_count(&self) -> usize {
        self.inner.state.lock().available.len()
    }

    /// Number of lent resources.
    #[must_use]
    pub fn in_use_count(&self) -> usize {
        self.inner.state.lock().in_use.len()
    }

    /// Number of resources created so far.
    #[must_use]
    pub fn created_count(&self) -> usize {
        self.inner.state.lock().created
    }

    /// Returns `true` once shutdown has begun.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.inner.state.lock().shutting_down
    }
}

// ============================================================================
// Tests
// ============================================================================
