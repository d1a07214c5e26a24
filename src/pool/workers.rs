//! Pool of command workers.
//!
//! Workers are created on first demand, started before they are lent, and
//! stopped when the pool disposes them.

use tracing::debug;

use crate::identifiers::WorkerId;
use crate::worker::Worker;

use super::resource::ResourcePool;

/// Pool lending started [`Worker`]s.
pub type WorkerPool = ResourcePool<Worker>;

impl ResourcePool<Worker> {
    /// Creates a worker pool.
    ///
    /// The worker created with index `i` runs on a thread named
    /// `"{prefix}-{i:02}"`.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum workers lent at once, 0 for unbounded
    /// * `prefix` - Thread name prefix
    pub fn workers(capacity: usize, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self::with_dispose(
            capacity,
            move |index| {
                let worker = Worker::new(WorkerId::new(index), format!("{prefix}-{index:02}"));
                worker.start()?;
                Ok(worker)
            },
            |worker: Worker| {
                debug!(worker = %worker.name(), "Disposing worker");
                worker.stop()
            },
        )
    }
}
