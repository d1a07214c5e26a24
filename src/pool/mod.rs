//! Resource pooling.
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`ResourcePool`] | Generic lend/return pool with drain-based shutdown |
//! | [`WorkerPool`] | `ResourcePool<Worker>` creating started workers on demand |

pub mod resource;
pub mod workers;

pub use resource::{Resource, ResourcePool};
pub use workers::WorkerPool;
