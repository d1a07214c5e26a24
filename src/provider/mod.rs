//! Provider-side contracts.
//!
//! The provider is an opaque, single-threaded native component. This crate
//! never implements it; it only calls through the traits defined here.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Provider`] | One provider object: input fields, send, response accessors |
//! | [`Session`] | Process-wide connection state and rate counters |
//! | [`LimitKind`] | Call category for rate counters |
//! | [`EventSink`] | Listener invoked on the owning worker thread |
//! | [`EventPort`] | Handle a provider uses to post events to a worker |
//!
//! Field values are [`serde_json::Value`], which covers every variant shape
//! the provider hands out (integers, floats, strings, arrays, empty).

// ============================================================================
// Submodules
// ============================================================================

/// Event listener contracts and the worker-bound event port.
pub mod event;

/// The provider object handle.
pub mod handle;

/// Connection state and rate counters.
pub mod session;

// ============================================================================
// Re-exports
// ============================================================================

pub use event::{EventKind, EventPort, EventSink, ProviderEvent};
pub use handle::{Provider, value_as_i64};
pub use session::{LimitKind, Session};
