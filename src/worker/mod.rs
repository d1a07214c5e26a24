//! Command workers.
//!
//! A worker is a dedicated thread that owns every provider subscription
//! made through it. Callers never touch worker internals; they post
//! commands and wait for the reply.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Worker`] | Thread handle with a serialized call gate |
//! | [`ListenerRegistry`] | Cookie to subscription table (worker-local) |
//! | [`CookieJar`] | Smallest-first cookie allocator |
//!
//! # Lifecycle
//!
//! ```text
//! Stopped ──start()──► Running ──stop()──► Stopped (thread joined)
//!                        │  ▲
//!              invoke/on/off (one at a time)
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Worker command slot and panic containment.
mod command;

/// Cookie allocation.
pub mod cookie;

/// Worker thread handle and run loop.
pub mod core;

/// Per-worker listener registry.
pub mod registry;

// ============================================================================
// Re-exports
// ============================================================================

pub use cookie::CookieJar;
pub use self::core::Worker;
pub use registry::ListenerRegistry;
