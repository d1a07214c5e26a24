//! Gateway: the owning context for pool, rate limiter and session.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Gateway`] | Shared handle creating transactions |
//! | [`GatewayBuilder`] | Fluent configuration builder |
//! | [`GatewayOptions`] | Serializable settings |

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for gateway configuration.
pub mod builder;

/// Core gateway implementation.
pub mod core;

/// Gateway settings.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::GatewayBuilder;
pub use self::core::Gateway;
pub use options::GatewayOptions;
