//! Code lookup.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`CodeManager`] | Provider code-lookup object, called by method name |
//! | [`CodeBook`] | Typed, shareable facade over a manager |
//! | [`Ticker`] | One code, limited to [`TickerOp::ALL`] |
//! | [`Market`] / [`SecurityKind`] | Decoded classifications |
//!
//! # Example
//!
//! ```ignore
//! let book = CodeBook::new(manager);
//! let samsung = book.ticker("A005930");
//!
//! println!("{} on {}", samsung.name()?, samsung.market_kind()?);
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Typed facade over the provider's code manager.
pub mod book;

/// Market and security classifications.
pub mod kinds;

/// Per-code entity.
pub mod ticker;

// ============================================================================
// Re-exports
// ============================================================================

pub use book::{CodeBook, CodeManager};
pub use kinds::{Market, SecurityKind};
pub use ticker::{Ticker, TickerOp};
