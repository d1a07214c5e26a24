//! Paged request/response transactions.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Transaction`] | Suspending and blocking entry points for one provider object |
//! | [`Query`] | Serializes a request and hands out its [`Pager`] |
//! | [`CountPager`] / [`TermPager`] / [`SinglePage`] | Continuation strategies |
//! | [`Page`] | Response view passed to the per-page callback |
//! | [`CompletionSignal`] | Data-ready flag set by the worker-side listener |
//! | [`TransactionReport`] | Pages delivered and final paging state |
//!
//! # Example
//!
//! ```ignore
//! let tx = gateway.transaction(chart);
//!
//! let report = tx
//!     .send(DailyCandles::last(2500), |page: &Page<'_>| {
//!         let rows = page.header_i64(3)?;
//!         println!("page {} has {rows} rows", page.index());
//!         Ok(())
//!     })
//!     .await?;
//!
//! assert_eq!(report.remaining, Some(0));
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Per-request bookkeeping and state machine.
pub mod context;

/// Transaction engine.
pub mod engine;

/// Response view.
pub mod page;

/// Chart-style paging strategies.
pub mod paging;

/// Query and continuation contracts.
pub mod query;

/// Reusable completion signal.
pub mod signal;

// ============================================================================
// Re-exports
// ============================================================================

pub use context::{RequestContext, TransactionState};
pub use engine::{CallbackResult, Transaction, TransactionReport};
pub use page::Page;
pub use paging::{CountPager, PagingFields, TermPager, date_from_int, date_to_int};
pub use query::{Pager, Query, SinglePage};
pub use signal::CompletionSignal;
