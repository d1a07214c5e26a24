//! DIB Gateway - thread-confined access to single-threaded data providers.
//!
//! This library mediates access to an event-driven native provider that
//! only accepts calls, and only delivers callbacks, on the thread that
//! created a subscription. It offers blocking and suspending
//! request/response APIs with rate limiting and automatic paging.
//!
//! # Architecture
//!
//! - **Workers**: dedicated threads, each pumping its own commands and
//!   provider events, so every provider interaction stays on one thread
//! - **Pool**: lends workers on demand up to a cap and drains them on shutdown
//! - **Rate limiter**: defers sends while the provider's call budget is spent
//! - **Transactions**: one logical request spanning as many round trips as
//!   its pager asks for, with a callback per page
//!
//! ```text
//! query -> pool.get -> worker.on(listener) -> rate gate -> request
//!       -> completion signal -> callback -> pager -> ... -> off -> pool.put
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use dib_gateway::{CountPager, Gateway, Page, Pager, Provider, Query, Result};
//!
//! struct LastCandles(u64);
//!
//! impl Query for LastCandles {
//!     fn serialize(&self, chart: &dyn Provider) -> Result<()> {
//!         chart.set_input_value(4, self.0.into())
//!     }
//!
//!     fn pager(&self) -> Box<dyn Pager> {
//!         Box::new(CountPager::new(self.0))
//!     }
//! }
//!
//! async fn run(session: Arc<dyn dib_gateway::Session>, chart: Arc<dyn Provider>) -> Result<()> {
//!     let gateway = Gateway::builder().session(session).max_workers(4).build()?;
//!
//!     gateway
//!         .scoped(|gw| async move {
//!             let report = gw
//!                 .transaction(chart)
//!                 .send(LastCandles(2500), |page: &Page<'_>| {
//!                     println!("page {}: {} rows", page.index(), page.header_i64(3)?);
//!                     Ok(())
//!                 })
//!                 .await?;
//!             println!("{} pages", report.pages);
//!             Ok(())
//!         })
//!         .await
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`codes`] | Code lookup facade and per-code [`Ticker`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`gateway`] | Owning context: [`Gateway`], builder, options |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`pool`] | Generic [`ResourcePool`] and [`WorkerPool`] |
//! | [`provider`] | Provider, session and event contracts |
//! | [`rate_limit`] | Call-budget [`RateLimiter`] |
//! | [`transaction`] | Paged [`Transaction`] engine |
//! | [`worker`] | Thread-confined command [`Worker`] |

// ============================================================================
// Modules
// ============================================================================

/// Code lookup facade.
pub mod codes;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Owning context for pool, rate limiter and session.
///
/// Use [`Gateway::builder()`] to create a configured gateway.
pub mod gateway;

/// Type-safe identifiers for workers, listeners and transactions.
pub mod identifiers;

/// Resource pooling.
pub mod pool;

/// Provider-side contracts.
///
/// The provider itself is external; this module defines what the crate
/// calls on it.
pub mod provider;

/// Call-budget rate limiter.
pub mod rate_limit;

/// Paged request/response transactions.
pub mod transaction;

/// Thread-confined command workers.
pub mod worker;

// ============================================================================
// Re-exports
// ============================================================================

// Code lookup
pub use codes::{CodeBook, CodeManager, Market, SecurityKind, Ticker, TickerOp};

// Error types
pub use error::{BoxError, Error, Result};

// Gateway types
pub use gateway::{Gateway, GatewayBuilder, GatewayOptions};

// Identifier types
pub use identifiers::{Cookie, TransactionId, WorkerId};

// Pool types
pub use pool::{Resource, ResourcePool, WorkerPool};

// Provider contracts
pub use provider::{EventKind, EventPort, EventSink, LimitKind, Provider, ProviderEvent, Session};

// Rate limiting
pub use rate_limit::RateLimiter;

// Transaction types
pub use transaction::{
    CallbackResult, CompletionSignal, CountPager, Page, Pager, PagingFields, Query, SinglePage,
    TermPager, Transaction, TransactionReport, TransactionState,
};

// Worker types
pub use worker::Worker;
