//! Error types for the provider gateway.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use dib_gateway::{Result, Error};
//!
//! async fn example(tx: &Transaction) -> Result<()> {
//!     let report = tx.submit(query).await?;
//!     println!("{} pages", report.pages);
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Connectivity | [`Error::NotConnected`], [`Error::ResponseTimeout`] |
//! | Provider | [`Error::ProviderFault`], [`Error::Provider`], [`Error::UnexpectedValue`] |
//! | Pool | [`Error::PoolShuttingDown`], [`Error::ResourceNotInUse`] |
//! | Worker | [`Error::WorkerStart`], [`Error::WorkerStopped`], [`Error::CommandPanicked`] |
//! | Callback | [`Error::Callback`] |
//! | Configuration | [`Error::Config`], [`Error::InvalidArgument`] |
//! | External | [`Error::Json`], [`Error::Join`] |

// ============================================================================
// Imports
// ============================================================================

use std::error::Error as StdError;
use std::result::Result as StdResult;

use serde_json::Value;
use thiserror::Error;
use tokio::task::JoinError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

/// Boxed error returned by per-page callbacks.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Connectivity Errors
    // ========================================================================
    /// Provider session is not connected.
    ///
    /// Raised before any worker or listener is allocated.
    #[error("Provider is not connected")]
    NotConnected,

    /// Completion signal did not fire in time.
    ///
    /// Only raised when a response timeout is configured.
    #[error("No response after {timeout_ms}ms")]
    ResponseTimeout {
        /// Milliseconds waited before giving up.
        timeout_ms: u64,
    },

    // ========================================================================
    // Provider Errors
    // ========================================================================
    /// Provider reported a non-zero dib status before a send.
    ///
    /// Aborts the logical request; resources are still released.
    #[error("Provider fault: dib status {status}")]
    ProviderFault {
        /// Raw status code reported by the provider.
        status: i32,
    },

    /// A call into the provider failed.
    #[error("Provider call failed: {message}")]
    Provider {
        /// Description of the failure.
        message: String,
    },

    /// Provider returned a value of an unexpected shape.
    #[error("Unexpected value for {what}: {value}")]
    UnexpectedValue {
        /// What was being read.
        what: String,
        /// The offending value.
        value: Value,
    },

    // ========================================================================
    // Pool Errors
    // ========================================================================
    /// Pool shutdown has begun; nothing more is created or lent.
    #[error("Pool is shutting down, cannot acquire new resources")]
    PoolShuttingDown,

    /// A resource was returned that the pool does not hold as in-use.
    #[error("Resource not in use: {resource}")]
    ResourceNotInUse {
        /// Debug rendering of the returned resource.
        resource: String,
    },

    // ========================================================================
    // Worker Errors
    // ========================================================================
    /// Worker thread could not be started.
    #[error("Worker {worker} failed to start: {message}")]
    WorkerStart {
        /// Worker name.
        worker: String,
        /// Description of the failure.
        message: String,
    },

    /// Command sent to a worker that is not running.
    #[error("Worker {worker} is not running")]
    WorkerStopped {
        /// Worker name.
        worker: String,
    },

    /// A command handler panicked on the worker thread.
    ///
    /// The panic is contained; the worker keeps serving commands.
    #[error("Command panicked on worker {worker}: {message}")]
    CommandPanicked {
        /// Worker name.
        worker: String,
        /// Panic payload, when it was a string.
        message: String,
    },

    // ========================================================================
    // Callback Errors
    // ========================================================================
    /// The per-page callback returned an error.
    ///
    /// Pages delivered before this one are not rolled back.
    #[error("Callback failed on page {page}: {source}")]
    Callback {
        /// Zero-based page index.
        page: usize,
        /// Error returned by the callback.
        source: BoxError,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Invalid argument passed to an operation.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Background blocking task failed.
    #[error("Background task failed: {0}")]
    Join(#[from] JoinError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a provider call error.
    #[inline]
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
        }
    }

    /// Creates a provider fault error from a dib status.
    #[inline]
    pub fn provider_fault(status: i32) -> Self {
        Self::ProviderFault { status }
    }

    /// Creates an unexpected value error.
    #[inline]
    pub fn unexpected_value(what: impl Into<String>, value: Value) -> Self {
        Self::UnexpectedValue {
            what: what.into(),
            value,
        }
    }

    /// Creates a resource misuse error.
    #[inline]
    pub fn resource_not_in_use(resource: impl Into<String>) -> Self {
        Self::ResourceNotInUse {
            resource: resource.into(),
        }
    }

    /// Creates a worker start error.
    #[inline]
    pub fn worker_start(worker: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WorkerStart {
            worker: worker.into(),
            message: message.into(),
        }
    }

    /// Creates a worker stopped error.
    #[inline]
    pub fn worker_stopped(worker: impl Into<String>) -> Self {
        Self::WorkerStopped {
            worker: worker.into(),
        }
    }

    /// Creates a command panicked error.
    #[inline]
    pub fn command_panicked(worker: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CommandPanicked {
            worker: worker.into(),
            message: message.into(),
        }
    }

    /// Wraps a callback error with the page it failed on.
    #[inline]
    pub fn callback(page: usize, source: impl Into<BoxError>) -> Self {
        Self::Callback {
            page,
            source: source.into(),
        }
    }

    /// Creates a response timeout error.
    #[inline]
    pub fn response_timeout(timeout_ms: u64) -> Self {
        Self::ResponseTimeout { timeout_ms }
    }

    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if the provider connection is the cause.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::NotConnected | Self::ResponseTimeout { .. })
    }

    /// Returns `true` if the provider reported a fault status.
    #[inline]
    #[must_use]
    pub fn is_provider_fault(&self) -> bool {
        matches!(self, Self::ProviderFault { .. })
    }

    /// Returns `true` if a per-page callback failed.
    #[inline]
    #[must_use]
    pub fn is_callback_error(&self) -> bool {
        matches!(self, Self::Callback { .. })
    }

    /// Returns `true` if this is a pool lifecycle error.
    #[inline]
    #[must_use]
    pub fn is_pool_error(&self) -> bool {
        matches!(
            self,
            Self::PoolShuttingDown | Self::ResourceNotInUse { .. }
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed on retry.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ResponseTimeout { .. } | Self::ProviderFault { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
