//! Builder pattern for gateway configuration.
//!
//! # Example
//!
//! ```ignore
//! let gateway = Gateway::builder()
//!     .session(session)
//!     .max_workers(4)
//!     .build()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::provider::{LimitKind, Session};

use super::core::Gateway;
use super::options::GatewayOptions;

// ============================================================================
// GatewayBuilder
// ============================================================================

/// Builder for configuring a [`Gateway`].
///
/// Use [`Gateway::builder()`] to create a new builder.
#[derive(Default, Clone)]
pub struct GatewayBuilder {
    /// Provider connection status and counters.
    session: Option<Arc<dyn Session>>,
    /// Pool and request settings.
    options: GatewayOptions,
}

impl fmt::Debug for GatewayBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayBuilder")
            .field("session", &self.session.is_some())
            .field("options", &self.options)
            .finish()
    }
}

// ============================================================================
// GatewayBuilder Implementation
// ============================================================================

impl GatewayBuilder {
    /// Creates a builder with default options and no session.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the provider session.
    #[inline]
    #[must_use]
    pub fn session(mut self, session: Arc<dyn Session>) -> Self {
        self.session = Some(session);
        self
    }

    /// Replaces all options.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: GatewayOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the pool capacity, 0 for unbounded.
    #[inline]
    #[must_use]
    pub fn max_workers(mut self, max_workers: usize) -> Self {
        self.options.max_workers = max_workers;
        self
    }

    /// Sets the gated call category.
    #[inline]
    #[must_use]
    pub fn limit_kind(mut self, kind: LimitKind) -> Self {
        self.options.limit_kind = kind;
        self
    }

    /// Bounds the wait for each response.
    #[inline]
    #[must_use]
    pub fn response_timeout_ms(mut self, ms: u64) -> Self {
        self.options.response_timeout_ms = Some(ms);
        self
    }

    /// Sets the worker thread name prefix.
    #[inline]
    #[must_use]
    pub fn worker_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options.worker_prefix = prefix.into();
        self
    }

    /// Builds the gateway with validation.
    ///
    /// No worker is started until the first request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no session is set or the options are
    /// invalid.
    pub fn build(self) -> Result<Gateway> {
        let session = self.session.ok_or_else(|| {
            Error::config(
                "Session is required. Use .session() to set it.\n\
                 Example: Gateway::builder().session(session)",
            )
        })?;
        self.options.validate()?;

        Ok(Gateway::new(session, self.options))
    }
}

// ============================================================================
// Tests
// ============================================================================
