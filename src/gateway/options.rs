//! Gateway configuration.
//!
//! # Example
//!
//! ```ignore
//! use dib_gateway::{GatewayOptions, LimitKind};
//!
//! let options = GatewayOptions::new()
//!     .with_max_workers(4)
//!     .with_limit_kind(LimitKind::NonTrade)
//!     .with_response_timeout_ms(30_000);
//!
//! let parsed = GatewayOptions::from_json(r#"{ "max_workers": 4 }"#)?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::provider::LimitKind;
use crate::rate_limit::DEFAULT_MIN_BACKOFF_MS;

// ============================================================================
// Constants
// ============================================================================

/// Default worker thread name prefix.
pub const DEFAULT_WORKER_PREFIX: &str = "worker";

// ============================================================================
// GatewayOptions
// ============================================================================

/// Pool, rate limit and response settings for one gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayOptions {
    /// Maximum workers lent at once, 0 for unbounded.
    pub max_workers: usize,

    /// Call category gated before each round trip.
    pub limit_kind: LimitKind,

    /// Floor for each rate-limit sleep, in milliseconds.
    pub min_backoff_ms: u64,

    /// Bound on waiting for one response. `None` waits indefinitely.
    pub response_timeout_ms: Option<u64>,

    /// Worker threads are named `{prefix}-{index:02}`.
    pub worker_prefix: String,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl GatewayOptions {
    /// Creates options with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_workers: 0,
            limit_kind: LimitKind::NonTrade,
            min_backoff_ms: DEFAULT_MIN_BACKOFF_MS,
            response_timeout_ms: None,
            worker_prefix: DEFAULT_WORKER_PREFIX.to_string(),
        }
    }

    /// Parses options from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if `json` is malformed
    /// - [`Error::Config`] if the parsed options are invalid
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl GatewayOptions {
    /// Sets the pool capacity.
    #[inline]
    #[must_use]
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Sets the gated call category.
    #[inline]
    #[must_use]
    pub fn with_limit_kind(mut self, kind: LimitKind) -> Self {
        self.limit_kind = kind;
        self
    }

    /// Sets the backoff floor.
    #[inline]
    #[must_use]
    pub fn with_min_backoff_ms(mut self, ms: u64) -> Self {
        self.min_backoff_ms = ms;
        self
    }

    /// Bounds the wait for each response.
    #[inline]
    #[must_use]
    pub fn with_response_timeout_ms(mut self, ms: u64) -> Self {
        self.response_timeout_ms = Some(ms);
        self
    }

    /// Sets the worker thread name prefix.
    #[inline]
    #[must_use]
    pub fn with_worker_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.worker_prefix = prefix.into();
        self
    }
}

// ============================================================================
// Accessors & Validation
// ============================================================================

impl GatewayOptions {
    /// Backoff floor as a duration.
    #[inline]
    #[must_use]
    pub fn min_backoff(&self) -> Duration {
        Duration::from_millis(self.min_backoff_ms)
    }

    /// Response timeout as a duration.
    #[inline]
    #[must_use]
    pub fn response_timeout(&self) -> Option<Duration> {
        self.response_timeout_ms.map(Duration::from_millis)
    }

    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an empty worker prefix or a zero
    /// response timeout.
    pub fn validate(&self) -> Result<()> {
        if self.worker_prefix.trim().is_empty() {
            return Err(Error::config("worker_prefix must not be empty"));
        }
        if self.response_timeout_ms == Some(0) {
            return Err(Error::config(
                "response_timeout_ms must be greater than zero; omit it to wait indefinitely",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = GatewayOptions::default();
        assert_eq!(options.max_workers, 0);
        assert_eq!(options.limit_kind, LimitKind::NonTrade);
        assert_eq!(options.min_backoff_ms, 10);
        assert_eq!(options.response_timeout(), None);
        assert_eq!(options.worker_prefix, "worker");
    }

    #[test]
    fn test_builder_chain() {
        let options = GatewayOptions::new()
            .with_max_workers(2)
            .with_limit_kind(LimitKind::Trade)
            .with_response_timeout_ms(500)
            .with_worker_prefix("chart");

        assert_eq!(options.max_workers, 2);
        assert_eq!(options.limit_kind, LimitKind::Trade);
        assert_eq!(options.response_timeout(), Some(Duration::from_millis(500)));
        assert_eq!(options.worker_prefix, "chart");
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let options = GatewayOptions::from_json(r#"{ "max_workers": 3, "limit_kind": "subscribe" }"#).unwrap();
        assert_eq!(options.max_workers, 3);
        assert_eq!(options.limit_kind, LimitKind::Subscribe);
        assert_eq!(options.min_backoff_ms, 10);
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        assert!(matches!(
            GatewayOptions::from_json(r#"{ "worker_prefix": " " }"#),
            Err(Error::Config { .. })
        ));
        assert!(matches!(
            GatewayOptions::from_json("not json"),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_zero_timeout_is_invalid() {
        let options = GatewayOptions::new().with_response_timeout_ms(0);
        assert!(options.validate().is_err());
    }
}
