//! Typed facade over the provider's code manager.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::trace;

use crate::error::{Error, Result};
use crate::provider::value_as_i64;
use crate::transaction::date_from_int;

use super::kinds::{Market, SecurityKind};
use super::ticker::Ticker;

// ============================================================================
// CodeManager
// ============================================================================

/// The provider's code-lookup object, addressed by method name.
pub trait CodeManager: Send + Sync {
    /// Calls `method` with positional `args`.
    ///
    /// # Errors
    ///
    /// Returns the provider's error, or [`Error::InvalidArgument`] for an
    /// unknown method.
    fn invoke(&self, method: &str, args: &[Value]) -> Result<Value>;
}

// ============================================================================
// CodeBook
// ============================================================================

/// Shared handle to a [`CodeManager`] with typed lookups.
#[derive(Clone)]
pub struct CodeBook {
    manager: Arc<dyn CodeManager>,
}

impl fmt::Debug for CodeBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeBook").finish_non_exhaustive()
    }
}

impl CodeBook {
    /// Wraps a code manager.
    #[must_use]
    pub fn new(manager: Arc<dyn CodeManager>) -> Self {
        Self { manager }
    }

    /// Entity view of one code.
    #[must_use]
    pub fn ticker(&self, code: impl Into<String>) -> Ticker {
        Ticker::new(self.clone(), code)
    }

    /// Calls any manager method by name.
    ///
    /// # Errors
    ///
    /// Returns the manager's error.
    pub fn call(&self, method: &str, args: &[Value]) -> Result<Value> {
        trace!(method, "Code manager call");
        self.manager.invoke(method, args)
    }

    /// Display name of `code`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedValue`] if the manager returns a non-string.
    pub fn code_to_name(&self, code: &str) -> Result<String> {
        match self.call("CodeToName", &[Value::from(code)])? {
            Value::String(name) => Ok(name),
            other => Err(Error::unexpected_value("name", other)),
        }
    }

    /// Market `code` trades on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedValue`] for an unknown market code.
    pub fn market_kind(&self, code: &str) -> Result<Market> {
        let raw = self.call("GetStockMarketKind", &[Value::from(code)])?;
        Market::from_code(value_as_i64("market kind", &raw)?)
    }

    /// Security type of `code`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedValue`] for an unknown security code.
    pub fn security_kind(&self, code: &str) -> Result<SecurityKind> {
        let raw = self.call("GetStockSectionKind", &[Value::from(code)])?;
        SecurityKind::from_code(value_as_i64("security kind", &raw)?)
    }

    /// Listing date of `code`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedValue`] if the manager returns no valid
    /// `YYYYMMDD` date.
    pub fn listed_date(&self, code: &str) -> Result<NaiveDate> {
        let raw = self.call("GetStockListedDate", &[Value::from(code)])?;
        date_from_int(value_as_i64("listed date", &raw)?)
    }

    /// Codes listed on `market`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedValue`] if the manager returns anything
    /// but a list of strings.
    pub fn codes_by_market(&self, market: Market) -> Result<Vec<String>> {
        let raw = self.call("GetStockListByMarket", &[Value::from(market as i64)])?;
        serde_json::from_value(raw.clone()).map_err(|_| Error::unexpected_value("code list", raw))
    }
}
