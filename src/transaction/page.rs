//! Read-only view of one physical response.

use std::fmt;

use serde_json::Value;

use crate::error::Result;
use crate::provider::{Provider, value_as_i64};

/// Response of one round trip, handed to the per-page callback.
#[derive(Clone, Copy)]
pub struct Page<'a> {
    provider: &'a dyn Provider,
    index: usize,
}

impl fmt::Debug for Page<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl<'a> Page<'a> {
    pub(crate) fn new(provider: &'a dyn Provider, index: usize) -> Self {
        Self { provider, index }
    }

    /// Zero-based round trip index within the logical request.
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The provider holding the response.
    #[inline]
    #[must_use]
    pub fn provider(&self) -> &'a dyn Provider {
        self.provider
    }

    /// Reads a response header field.
    ///
    /// # Errors
    ///
    /// Returns the provider's error.
    pub fn header(&self, field: i32) -> Result<Value> {
        self.provider.get_header_value(field)
    }

    /// Reads a response data cell.
    ///
    /// # Errors
    ///
    /// Returns the provider's error.
    pub fn data(&self, column: i32, row: i32) -> Result<Value> {
        self.provider.get_data_value(column, row)
    }

    /// Reads a header field as an integer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedValue`](crate::Error::UnexpectedValue)
    /// if the field is not numeric.
    pub fn header_i64(&self, field: i32) -> Result<i64> {
        value_as_i64("header field", &self.header(field)?)
    }

    /// Reads a data cell as an integer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedValue`](crate::Error::UnexpectedValue)
    /// if the cell is not numeric.
    pub fn data_i64(&self, column: i32, row: i32) -> Result<i64> {
        value_as_i64("data cell", &self.data(column, row)?)
    }
}
