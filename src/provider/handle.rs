//! The provider object handle.
//!
//! Mirrors the dispatch surface of a provider object: callers fill input
//! fields, issue a send, then read header and data values of the response.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;

use crate::error::{Error, Result};

use super::event::EventPort;

// ============================================================================
// Provider
// ============================================================================

/// One provider object (a data product endpoint).
///
/// Implementations wrap the native handle. Every method may be called from a
/// worker thread; the gateway confines event subscriptions to the worker
/// that created them.
pub trait Provider: Send + Sync {
    /// Sets one input field before a send.
    fn set_input_value(&self, field: i32, value: Value) -> Result<()>;

    /// Reads one response header field.
    fn get_header_value(&self, field: i32) -> Result<Value>;

    /// Reads one response data cell.
    fn get_data_value(&self, column: i32, row: i32) -> Result<Value>;

    /// Issues one asynchronous round trip. Completion arrives as an event.
    fn request(&self) -> Result<()>;

    /// Issues one synchronous round trip on the calling thread.
    fn block_request(&self) -> Result<()>;

    /// Fault code checked before each send. 0 means ok.
    fn dib_status(&self) -> i32;

    /// Whether the provider reports more pages after the last response.
    fn has_continue(&self) -> bool;

    /// Attaches a listener port. Events are posted through `port`.
    fn advise(&self, port: EventPort) -> Result<()>;

    /// Detaches a previously attached port.
    fn unadvise(&self, port: &EventPort) -> Result<()>;
}

// ============================================================================
// Value Helpers
// ============================================================================

/// Reads an integer out of a provider value.
///
/// Providers hand out numbers as integers, floats or numeric strings
/// depending on the field; all three are accepted.
///
/// # Errors
///
/// Returns [`Error::UnexpectedValue`] for any other shape.
pub fn value_as_i64(what: &str, value: &Value) -> Result<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| Error::unexpected_value(what, value.clone())),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| Error::unexpected_value(what, value.clone())),
        Value::Null => Ok(0),
        _ => Err(Error::unexpected_value(what, value.clone())),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_value_as_i64_accepts_numbers() {
        assert_eq!(value_as_i64("n", &json!(500)).unwrap(), 500);
        assert_eq!(value_as_i64("n", &json!(12.0)).unwrap(), 12);
    }

    #[test]
    fn test_value_as_i64_accepts_numeric_strings() {
        assert_eq!(value_as_i64("date", &json!(" 20240105 ")).unwrap(), 20240105);
    }

    #[test]
    fn test_value_as_i64_empty_is_zero() {
        assert_eq!(value_as_i64("n", &Value::Null).unwrap(), 0);
    }

    #[test]
    fn test_value_as_i64_rejects_other_shapes() {
        let err = value_as_i64("n", &json!([1, 2])).unwrap_err();
        assert!(matches!(err, Error::UnexpectedValue { .. }));
    }
}
