//! Per-code entity over the code manager.
//!
//! A [`Ticker`] holds one code and can only reach the manager operations
//! that take a code as their first argument. The allowed set is the static
//! [`TickerOp::ALL`] table; market-, group- and industry-wide operations
//! stay on [`CodeBook`].

// ============================================================================
// Imports
// ============================================================================

use chrono::NaiveDate;
use serde_json::Value;

use crate::error::{Error, Result};

use super::book::CodeBook;
use super::kinds::{Market, SecurityKind};

// ============================================================================
// TickerOp
// ============================================================================

/// Code manager operation callable through a [`Ticker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickerOp {
    CodeToName,
    MarketKind,
    SectionKind,
    ListedDate,
    ListedShares,
    StatusKind,
    TickUnit,
    TickValue,
    TradeUnit,
    StockFutureBaseCode,
    StockFuturesByBaseCode,
    OverseasFutureName,
    OverseasFutureExchange,
    OverseasFutureLastTradeDate,
    OverseasFutureProduct,
    IsTradeCondition,
}

impl TickerOp {
    /// Every operation a ticker may call.
    pub const ALL: [TickerOp; 16] = [
        Self::CodeToName,
        Self::MarketKind,
        Self::SectionKind,
        Self::ListedDate,
        Self::ListedShares,
        Self::StatusKind,
        Self::TickUnit,
        Self::TickValue,
        Self::TradeUnit,
        Self::StockFutureBaseCode,
        Self::StockFuturesByBaseCode,
        Self::OverseasFutureName,
        Self::OverseasFutureExchange,
        Self::OverseasFutureLastTradeDate,
        Self::OverseasFutureProduct,
        Self::IsTradeCondition,
    ];

    /// Manager method name.
    #[must_use]
    pub const fn method(self) -> &'static str {
        match self {
            Self::CodeToName => "CodeToName",
            Self::MarketKind => "GetStockMarketKind",
            Self::SectionKind => "GetStockSectionKind",
            Self::ListedDate => "GetStockListedDate",
            Self::ListedShares => "GetListingStock",
            Self::StatusKind => "GetStockStatusKind",
            Self::TickUnit => "GetTickUnit",
            Self::TickValue => "GetTickValue",
            Self::TradeUnit => "GetFOTradeUnit",
            Self::StockFutureBaseCode => "GetStockFutureBaseCode",
            Self::StockFuturesByBaseCode => "GetStockFutureListByBaseCode",
            Self::OverseasFutureName => "OvFutCodeToName",
            Self::OverseasFutureExchange => "OvFutExchCode",
            Self::OverseasFutureLastTradeDate => "OvFutGetLastTradeDate",
            Self::OverseasFutureProduct => "OvFutGetProdCode",
            Self::IsTradeCondition => "IsTradeCondition",
        }
    }

    /// Looks an operation up by manager method name.
    #[must_use]
    pub fn from_method(method: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.method() == method)
    }
}

// ============================================================================
// Ticker
// ============================================================================

/// One code bound to a [`CodeBook`].
#[derive(Debug, Clone)]
pub struct Ticker {
    book: CodeBook,
    code: String,
}

impl Ticker {
    pub(crate) fn new(book: CodeBook, code: impl Into<String>) -> Self {
        Self {
            book,
            code: code.into(),
        }
    }

    /// The code this ticker stands for.
    #[inline]
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Calls `op` with this code as the first argument.
    ///
    /// # Errors
    ///
    /// Returns the manager's error.
    pub fn call(&self, op: TickerOp, args: &[Value]) -> Result<Value> {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push(Value::from(self.code.as_str()));
        full.extend_from_slice(args);
        self.book.call(op.method(), &full)
    }

    /// Calls a manager method by name, if tickers may call it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for methods outside
    /// [`TickerOp::ALL`].
    pub fn call_method(&self, method: &str, args: &[Value]) -> Result<Value> {
        let op = TickerOp::from_method(method).ok_or_else(|| {
            Error::invalid_argument(format!(
                "'{method}' is not a ticker operation, use CodeBook::call instead"
            ))
        })?;
        self.call(op, args)
    }

    /// Display name.
    ///
    /// # Errors
    ///
    /// See [`CodeBook::code_to_name`].
    pub fn name(&self) -> Result<String> {
        self.book.code_to_name(&self.code)
    }

    /// Market this code trades on.
    ///
    /// # Errors
    ///
    /// See [`CodeBook::market_kind`].
    pub fn market_kind(&self) -> Result<Market> {
        self.book.market_kind(&self.code)
    }

    /// Security type.
    ///
    /// # Errors
    ///
    /// See [`CodeBook::security_kind`].
    pub fn security_kind(&self) -> Result<SecurityKind> {
        self.book.security_kind(&self.code)
    }

    /// Listing date.
    ///
    /// # Errors
    ///
    /// See [`CodeBook::listed_date`].
    pub fn listed_date(&self) -> Result<NaiveDate> {
        self.book.listed_date(&self.code)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use parking_lot::Mutex;

    use crate::codes::CodeManager;

    /// Records calls, answers a few methods for code "A005930".
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(String, Vec<Value>)>>,
    }

    impl CodeManager for Recorder {
        fn invoke(&self, method: &str, args: &[Value]) -> Result<Value> {
            self.calls.lock().push((method.to_string(), args.to_vec()));
            match method {
                "CodeToName" => Ok(Value::from("Samsung Electronics")),
                "GetStockMarketKind" => Ok(Value::from(1)),
                "GetStockSectionKind" => Ok(Value::from(1)),
                "GetStockListedDate" => Ok(Value::from(19750611)),
                "GetTickUnit" => Ok(Value::from(100)),
                "GetStockListByMarket" => Ok(serde_json::json!(["A005930", "A000660"])),
                _ => Err(Error::invalid_argument(format!("unknown method {method}"))),
            }
        }
    }

    fn book() -> (Arc<Recorder>, CodeBook) {
        let recorder = Arc::new(Recorder::default());
        (recorder.clone(), CodeBook::new(recorder))
    }

    #[test]
    fn test_ticker_passes_code_first() {
        let (recorder, book) = book();
        let ticker = book.ticker("A005930");

        assert_eq!(ticker.call(TickerOp::TickUnit, &[Value::from(7)]).unwrap(), Value::from(100));

        let calls = recorder.calls.lock();
        assert_eq!(calls[0].0, "GetTickUnit");
        assert_eq!(calls[0].1, vec![Value::from("A005930"), Value::from(7)]);
    }

    #[test]
    fn test_ticker_typed_lookups() {
        let (_, book) = book();
        let ticker = book.ticker("A005930");

        assert_eq!(ticker.name().unwrap(), "Samsung Electronics");
        assert_eq!(ticker.market_kind().unwrap(), Market::Kospi);
        assert_eq!(ticker.security_kind().unwrap(), SecurityKind::Stock);
        assert_eq!(
            ticker.listed_date().unwrap(),
            NaiveDate::from_ymd_opt(1975, 6, 11).unwrap()
        );
    }

    #[test]
    fn test_ticker_rejects_manager_wide_methods() {
        let (recorder, book) = book();
        let ticker = book.ticker("A005930");

        let err = ticker.call_method("GetStockListByMarket", &[]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
        assert!(recorder.calls.lock().is_empty());

        assert!(ticker.call_method("GetTickUnit", &[]).is_ok());
    }

    #[test]
    fn test_book_reaches_manager_wide_methods() {
        let (_, book) = book();
        let codes = book.codes_by_market(Market::Kospi).unwrap();
        assert_eq!(codes, vec!["A005930", "A000660"]);
    }

    #[test]
    fn test_op_table_round_trips_method_names() {
        for op in TickerOp::ALL {
            assert_eq!(TickerOp::from_method(op.method()), Some(op));
        }
    }
}
