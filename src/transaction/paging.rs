//! Chart-style paging strategies.
//!
//! The provider caps rows per round trip and returns them newest first, so
//! the earliest date of a page is in its last row. Two strategies are kept
//! apart because they bound a request differently:
//!
//! | Pager | Bound | Between pages |
//! |-------|-------|---------------|
//! | [`CountPager`] | number of records | shrinks the count, moves the end date before the earliest seen |
//! | [`TermPager`] | beginning date | nothing; follows the provider's continuation |
//!
//! Dates travel as `YYYYMMDD` integers.

// ============================================================================
// Imports
// ============================================================================

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::provider::{Provider, value_as_i64};

use super::query::Pager;

// ============================================================================
// Date Helpers
// ============================================================================

/// Parses a `YYYYMMDD` integer.
///
/// # Errors
///
/// Returns [`Error::UnexpectedValue`] if `raw` is not a calendar date.
pub fn date_from_int(raw: i64) -> Result<NaiveDate> {
    let invalid = || Error::unexpected_value("date", Value::from(raw));
    let year = i32::try_from(raw / 10_000).map_err(|_| invalid())?;
    let month = u32::try_from(raw / 100 % 100).map_err(|_| invalid())?;
    let day = u32::try_from(raw % 100).map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

/// Formats a date as a `YYYYMMDD` integer.
#[must_use]
pub fn date_to_int(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 10_000 + i64::from(date.month()) * 100 + i64::from(date.day())
}

// ============================================================================
// PagingFields
// ============================================================================

/// Field ids the pagers read and rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingFields {
    /// Header field holding the row count of the last response.
    pub rows_header: i32,
    /// Input field holding the requested record count.
    pub count_input: i32,
    /// Input field holding the inclusive end date.
    pub end_date_input: i32,
    /// Data column holding each row's date.
    pub date_column: i32,
}

impl Default for PagingFields {
    fn default() -> Self {
        Self::CHART
    }
}

impl PagingFields {
    /// Layout of the provider's chart product.
    pub const CHART: Self = Self {
        rows_header: 3,
        count_input: 4,
        end_date_input: 2,
        date_column: 0,
    };

    /// Row count of the last response.
    fn rows(&self, provider: &dyn Provider) -> Result<i64> {
        value_as_i64("row count", &provider.get_header_value(self.rows_header)?)
    }

    /// Date of the last of `rows` rows.
    fn earliest_date(&self, provider: &dyn Provider, rows: i64) -> Result<NaiveDate> {
        let last = i32::try_from(rows - 1)
            .map_err(|_| Error::unexpected_value("row count", Value::from(rows)))?;
        let raw = value_as_i64("row date", &provider.get_data_value(self.date_column, last)?)?;
        date_from_int(raw)
    }
}

// ============================================================================
// CountPager
// ============================================================================

/// Pages until a requested number of records has been delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountPager {
    remaining: i64,
    fields: PagingFields,
}

impl CountPager {
    /// Creates a pager owing `requested` records, with the chart layout.
    #[must_use]
    pub fn new(requested: u64) -> Self {
        Self::with_fields(requested, PagingFields::default())
    }

    /// Creates a pager with a custom field layout.
    #[must_use]
    pub fn with_fields(requested: u64, fields: PagingFields) -> Self {
        Self {
            remaining: i64::try_from(requested).unwrap_or(i64::MAX),
            fields,
        }
    }
}

impl Pager for CountPager {
    fn has_more(&mut self, provider: &dyn Provider) -> Result<bool> {
        let rows = self.fields.rows(provider)?;
        if rows <= 0 {
            return Ok(false);
        }
        self.remaining -= rows;

        let more = self.remaining > 0 && provider.has_continue();

        // Final round trip: ask for exactly what is left, ending before the
        // earliest row already delivered.
        if more && self.remaining < rows {
            let earliest = self.fields.earliest_date(provider, rows)?;
            let end = earliest
                .pred_opt()
                .ok_or_else(|| Error::unexpected_value("row date", Value::from(date_to_int(earliest))))?;

            provider.set_input_value(self.fields.count_input, Value::from(self.remaining))?;
            provider.set_input_value(self.fields.end_date_input, Value::from(date_to_int(end)))?;
            debug!(remaining = self.remaining, end = %end, "Narrowed last page");
        }

        Ok(more)
    }

    fn remaining(&self) -> Option<u64> {
        Some(u64::try_from(self.remaining).unwrap_or(0))
    }
}

// ============================================================================
// TermPager
// ============================================================================

/// Pages until the response reaches back to a beginning date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermPager {
    begin: NaiveDate,
    fields: PagingFields,
}

impl TermPager {
    /// Creates a pager for a range starting at `begin`, with the chart layout.
    #[must_use]
    pub fn new(begin: NaiveDate) -> Self {
        Self::with_fields(begin, PagingFields::default())
    }

    /// Creates a pager with a custom field layout.
    #[must_use]
    pub fn with_fields(begin: NaiveDate, fields: PagingFields) -> Self {
        Self { begin, fields }
    }
}

impl Pager for TermPager {
    fn has_more(&mut self, provider: &dyn Provider) -> Result<bool> {
        let rows = self.fields.rows(provider)?;
        if rows <= 0 {
            return Ok(false);
        }
        let earliest = self.fields.earliest_date(provider, rows)?;
        Ok(self.begin < earliest && provider.has_continue())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use parking_lot::Mutex;
    use rustc_hash::FxHashMap;

    use crate::provider::EventPort;

    /// One canned response.
    #[derive(Default)]
    struct Canned {
        rows: i64,
        dates: Vec<i64>,
        more: bool,
        inputs: Mutex<FxHashMap<i32, Value>>,
    }

    impl Provider for Canned {
        fn set_input_value(&self, field: i32, value: Value) -> Result<()> {
            self.inputs.lock().insert(field, value);
            Ok(())
        }

        fn get_header_value(&self, field: i32) -> Result<Value> {
            Ok(if field == 3 { Value::from(self.rows) } else { Value::Null })
        }

        fn get_data_value(&self, _column: i32, row: i32) -> Result<Value> {
            Ok(Value::from(self.dates[row as usize]))
        }

        fn request(&self) -> Result<()> {
            Ok(())
        }

        fn block_request(&self) -> Result<()> {
            Ok(())
        }

        fn dib_status(&self) -> i32 {
            0
        }

        fn has_continue(&self) -> bool {
            self.more
        }

        fn advise(&self, _port: EventPort) -> Result<()> {
            Ok(())
        }

        fn unadvise(&self, _port: &EventPort) -> Result<()> {
            Ok(())
        }
    }

    fn page(dates: &[i64], more: bool) -> Canned {
        Canned {
            rows: dates.len() as i64,
            dates: dates.to_vec(),
            more,
            ..Default::default()
        }
    }

    #[test]
    fn test_date_conversion() {
        let date = date_from_int(20240301).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(date_to_int(date.pred_opt().unwrap()), 20240229);
        assert!(date_from_int(20241332).is_err());
    }

    #[test]
    fn test_count_pager_stops_on_empty_page() {
        let mut pager = CountPager::new(10);
        assert!(!pager.has_more(&page(&[], true)).unwrap());
        assert_eq!(pager.remaining(), Some(10));
    }

    #[test]
    fn test_count_pager_continues_without_rewriting() {
        let mut pager = CountPager::new(10);
        let response = page(&[20240105, 20240104, 20240103], true);
        assert!(pager.has_more(&response).unwrap());
        assert_eq!(pager.remaining(), Some(7));
        assert!(response.inputs.lock().is_empty());
    }

    #[test]
    fn test_count_pager_narrows_last_page() {
        let mut pager = CountPager::new(5);
        let response = page(&[20240302, 20240301, 20240229], true);
        assert!(pager.has_more(&response).unwrap());

        let inputs = response.inputs.lock();
        assert_eq!(inputs.get(&4), Some(&Value::from(2)));
        assert_eq!(inputs.get(&2), Some(&Value::from(20240228)));
    }

    #[test]
    fn test_count_pager_respects_continue_flag() {
        let mut pager = CountPager::new(100);
        assert!(!pager.has_more(&page(&[20240105], false)).unwrap());
    }

    #[test]
    fn test_count_pager_exhausted() {
        let mut pager = CountPager::new(2);
        assert!(!pager.has_more(&page(&[20240105, 20240104], true)).unwrap());
        assert_eq!(pager.remaining(), Some(0));
    }

    #[test]
    fn test_term_pager_compares_begin_date() {
        let begin = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let mut pager = TermPager::new(begin);

        assert!(pager.has_more(&page(&[20240110, 20240105], true)).unwrap());
        assert!(!pager.has_more(&page(&[20240104, 20240103], true)).unwrap());
        assert!(!pager.has_more(&page(&[20240110, 20240105], false)).unwrap());
        assert_eq!(pager.remaining(), None);
    }
}
