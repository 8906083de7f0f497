//! Market data port trait.
//!
//! Read-only source of daily bars per symbol.

use crate::domain::error::ConfluenceError;
use crate::domain::price_bar::PriceBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `symbol` dated within `[start_date, end_date]`, oldest first.
    /// Returns `ConfluenceError::NoData` when the symbol is unknown.
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, ConfluenceError>;

    fn list_symbols(&self) -> Result<Vec<String>, ConfluenceError>;

    /// First date, last date and bar count, or `None` for an unknown symbol.
    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, ConfluenceError>;
}
