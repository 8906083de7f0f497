//! CSV file data adapter.
//!
//! One file per symbol at `<data_dir>/<SYMBOL>.csv`. The header must name a
//! `date` column (`YYYY-MM-DD`) and a `close` column; any other columns are
//! ignored.

use crate::domain::error::ConfluenceError;
use crate::domain::price_bar::PriceBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

const EXTENSION: &str = ".csv";

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}{}", symbol, EXTENSION))
    }

    /// Every bar in the symbol's file, sorted by date.
    fn read_all(&self, symbol: &str) -> Result<Vec<PriceBar>, ConfluenceError> {
        let path = self.csv_path(symbol);
        if !path.is_file() {
            return Err(ConfluenceError::NoData {
                symbol: symbol.to_string(),
            });
        }

        let malformed = |reason: String| ConfluenceError::DataFormat {
            symbol: symbol.to_string(),
            reason,
        };

        let content = fs::read_to_string(&path)?;
        let mut rdr = csv::Reader::from_reader(content.as_bytes());

        let headers = rdr
            .headers()
            .map_err(|e| malformed(format!("CSV header error: {}", e)))?
            .clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| malformed(format!("missing {} column", name)))
        };
        let date_col = column("date")?;
        let close_col = column("close")?;

        let mut bars = Vec::new();
        for (row, result) in rdr.records().enumerate() {
            let line = row + 2;
            let record = result.map_err(|e| malformed(format!("CSV parse error: {}", e)))?;

            let date_str = record.get(date_col).unwrap_or("").trim();
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
                .map_err(|e| malformed(format!("line {}: invalid date {:?}: {}", line, date_str, e)))?;

            let close_str = record.get(close_col).unwrap_or("").trim();
            let close: f64 = close_str
                .parse()
                .map_err(|e| malformed(format!("line {}: invalid close {:?}: {}", line, close_str, e)))?;
            if !close.is_finite() || close <= 0.0 {
                return Err(malformed(format!("line {}: close must be positive", line)));
            }

            bars.push(PriceBar::new(date, close));
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, ConfluenceError> {
        let bars = self.read_all(symbol)?;
        tracing::debug!("Read {} bars for {} from {}", bars.len(), symbol, self.base_path.display());
        Ok(bars
            .into_iter()
            .filter(|b| b.date >= start_date && b.date <= end_date)
            .collect())
    }

    fn list_symbols(&self) -> Result<Vec<String>, ConfluenceError> {
        let mut symbols = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let name = entry?.file_name();
            let name_str = name.to_string_lossy();
            if let Some(symbol) = name_str.strip_suffix(EXTENSION) {
                if !symbol.is_empty() {
                    symbols.push(symbol.to_string());
                }
            }
        }
        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, ConfluenceError> {
        let bars = match self.read_all(symbol) {
            Ok(bars) => bars,
            Err(ConfluenceError::NoData { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
            _ => None,
        })
    }
}
