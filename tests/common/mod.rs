#![allow(dead_code)]

use chrono::NaiveDate;
use confluence::domain::backtest::BacktestConfig;
use confluence::domain::error::ConfluenceError;
pub use confluence::domain::price_bar::PriceBar;
use confluence::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, ConfluenceError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(ConfluenceError::DataFormat {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        match self.data.get(symbol) {
            Some(bars) => Ok(bars
                .iter()
                .filter(|b| b.date >= start_date && b.date <= end_date)
                .copied()
                .collect()),
            None => Err(ConfluenceError::NoData {
                symbol: symbol.to_string(),
            }),
        }
    }

    fn list_symbols(&self) -> Result<Vec<String>, ConfluenceError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, ConfluenceError> {
        match self.data.get(symbol) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.date).min().unwrap();
                let max = bars.iter().map(|b| b.date).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Consecutive calendar days from `start`, one bar per close.
pub fn bars_from(start: NaiveDate, closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar::new(start + chrono::Duration::days(i as i64), close))
        .collect()
}

pub fn flat_closes(count: usize, price: f64) -> Vec<f64> {
    vec![price; count]
}

/// `flat` bars at 100 followed by `rising` bars climbing one per day.
pub fn flat_then_rising(flat: usize, rising: usize) -> Vec<f64> {
    let mut closes = vec![100.0; flat];
    closes.extend((1..=rising).map(|i| 100.0 + i as f64));
    closes
}

pub fn sample_config(symbols: &[&str]) -> BacktestConfig {
    let mut config = BacktestConfig::new(
        symbols.iter().map(|s| s.to_string()).collect(),
        date(2024, 1, 1),
        date(2024, 12, 31),
    );
    config.initial_capital = 100_000.0;
    config.signal_threshold = 0.01;
    config
}
