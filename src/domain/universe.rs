//! Symbol universe for multi-symbol backtesting.
//!
//! Parses symbol lists from configuration or the command line and reports
//! which symbols the data source can actually serve.

use crate::domain::error::ConfluenceError;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty symbol list")]
    Empty,

    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

/// Split a comma-separated list, trimming and uppercasing each symbol.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    if input.trim().is_empty() {
        return Err(UniverseError::Empty);
    }

    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolCoverage {
    pub symbol: String,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub bars: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UniverseSurvey {
    pub available: Vec<SymbolCoverage>,
    pub missing: Vec<String>,
}

impl UniverseSurvey {
    pub fn is_empty(&self) -> bool {
        self.available.is_empty()
    }
}

/// Look up the stored date range of each symbol.
pub fn survey_universe(
    data_port: &dyn DataPort,
    symbols: &[String],
) -> Result<UniverseSurvey, ConfluenceError> {
    let mut survey = UniverseSurvey::default();
    for symbol in symbols {
        match data_port.get_data_range(symbol)? {
            Some((first_date, last_date, bars)) => survey.available.push(SymbolCoverage {
                symbol: symbol.clone(),
                first_date,
                last_date,
                bars,
            }),
            None => {
                tracing::warn!("No data found for {}", symbol);
                survey.missing.push(symbol.clone());
            }
        }
    }
    Ok(survey)
}
