//! Per-symbol bars with precomputed strategy signals, and the unified timeline.

use crate::domain::price_bar::{closes, PriceBar};
use crate::domain::strategy::{Signal, SignalSeries, StrategySet, STRATEGY_COUNT};
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone)]
pub struct SymbolData {
    pub symbol: String,
    pub bars: Vec<PriceBar>,
    /// Signal series per strategy, in strategy order.
    pub signals: [SignalSeries; STRATEGY_COUNT],
    pub date_index: HashMap<NaiveDate, usize>,
}

impl SymbolData {
    pub fn new(symbol: String, bars: Vec<PriceBar>, strategies: &StrategySet) -> Self {
        let date_index = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.date, i))
            .collect();
        let signals = strategies.generate_all(&closes(&bars));
        Self {
            symbol,
            bars,
            signals,
            date_index,
        }
    }

    pub fn bar_count(&self) -> usize {
        self.bars.len()
    }

    pub fn get_bar(&self, date: NaiveDate) -> Option<&PriceBar> {
        self.date_index.get(&date).map(|&i| &self.bars[i])
    }

    pub fn get_bar_index(&self, date: NaiveDate) -> Option<usize> {
        self.date_index.get(&date).copied()
    }

    pub fn signal_slices(&self) -> [&[Signal]; STRATEGY_COUNT] {
        self.signals.each_ref().map(Vec::as_slice)
    }
}

/// Sorted union of every symbol's dates.
pub fn build_unified_timeline(symbols: &[SymbolData]) -> Vec<NaiveDate> {
    let unique_dates: BTreeSet<NaiveDate> = symbols
        .iter()
        .flat_map(|sd| sd.bars.iter().map(|bar| bar.date))
        .collect();
    unique_dates.into_iter().collect()
}
