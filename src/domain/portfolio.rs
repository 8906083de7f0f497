//! Portfolio state and equity tracking.
//!
//! Positions live in one slot per symbol, indexed the same way as the
//! symbols supplied to the simulation, so there is at most one per symbol.

use chrono::NaiveDate;
use serde::Serialize;

use super::position::Position;
use super::trade::Trade;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
    pub cash: f64,
    pub position_value: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolSlot {
    pub position: Option<Position>,
    /// Timeline index of the most recent fill for this symbol.
    pub last_trade_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub peak_equity: f64,
    pub slots: Vec<SymbolSlot>,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_capital: f64, symbol_count: usize) -> Self {
        Portfolio {
            cash: initial_capital,
            initial_capital,
            peak_equity: initial_capital,
            slots: vec![SymbolSlot::default(); symbol_count],
            trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn position(&self, slot: usize) -> Option<&Position> {
        self.slots.get(slot).and_then(|s| s.position.as_ref())
    }

    pub fn position_mut(&mut self, slot: usize) -> Option<&mut Position> {
        self.slots.get_mut(slot).and_then(|s| s.position.as_mut())
    }

    pub fn has_position(&self, slot: usize) -> bool {
        self.position(slot).is_some()
    }

    pub fn open_position(&mut self, slot: usize, position: Position) {
        if let Some(s) = self.slots.get_mut(slot) {
            s.position = Some(position);
        }
    }

    pub fn close_position(&mut self, slot: usize) -> Option<Position> {
        self.slots.get_mut(slot).and_then(|s| s.position.take())
    }

    pub fn position_count(&self) -> usize {
        self.slots.iter().filter(|s| s.position.is_some()).count()
    }

    pub fn last_trade_index(&self, slot: usize) -> Option<usize> {
        self.slots.get(slot).and_then(|s| s.last_trade_index)
    }

    pub fn mark_traded(&mut self, slot: usize, day_index: usize) {
        if let Some(s) = self.slots.get_mut(slot) {
            s.last_trade_index = Some(day_index);
        }
    }

    pub fn record_trade(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    pub fn position_value(&self) -> f64 {
        self.slots
            .iter()
            .filter_map(|s| s.position.as_ref())
            .map(Position::market_value)
            .sum()
    }

    pub fn unrealized_pnl(&self) -> f64 {
        self.slots
            .iter()
            .filter_map(|s| s.position.as_ref())
            .map(Position::unrealized_pnl)
            .sum()
    }

    /// Cash plus every open position at its last known price.
    pub fn total_equity(&self) -> f64 {
        self.cash + self.position_value()
    }

    /// Fractional decline of current equity below the running peak.
    pub fn drawdown(&self) -> f64 {
        if self.peak_equity <= 0.0 {
            return 0.0;
        }
        ((self.peak_equity - self.total_equity()) / self.peak_equity).max(0.0)
    }

    pub fn record_equity(&mut self, date: NaiveDate) {
        let position_value = self.position_value();
        let equity = self.cash + position_value;
        if equity > self.peak_equity {
            self.peak_equity = equity;
        }
        self.equity_curve.push(EquityPoint {
            date,
            equity,
            cash: self.cash,
            position_value,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_position(symbol: &str, quantity: u64, price: f64) -> Position {
        Position {
            symbol: symbol.to_string(),
            quantity,
            avg_entry_price: 100.0,
            high_water_mark: price,
            last_price: price,
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn new_portfolio() {
        let portfolio = Portfolio::new(100000.0, 2);
        assert!((portfolio.cash - 100000.0).abs() < f64::EPSILON);
        assert!((portfolio.initial_capital - 100000.0).abs() < f64::EPSILON);
        assert_eq!(portfolio.slots.len(), 2);
        assert_eq!(portfolio.position_count(), 0);
        assert!(portfolio.trades.is_empty());
        assert!(portfolio.equity_curve.is_empty());
    }

    #[test]
    fn open_and_close_position() {
        let mut portfolio = Portfolio::new(100000.0, 2);
        portfolio.open_position(1, sample_position("MSFT", 10, 100.0));

        assert!(portfolio.has_position(1));
        assert!(!portfolio.has_position(0));
        assert_eq!(portfolio.position(1).unwrap().quantity, 10);

        let closed = portfolio.close_position(1);
        assert!(closed.is_some());
        assert!(!portfolio.has_position(1));
        assert!(portfolio.close_position(1).is_none());
    }

    #[test]
    fn out_of_range_slot_is_ignored() {
        let mut portfolio = Portfolio::new(1000.0, 1);
        portfolio.open_position(5, sample_position("X", 1, 1.0));
        portfolio.mark_traded(5, 3);
        assert_eq!(portfolio.position_count(), 0);
        assert_eq!(portfolio.last_trade_index(5), None);
    }

    #[test]
    fn last_trade_index_tracking() {
        let mut portfolio = Portfolio::new(1000.0, 1);
        assert_eq!(portfolio.last_trade_index(0), None);
        portfolio.mark_traded(0, 7);
        assert_eq!(portfolio.last_trade_index(0), Some(7));
    }

    #[test]
    fn total_equity_marks_positions() {
        let mut portfolio = Portfolio::new(50000.0, 2);
        portfolio.cash = 30000.0;
        portfolio.open_position(0, sample_position("AAPL", 100, 110.0));
        portfolio.open_position(1, sample_position("MSFT", 50, 90.0));

        let expected = 30000.0 + 100.0 * 110.0 + 50.0 * 90.0;
        assert!((portfolio.total_equity() - expected).abs() < f64::EPSILON);
        let unrealized = 100.0 * 10.0 + 50.0 * -10.0;
        assert!((portfolio.unrealized_pnl() - unrealized).abs() < f64::EPSILON);
    }

    #[test]
    fn record_equity_splits_cash_and_positions() {
        let mut portfolio = Portfolio::new(10000.0, 1);
        portfolio.cash = 9000.0;
        portfolio.open_position(0, sample_position("AAPL", 10, 120.0));
        portfolio.record_equity(date(2));

        let point = &portfolio.equity_curve[0];
        assert_eq!(point.date, date(2));
        assert!((point.cash - 9000.0).abs() < f64::EPSILON);
        assert!((point.position_value - 1200.0).abs() < f64::EPSILON);
        assert!((point.equity - 10200.0).abs() < f64::EPSILON);
        assert!((portfolio.peak_equity - 10200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn drawdown_from_peak() {
        let mut portfolio = Portfolio::new(10000.0, 1);
        portfolio.record_equity(date(1));
        portfolio.cash = 9000.0;
        assert!((portfolio.drawdown() - 0.1).abs() < 1e-12);
        portfolio.cash = 11000.0;
        assert_eq!(portfolio.drawdown(), 0.0);
    }
}
