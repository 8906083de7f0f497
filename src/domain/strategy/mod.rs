//! Strategy signal generators.
//!
//! Each generator scans a symbol's full close series once and emits a dense
//! `SignalSeries` aligned index-for-index with the bars: `Neutral` everywhere
//! except on the bars where its event fires.

pub mod ma_crossover;
pub mod macd_cross;
pub mod rsi_reversal;

pub use ma_crossover::MaCrossover;
pub use macd_cross::MacdCross;
pub use rsi_reversal::RsiReversal;

use crate::domain::indicator::{macd, rsi};
use serde::Serialize;

/// Per-bar output of a strategy. Strength is in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(tag = "direction", content = "strength", rename_all = "snake_case")]
pub enum Signal {
    Bullish(f64),
    Bearish(f64),
    #[default]
    Neutral,
}

impl Signal {
    /// Signed view: `+s`, `-s` or `0`.
    pub fn scalar(&self) -> f64 {
        match self {
            Signal::Bullish(s) => *s,
            Signal::Bearish(s) => -*s,
            Signal::Neutral => 0.0,
        }
    }

    pub fn is_event(&self) -> bool {
        !matches!(self, Signal::Neutral)
    }

    pub fn is_bullish(&self) -> bool {
        matches!(self, Signal::Bullish(_))
    }

    pub fn is_bearish(&self) -> bool {
        matches!(self, Signal::Bearish(_))
    }
}

pub type SignalSeries = Vec<Signal>;

pub trait SignalGenerator {
    fn name(&self) -> &'static str;

    fn generate(&self, closes: &[f64]) -> SignalSeries;
}

/// Number of strategies fused per symbol.
pub const STRATEGY_COUNT: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyParams {
    pub ma_short_window: usize,
    pub ma_long_window: usize,
    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub ma_weight: f64,
    pub rsi_weight: f64,
    pub macd_weight: f64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        StrategyParams {
            ma_short_window: 10,
            ma_long_window: 30,
            rsi_period: rsi::DEFAULT_PERIOD,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            macd_fast: macd::DEFAULT_FAST,
            macd_slow: macd::DEFAULT_SLOW,
            macd_signal: macd::DEFAULT_SIGNAL,
            ma_weight: 0.4,
            rsi_weight: 0.3,
            macd_weight: 0.3,
        }
    }
}

impl StrategyParams {
    /// Weights in strategy order: MA, RSI, MACD.
    pub fn weights(&self) -> [f64; STRATEGY_COUNT] {
        [self.ma_weight, self.rsi_weight, self.macd_weight]
    }
}

/// The three generators in fixed order: MA, RSI, MACD.
#[derive(Debug, Clone)]
pub struct StrategySet {
    pub ma: MaCrossover,
    pub rsi: RsiReversal,
    pub macd: MacdCross,
}

impl StrategySet {
    pub fn from_params(params: &StrategyParams) -> Self {
        StrategySet {
            ma: MaCrossover::new(params.ma_short_window, params.ma_long_window),
            rsi: RsiReversal::new(params.rsi_period, params.rsi_oversold, params.rsi_overbought),
            macd: MacdCross::new(params.macd_fast, params.macd_slow, params.macd_signal),
        }
    }

    pub fn generators(&self) -> [&dyn SignalGenerator; STRATEGY_COUNT] {
        [&self.ma, &self.rsi, &self.macd]
    }

    pub fn generate_all(&self, closes: &[f64]) -> [SignalSeries; STRATEGY_COUNT] {
        self.generators().map(|g| g.generate(closes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_view() {
        assert!((Signal::Bullish(0.6).scalar() - 0.6).abs() < f64::EPSILON);
        assert!((Signal::Bearish(0.6).scalar() + 0.6).abs() < f64::EPSILON);
        assert_eq!(Signal::Neutral.scalar(), 0.0);
    }

    #[test]
    fn zero_strength_is_still_an_event() {
        assert!(Signal::Bullish(0.0).is_event());
        assert!(!Signal::Neutral.is_event());
    }

    #[test]
    fn default_params() {
        let p = StrategyParams::default();
        assert_eq!(p.ma_short_window, 10);
        assert_eq!(p.ma_long_window, 30);
        assert_eq!(p.rsi_period, 14);
        assert_eq!(p.weights(), [0.4, 0.3, 0.3]);
    }

    #[test]
    fn generate_all_aligns_with_input() {
        let closes: Vec<f64> = (0..80).map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0).collect();
        let set = StrategySet::from_params(&StrategyParams::default());
        let series = set.generate_all(&closes);
        for s in &series {
            assert_eq!(s.len(), closes.len());
        }
    }

    #[test]
    fn generator_names_in_fixed_order() {
        let set = StrategySet::from_params(&StrategyParams::default());
        let names: Vec<&str> = set.generators().iter().map(|g| g.name()).collect();
        assert_eq!(names, vec!["ma_crossover", "rsi_reversal", "macd_cross"]);
    }

    #[test]
    fn signal_serializes_with_direction_tag() {
        let json = serde_json::to_string(&Signal::Bullish(0.5)).unwrap();
        assert_eq!(json, r#"{"direction":"bullish","strength":0.5}"#);
        let json = serde_json::to_string(&Signal::Neutral).unwrap();
        assert_eq!(json, r#"{"direction":"neutral"}"#);
    }
}
