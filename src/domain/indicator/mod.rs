//! Technical indicator implementations.
//!
//! Every indicator is a pure function over a slice of closing prices and
//! returns a vector aligned index-for-index with its input:
//! - `calculate_sma`: `None` during warmup
//! - `calculate_ema`: defined from index 0 (seeded with the first close)
//! - `calculate_rsi`: Wilder smoothing, `None` for the first `period` indices
//! - `calculate_macd`: line, signal and histogram, all defined from index 0
//!
//! `IndicatorType` names an indicator with its parameters and is used as a
//! label when indicator series are exported for charting.

pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stddev;

pub use ema::calculate_ema;
pub use macd::{calculate_macd, MacdSeries};
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Rsi(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_type_display_sma() {
        assert_eq!(IndicatorType::Sma(20).to_string(), "SMA(20)");
    }

    #[test]
    fn indicator_type_display_rsi() {
        assert_eq!(IndicatorType::Rsi(14).to_string(), "RSI(14)");
    }

    #[test]
    fn indicator_type_display_macd() {
        let macd = IndicatorType::Macd {
            fast: 12,
            slow: 26,
            signal: 9,
        };
        assert_eq!(macd.to_string(), "MACD(12,26,9)");
    }

    #[test]
    fn indicator_type_hash_eq() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(IndicatorType::Sma(10), "short");
        map.insert(IndicatorType::Sma(30), "long");

        assert_eq!(map.get(&IndicatorType::Sma(10)), Some(&"short"));
        assert_eq!(map.get(&IndicatorType::Sma(30)), Some(&"long"));
        assert_eq!(map.get(&IndicatorType::Rsi(10)), None);
    }
}
