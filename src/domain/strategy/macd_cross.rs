//! MACD histogram zero-cross, normalized by the histogram's own spread.

use super::{Signal, SignalGenerator, SignalSeries};
use crate::domain::indicator::calculate_macd;
use crate::domain::indicator::stddev::population_stddev;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdCross {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl MacdCross {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        MacdCross { fast, slow, signal }
    }
}

/// Population std-dev of the histogram, falling back to 1 when degenerate.
fn normalizer(histogram: &[f64]) -> f64 {
    match population_stddev(histogram) {
        Some(std) if std > 0.0 && std.is_finite() => std,
        _ => 1.0,
    }
}

impl SignalGenerator for MacdCross {
    fn name(&self) -> &'static str {
        "macd_cross"
    }

    fn generate(&self, closes: &[f64]) -> SignalSeries {
        let macd = calculate_macd(closes, self.fast, self.slow, self.signal);
        let histogram = &macd.histogram;
        let std = normalizer(histogram);

        let mut signals = vec![Signal::Neutral; closes.len()];
        for i in 1..histogram.len() {
            let prev = histogram[i - 1];
            let curr = histogram[i];
            let strength = (curr.abs() / std).min(1.0);

            if prev <= 0.0 && curr > 0.0 {
                signals[i] = Signal::Bullish(strength);
            } else if prev >= 0.0 && curr < 0.0 {
                signals[i] = Signal::Bearish(strength);
            }
        }

        signals
    }
}
