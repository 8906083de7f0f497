//! Trend-filtered moving average crossover.
//!
//! Fires on a sign change of `short SMA - long SMA`. A long-horizon trend SMA
//! (window `max(2 * long, 60)`) dampens breakouts that fight the regime.

use super::{Signal, SignalGenerator, SignalSeries};
use crate::domain::indicator::calculate_sma;

const MIN_TREND_WINDOW: usize = 60;
const STRENGTH_SCALE: f64 = 50.0;
const COUNTER_TREND_DAMPING: f64 = 0.3;

#[derive(Debug, Clone, PartialEq)]
pub struct MaCrossover {
    pub short_window: usize,
    pub long_window: usize,
}

impl MaCrossover {
    pub fn new(short_window: usize, long_window: usize) -> Self {
        MaCrossover {
            short_window,
            long_window,
        }
    }

    pub fn trend_window(&self) -> usize {
        (2 * self.long_window).max(MIN_TREND_WINDOW)
    }
}

impl SignalGenerator for MaCrossover {
    fn name(&self) -> &'static str {
        "ma_crossover"
    }

    fn generate(&self, closes: &[f64]) -> SignalSeries {
        let short = calculate_sma(closes, self.short_window);
        let long = calculate_sma(closes, self.long_window);
        let trend = calculate_sma(closes, self.trend_window());

        let mut signals = vec![Signal::Neutral; closes.len()];
        for i in 1..closes.len() {
            let (Some(s_prev), Some(l_prev), Some(s_curr), Some(l_curr)) =
                (short[i - 1], long[i - 1], short[i], long[i])
            else {
                continue;
            };

            let prev = s_prev - l_prev;
            let curr = s_curr - l_curr;
            let price = closes[i];
            let bullish = prev <= 0.0 && curr > 0.0;
            let bearish = prev >= 0.0 && curr < 0.0;
            if !bullish && !bearish {
                continue;
            }

            let mut strength = if price > 0.0 {
                (curr.abs() / price * STRENGTH_SCALE).min(1.0)
            } else {
                0.0
            };

            if let Some(trend) = trend[i] {
                let against_regime = (bullish && price < trend) || (bearish && price > trend);
                if against_regime {
                    strength *= COUNTER_TREND_DAMPING;
                }
            }

            signals[i] = if bullish {
                Signal::Bullish(strength)
            } else {
                Signal::Bearish(strength)
            };
        }

        signals
    }
}
