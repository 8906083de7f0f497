//! RSI reversal out of the oversold/overbought zones.

use super::{Signal, SignalGenerator, SignalSeries};
use crate::domain::indicator::calculate_rsi;

const MIN_STRENGTH: f64 = 0.3;
const MAX_STRENGTH: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct RsiReversal {
    pub period: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl RsiReversal {
    pub fn new(period: usize, oversold: f64, overbought: f64) -> Self {
        RsiReversal {
            period,
            oversold,
            overbought,
        }
    }

    /// How deep the previous reading sat inside the oversold zone.
    fn oversold_depth(&self, prev: f64) -> f64 {
        penetration(self.oversold - prev.min(self.oversold), self.oversold)
    }

    /// How far the previous reading sat inside the overbought zone.
    fn overbought_depth(&self, prev: f64) -> f64 {
        penetration(prev.max(self.overbought) - self.overbought, 100.0 - self.overbought)
    }
}

fn penetration(depth: f64, zone_width: f64) -> f64 {
    let ratio = if zone_width > 0.0 { depth / zone_width } else { 0.0 };
    ratio.clamp(MIN_STRENGTH, MAX_STRENGTH)
}

impl SignalGenerator for RsiReversal {
    fn name(&self) -> &'static str {
        "rsi_reversal"
    }

    fn generate(&self, closes: &[f64]) -> SignalSeries {
        let rsi = calculate_rsi(closes, self.period);

        let mut signals = vec![Signal::Neutral; closes.len()];
        for i in 1..closes.len() {
            let (Some(prev), Some(curr)) = (rsi[i - 1], rsi[i]) else {
                continue;
            };

            if prev <= self.oversold && curr > self.oversold {
                signals[i] = Signal::Bullish(self.oversold_depth(prev));
            } else if prev >= self.overbought && curr < self.overbought {
                signals[i] = Signal::Bearish(self.overbought_depth(prev));
            }
        }

        signals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reversal() -> RsiReversal {
        RsiReversal::new(14, 30.0, 70.0)
    }

    #[test]
    fn depth_is_clamped_low() {
        let r = reversal();
        assert!((r.oversold_depth(29.0) - 0.3).abs() < f64::EPSILON);
        assert!((r.overbought_depth(71.0) - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn depth_scales_with_penetration() {
        let r = reversal();
        assert!((r.oversold_depth(15.0) - 0.5).abs() < 1e-12);
        assert!((r.overbought_depth(85.0) - 0.5).abs() < 1e-12);
        assert!((r.oversold_depth(0.0) - 1.0).abs() < 1e-12);
        assert!((r.overbought_depth(100.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn flat_series_has_no_events() {
        let signals = reversal().generate(&[50.0; 40]);
        assert!(signals.iter().all(|s| !s.is_event()));
    }

    #[test]
    fn warmup_bars_are_neutral() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
        let signals = reversal().generate(&closes);
        assert!(signals[..=14].iter().all(|s| !s.is_event()));
    }

    #[test]
    fn recovery_from_oversold_is_bullish() {
        // Steady decline pins RSI at 0, then a strong bounce lifts it above 30.
        let mut closes: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        closes.push(95.0);
        let signals = reversal().generate(&closes);

        let rsi = calculate_rsi(&closes, 14);
        let last = closes.len() - 1;
        assert!(rsi[last - 1].unwrap() <= 30.0);
        assert!(rsi[last].unwrap() > 30.0);
        assert_eq!(signals[last], Signal::Bullish(1.0));
    }

    #[test]
    fn breakdown_from_overbought_is_bearish() {
        let mut closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        closes.push(105.0);
        let signals = reversal().generate(&closes);

        let last = closes.len() - 1;
        assert_eq!(signals[last], Signal::Bearish(1.0));
    }
}
