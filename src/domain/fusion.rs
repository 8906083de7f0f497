//! Weighted fusion of the per-strategy signals for one symbol on one bar.
//!
//! Strategy events are sparse, so fusion looks back up to `LOOKBACK_BARS`
//! bars (today included) for each strategy's most recent event. The combined
//! value is normalized by the weight that actually contributed.

use super::strategy::{Signal, STRATEGY_COUNT};

/// Today plus four prior bars.
pub const LOOKBACK_BARS: usize = 5;

/// Scan stops once contributed weight is this close to the full weight.
pub const WEIGHT_TOLERANCE: f64 = 0.01;

/// Minimum number of agreeing strategies for a tradable signal.
pub const MIN_CONSENSUS_VOTES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FusedSignal {
    /// Weighted mean of the contributing scalars, in `[-1, 1]`.
    pub combined: f64,
    pub bullish_votes: usize,
    pub bearish_votes: usize,
    /// Total weight of the strategies that contributed.
    pub contributed_weight: f64,
}

impl FusedSignal {
    pub fn has_consensus(&self) -> bool {
        (self.bullish_votes >= MIN_CONSENSUS_VOTES && self.combined > 0.0)
            || (self.bearish_votes >= MIN_CONSENSUS_VOTES && self.combined < 0.0)
    }

    pub fn is_actionable(&self, threshold: f64) -> bool {
        self.combined.abs() >= threshold && self.has_consensus()
    }

    pub fn is_bullish(&self) -> bool {
        self.combined > 0.0
    }

    pub fn is_bearish(&self) -> bool {
        self.combined < 0.0
    }
}

/// Fuse the strategies' signals at bar `index` of one symbol.
///
/// Offsets are walked outermost so that the early stop fires at the first
/// offset by which enough weight has accumulated. Indices before the first bar
/// clamp to bar 0.
pub fn fuse(
    signals: [&[Signal]; STRATEGY_COUNT],
    weights: [f64; STRATEGY_COUNT],
    index: usize,
) -> FusedSignal {
    let full_weight: f64 = weights.iter().sum();
    let mut contributed = [false; STRATEGY_COUNT];
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    let mut bullish_votes = 0;
    let mut bearish_votes = 0;

    'lookback: for offset in 0..LOOKBACK_BARS {
        let bar = index.saturating_sub(offset);
        for (k, series) in signals.iter().enumerate() {
            if contributed[k] {
                continue;
            }
            let Some(signal) = series.get(bar) else {
                continue;
            };
            match signal {
                Signal::Neutral => continue,
                Signal::Bullish(_) => bullish_votes += 1,
                Signal::Bearish(_) => bearish_votes += 1,
            }
            contributed[k] = true;
            weighted_sum += signal.scalar() * weights[k];
            total_weight += weights[k];

            if total_weight >= full_weight - WEIGHT_TOLERANCE {
                break 'lookback;
            }
        }
    }

    let combined = if total_weight > 0.0 {
        (weighted_sum / total_weight).clamp(-1.0, 1.0)
    } else {
        0.0
    };

    FusedSignal {
        combined,
        bullish_votes,
        bearish_votes,
        contributed_weight: total_weight,
    }
}
