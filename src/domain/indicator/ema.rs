//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seed with the first close, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! No warmup: the series is defined from index 0.
//!
//! Computed as `EMA[i-1] + k*(C[i] - EMA[i-1])` so a constant series stays
//! exactly constant.

pub fn calculate_ema(series: &[f64], period: usize) -> Vec<f64> {
    let Some(&first) = series.first() else {
        return Vec::new();
    };

    let k = 2.0 / (period as f64 + 1.0);
    let mut values = Vec::with_capacity(series.len());
    let mut ema = first;
    values.push(ema);

    for &value in &series[1..] {
        ema += k * (value - ema);
        values.push(ema);
    }

    values
}
