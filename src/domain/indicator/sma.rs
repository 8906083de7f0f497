//! Simple Moving Average indicator.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) values are `None`.

pub fn calculate_sma(series: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; series.len()];
    }

    let mut values = Vec::with_capacity(series.len());
    for i in 0..series.len() {
        if i + 1 < period {
            values.push(None);
        } else {
            let sum: f64 = series[i + 1 - period..=i].iter().sum();
            values.push(Some(sum / period as f64));
        }
    }

    values
}
