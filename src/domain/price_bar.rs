//! Daily price bar representation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub close: f64,
}

impl PriceBar {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        PriceBar { date, close }
    }
}

/// Extract the closing prices of a bar slice, preserving order.
pub fn closes(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Keep only bars dated within `[start, end]` (inclusive).
pub fn within_range(bars: Vec<PriceBar>, start: NaiveDate, end: NaiveDate) -> Vec<PriceBar> {
    bars.into_iter()
        .filter(|b| b.date >= start && b.date <= end)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn closes_preserves_order() {
        let bars = vec![
            PriceBar::new(d(1), 10.0),
            PriceBar::new(d(2), 11.5),
            PriceBar::new(d(3), 9.25),
        ];
        assert_eq!(closes(&bars), vec![10.0, 11.5, 9.25]);
    }

    #[test]
    fn within_range_is_inclusive() {
        let bars = (1..=5).map(|i| PriceBar::new(d(i), i as f64)).collect();
        let kept = within_range(bars, d(2), d(4));
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[0].date, d(2));
        assert_eq!(kept[2].date, d(4));
    }
}
