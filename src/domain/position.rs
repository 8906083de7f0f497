//! Open long position for a single symbol.

use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: u64,
    pub avg_entry_price: f64,
    /// Highest close seen since entry, seeded with the entry-day close.
    pub high_water_mark: f64,
    pub last_price: f64,
    pub entry_date: NaiveDate,
}

impl Position {
    pub fn market_value(&self) -> f64 {
        self.quantity as f64 * self.last_price
    }

    pub fn unrealized_pnl(&self) -> f64 {
        self.quantity as f64 * (self.last_price - self.avg_entry_price)
    }

    /// Mark to the day's close and raise the high-water mark if needed.
    pub fn mark(&mut self, price: f64) {
        self.last_price = price;
        if price > self.high_water_mark {
            self.high_water_mark = price;
        }
    }

    /// Fractional gain of `price` over the entry price.
    pub fn gain_from_entry(&self, price: f64) -> f64 {
        (price - self.avg_entry_price) / self.avg_entry_price
    }

    /// Fractional pullback of `price` from the high-water mark.
    pub fn pullback_from_peak(&self, price: f64) -> f64 {
        (self.high_water_mark - price) / self.high_water_mark
    }
}
