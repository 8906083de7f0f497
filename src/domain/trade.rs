//! Append-only trade ledger entries.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeReason {
    SignalEntry,
    SignalExit,
    StopLoss,
    TrailingStop,
    TakeProfit,
}

impl fmt::Display for TradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TradeReason::SignalEntry => "signal_entry",
            TradeReason::SignalExit => "signal_exit",
            TradeReason::StopLoss => "stop_loss",
            TradeReason::TrailingStop => "trailing_stop",
            TradeReason::TakeProfit => "take_profit",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub date: NaiveDate,
    pub symbol: String,
    pub side: Side,
    pub quantity: u64,
    pub execution_price: f64,
    pub commission: f64,
    /// Realized pnl, net of the sell commission. `None` for buys.
    pub pnl: Option<f64>,
    pub reason: TradeReason,
}

impl Trade {
    pub fn notional(&self) -> f64 {
        self.quantity as f64 * self.execution_price
    }
}
