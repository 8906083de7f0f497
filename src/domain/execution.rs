//! Trade execution and fill simulation.
//!
//! Fills are the day's close adjusted against the trader by the slippage
//! rate, rounded to cents. Commission is a flat rate on notional, also
//! rounded to cents.

use chrono::NaiveDate;

use super::portfolio::Portfolio;
use super::position::Position;
use super::risk::RiskLimits;
use super::trade::{Side, Trade, TradeReason};

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionConfig {
    pub commission_rate: f64,
    pub slippage_rate: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            commission_rate: 0.001,
            slippage_rate: 0.001,
        }
    }
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn buy_fill_price(close: f64, slippage_rate: f64) -> f64 {
    round_cents(close * (1.0 + slippage_rate))
}

pub fn sell_fill_price(close: f64, slippage_rate: f64) -> f64 {
    round_cents(close * (1.0 - slippage_rate))
}

pub fn calculate_commission(quantity: u64, fill_price: f64, commission_rate: f64) -> f64 {
    round_cents(quantity as f64 * fill_price * commission_rate)
}

/// Shares to buy for a fused signal: `floor(equity * |strength| * max_position_pct / close)`.
pub fn size_entry(equity: f64, strength: f64, close: f64, limits: &RiskLimits) -> u64 {
    if equity <= 0.0 || close <= 0.0 {
        return 0;
    }
    let quantity = (equity * strength.abs() * limits.max_position_pct / close).floor();
    if quantity.is_finite() && quantity > 0.0 {
        quantity as u64
    } else {
        0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    ZeroQuantity,
    PositionCap,
    ExposureCap,
    InsufficientCash,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered {
        quantity: u64,
        execution_price: f64,
        commission: f64,
    },
    Skipped(SkipReason),
}

/// A long entry for one symbol on one day.
#[derive(Debug, Clone, Copy)]
pub struct EntryOrder<'a> {
    pub slot: usize,
    pub symbol: &'a str,
    pub close: f64,
    pub date: NaiveDate,
    pub strength: f64,
}

/// Open a long position sized by signal strength.
///
/// 1. Size against current equity at the close
/// 2. Cap the position value at `max_position_pct` of equity at the fill price
/// 3. Reject if total exposure would exceed `max_total_exposure` of equity
/// 4. Reject if cost plus commission exceeds cash
pub fn enter_long(
    portfolio: &mut Portfolio,
    order: &EntryOrder<'_>,
    limits: &RiskLimits,
    config: &ExecutionConfig,
) -> EntryResult {
    let equity = portfolio.total_equity();
    let mut quantity = size_entry(equity, order.strength, order.close, limits);
    if quantity == 0 {
        return EntryResult::Skipped(SkipReason::ZeroQuantity);
    }

    let execution_price = buy_fill_price(order.close, config.slippage_rate);
    let position_cap = limits.max_position_pct * equity;
    if quantity as f64 * execution_price > position_cap {
        quantity = (position_cap / execution_price).floor().max(0.0) as u64;
        if quantity == 0 {
            return EntryResult::Skipped(SkipReason::PositionCap);
        }
    }

    let cost = quantity as f64 * execution_price;
    if portfolio.position_value() + cost > limits.max_total_exposure * equity {
        return EntryResult::Skipped(SkipReason::ExposureCap);
    }

    let commission = calculate_commission(quantity, execution_price, config.commission_rate);
    if cost + commission > portfolio.cash {
        return EntryResult::Skipped(SkipReason::InsufficientCash);
    }

    portfolio.cash -= cost + commission;
    portfolio.open_position(
        order.slot,
        Position {
            symbol: order.symbol.to_string(),
            quantity,
            avg_entry_price: execution_price,
            high_water_mark: order.close,
            last_price: execution_price,
            entry_date: order.date,
        },
    );
    portfolio.record_trade(Trade {
        date: order.date,
        symbol: order.symbol.to_string(),
        side: Side::Buy,
        quantity,
        execution_price,
        commission,
        pnl: None,
        reason: TradeReason::SignalEntry,
    });

    EntryResult::Entered {
        quantity,
        execution_price,
        commission,
    }
}

/// Sell the whole position in `slot` at the close. Returns the recorded trade,
/// or `None` when the slot is flat.
pub fn exit_position(
    portfolio: &mut Portfolio,
    slot: usize,
    close: f64,
    date: NaiveDate,
    reason: TradeReason,
    config: &ExecutionConfig,
) -> Option<Trade> {
    let position = portfolio.close_position(slot)?;

    let execution_price = sell_fill_price(close, config.slippage_rate);
    let commission = calculate_commission(position.quantity, execution_price, config.commission_rate);
    let proceeds = position.quantity as f64 * execution_price;
    let pnl = (execution_price - position.avg_entry_price) * position.quantity as f64 - commission;

    portfolio.cash += proceeds - commission;

    let trade = Trade {
        date,
        symbol: position.symbol,
        side: Side::Sell,
        quantity: position.quantity,
        execution_price,
        commission,
        pnl: Some(pnl),
        reason,
    };
    portfolio.record_trade(trade.clone());
    Some(trade)
}
