//! Risk limits and the per-position exit checks.

use super::position::Position;
use super::trade::TradeReason;

#[derive(Debug, Clone, PartialEq)]
pub struct RiskLimits {
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub trailing_activation_pct: f64,
    pub trailing_stop_pct: f64,
    pub max_position_pct: f64,
    pub max_total_exposure: f64,
    /// 0 disables the drawdown halt.
    pub max_drawdown_pct: f64,
    pub cooldown_days: usize,
}

impl Default for RiskLimits {
    fn default() -> Self {
        RiskLimits {
            stop_loss_pct: 0.07,
            take_profit_pct: 0.10,
            trailing_activation_pct: 0.03,
            trailing_stop_pct: 0.05,
            max_position_pct: 0.25,
            max_total_exposure: 1.0,
            max_drawdown_pct: 0.0,
            cooldown_days: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskExit {
    StopLoss,
    TrailingStop,
    TakeProfit,
}

impl From<RiskExit> for TradeReason {
    fn from(exit: RiskExit) -> Self {
        match exit {
            RiskExit::StopLoss => TradeReason::StopLoss,
            RiskExit::TrailingStop => TradeReason::TrailingStop,
            RiskExit::TakeProfit => TradeReason::TakeProfit,
        }
    }
}

/// First matching exit in priority order: stop-loss, trailing stop, take-profit.
///
/// Expects the position's high-water mark to already include `price`.
pub fn check_exit(position: &Position, price: f64, limits: &RiskLimits) -> Option<RiskExit> {
    if position.avg_entry_price <= 0.0 {
        return None;
    }

    let gain = position.gain_from_entry(price);
    if -gain >= limits.stop_loss_pct {
        return Some(RiskExit::StopLoss);
    }

    if position.high_water_mark > 0.0
        && position.gain_from_entry(position.high_water_mark) >= limits.trailing_activation_pct
        && position.pullback_from_peak(price) >= limits.trailing_stop_pct
    {
        return Some(RiskExit::TrailingStop);
    }

    if gain >= limits.take_profit_pct {
        return Some(RiskExit::TakeProfit);
    }

    None
}

/// True while fewer than `cooldown_days` timeline days have passed since the
/// symbol's last fill.
pub fn in_cooldown(last_trade_index: Option<usize>, today: usize, cooldown_days: usize) -> bool {
    match last_trade_index {
        Some(last) => today.saturating_sub(last) < cooldown_days,
        None => false,
    }
}

/// True when new signal trades are suspended for the day.
pub fn drawdown_halted(drawdown: f64, limits: &RiskLimits) -> bool {
    limits.max_drawdown_pct > 0.0 && drawdown >= limits.max_drawdown_pct
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn position_at(entry: f64, hwm: f64) -> Position {
        Position {
            symbol: "AAPL".into(),
            quantity: 10,
            avg_entry_price: entry,
            high_water_mark: hwm,
            last_price: hwm,
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        }
    }

    #[test]
    fn default_limits() {
        let l = RiskLimits::default();
        assert!((l.stop_loss_pct - 0.07).abs() < f64::EPSILON);
        assert!((l.take_profit_pct - 0.10).abs() < f64::EPSILON);
        assert!((l.max_position_pct - 0.25).abs() < f64::EPSILON);
        assert_eq!(l.cooldown_days, 10);
    }

    #[test]
    fn stop_loss_triggers_at_threshold() {
        let limits = RiskLimits::default();
        let pos = position_at(100.0, 100.0);
        assert_eq!(check_exit(&pos, 92.0, &limits), Some(RiskExit::StopLoss));
        assert_eq!(check_exit(&pos, 94.0, &limits), None);
    }

    #[test]
    fn take_profit_triggers_at_threshold() {
        let limits = RiskLimits::default();
        let pos = position_at(100.0, 111.0);
        // hwm 111 and price 111: no pullback, so take-profit wins.
        assert_eq!(check_exit(&pos, 111.0, &limits), Some(RiskExit::TakeProfit));
    }

    #[test]
    fn trailing_stop_needs_activation() {
        let limits = RiskLimits::default();
        // Peak only 2% above entry: trailing not armed.
        let pos = position_at(100.0, 102.0);
        assert_eq!(check_exit(&pos, 96.0, &limits), None);
    }

    #[test]
    fn trailing_stop_after_pullback() {
        let limits = RiskLimits::default();
        let pos = position_at(100.0, 108.0);
        // 108 -> 102 is a 5.6% pullback.
        assert_eq!(check_exit(&pos, 102.0, &limits), Some(RiskExit::TrailingStop));
    }

    #[test]
    fn trailing_takes_priority_over_take_profit() {
        let limits = RiskLimits {
            take_profit_pct: 0.05,
            ..RiskLimits::default()
        };
        let pos = position_at(100.0, 120.0);
        assert_eq!(check_exit(&pos, 112.0, &limits), Some(RiskExit::TrailingStop));
    }

    #[test]
    fn stop_loss_takes_priority() {
        let limits = RiskLimits::default();
        let pos = position_at(100.0, 110.0);
        assert_eq!(check_exit(&pos, 90.0, &limits), Some(RiskExit::StopLoss));
    }

    #[test]
    fn risk_exit_maps_to_reason() {
        assert_eq!(TradeReason::from(RiskExit::StopLoss), TradeReason::StopLoss);
        assert_eq!(TradeReason::from(RiskExit::TrailingStop), TradeReason::TrailingStop);
        assert_eq!(TradeReason::from(RiskExit::TakeProfit), TradeReason::TakeProfit);
    }

    #[test]
    fn cooldown_window() {
        assert!(!in_cooldown(None, 5, 10));
        assert!(in_cooldown(Some(3), 12, 10));
        assert!(!in_cooldown(Some(3), 13, 10));
        assert!(!in_cooldown(Some(3), 3, 0));
    }

    #[test]
    fn drawdown_halt_disabled_by_default() {
        let limits = RiskLimits::default();
        assert!(!drawdown_halted(0.9, &limits));

        let limits = RiskLimits {
            max_drawdown_pct: 0.2,
            ..RiskLimits::default()
        };
        assert!(drawdown_halted(0.2, &limits));
        assert!(!drawdown_halted(0.19, &limits));
    }
}
