//! Performance metrics and statistics.
//!
//! Return statistics come from the daily equity curve; trade statistics
//! come from the sells in the ledger (each sell closes a whole position).

use serde::Serialize;

use super::indicator::stddev::sample_stddev;
use super::portfolio::{EquityPoint, Portfolio};
use super::trade::{Side, Trade};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Metrics {
    pub final_equity: f64,
    pub total_return: f64,
    pub annual_return: f64,
    pub annual_volatility: f64,
    pub sharpe: f64,
    pub sortino: f64,
    pub calmar: f64,
    pub max_drawdown: f64,
    pub total_pnl: f64,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub total_trades: usize,
    pub buy_trades: usize,
    pub sell_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub avg_win: f64,
    /// Mean pnl of losing sells, negative.
    pub avg_loss: f64,
    pub profit_ratio: f64,
    pub total_commission: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Metrics {
    pub fn compute(portfolio: &Portfolio, risk_free_rate: f64) -> Self {
        let equity_curve = &portfolio.equity_curve;
        let initial_capital = portfolio.initial_capital;

        let final_equity = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_capital);

        let total_return = if initial_capital > 0.0 {
            final_equity / initial_capital - 1.0
        } else {
            0.0
        };

        let returns = daily_returns(equity_curve);
        let annual_return = annualize(total_return, returns.len());
        let annual_volatility = sample_stddev(&returns)
            .map(|std| std * TRADING_DAYS_PER_YEAR.sqrt())
            .unwrap_or(0.0);

        let sharpe = if annual_volatility > 0.0 {
            (annual_return - risk_free_rate) / annual_volatility
        } else {
            0.0
        };
        let sortino = compute_sortino(&returns, annual_return, risk_free_rate);

        let max_drawdown = compute_max_drawdown(equity_curve);
        let calmar = if max_drawdown > 0.0 {
            annual_return / max_drawdown
        } else {
            0.0
        };

        let trade_stats = TradeStats::from_trades(&portfolio.trades);
        let unrealized_pnl = portfolio.unrealized_pnl();

        Metrics {
            final_equity,
            total_return,
            annual_return,
            annual_volatility,
            sharpe,
            sortino,
            calmar,
            max_drawdown,
            total_pnl: final_equity - initial_capital,
            realized_pnl: trade_stats.realized_pnl,
            unrealized_pnl,
            total_trades: portfolio.trades.len(),
            buy_trades: trade_stats.buys,
            sell_trades: trade_stats.sells,
            winning_trades: trade_stats.wins,
            losing_trades: trade_stats.losses,
            win_rate: trade_stats.win_rate(),
            avg_win: trade_stats.avg_win(),
            avg_loss: trade_stats.avg_loss(),
            profit_ratio: trade_stats.profit_ratio(),
            total_commission: trade_stats.total_commission,
            error: None,
        }
    }

    /// Metrics for a run that never simulated a day.
    pub fn empty(initial_capital: f64, reason: impl Into<String>) -> Self {
        Metrics {
            final_equity: initial_capital,
            error: Some(reason.into()),
            ..Metrics::default()
        }
    }
}

/// Consecutive equity ratios minus one; 0 when the previous equity is not positive.
pub fn daily_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| {
            let prev = w[0].equity;
            if prev > 0.0 {
                w[1].equity / prev - 1.0
            } else {
                0.0
            }
        })
        .collect()
}

fn annualize(total_return: f64, periods: usize) -> f64 {
    if periods == 0 {
        return 0.0;
    }
    let growth = 1.0 + total_return;
    if growth <= 0.0 {
        return -1.0;
    }
    growth.powf(TRADING_DAYS_PER_YEAR / periods as f64) - 1.0
}

fn compute_sortino(returns: &[f64], annual_return: f64, risk_free_rate: f64) -> f64 {
    let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    match sample_stddev(&downside) {
        Some(std) if std > 0.0 => {
            (annual_return - risk_free_rate) / (std * TRADING_DAYS_PER_YEAR.sqrt())
        }
        _ => 0.0,
    }
}

fn compute_max_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    let Some(first) = equity_curve.first() else {
        return 0.0;
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;
    for point in equity_curve {
        if point.equity > peak {
            peak = point.equity;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - point.equity) / peak);
        }
    }
    max_dd
}

#[derive(Debug, Default)]
struct TradeStats {
    buys: usize,
    sells: usize,
    wins: usize,
    losses: usize,
    sells_with_pnl: usize,
    total_wins: f64,
    total_losses: f64,
    realized_pnl: f64,
    total_commission: f64,
}

impl TradeStats {
    fn from_trades(trades: &[Trade]) -> Self {
        let mut stats = TradeStats::default();
        for trade in trades {
            stats.total_commission += trade.commission;
            match trade.side {
                Side::Buy => stats.buys += 1,
                Side::Sell => stats.sells += 1,
            }
            let Some(pnl) = trade.pnl else {
                continue;
            };
            stats.sells_with_pnl += 1;
            stats.realized_pnl += pnl;
            if pnl > 0.0 {
                stats.wins += 1;
                stats.total_wins += pnl;
            } else if pnl < 0.0 {
                stats.losses += 1;
                stats.total_losses += pnl;
            }
        }
        stats
    }

    fn win_rate(&self) -> f64 {
        if self.sells_with_pnl > 0 {
            self.wins as f64 / self.sells_with_pnl as f64
        } else {
            0.0
        }
    }

    fn avg_win(&self) -> f64 {
        if self.wins > 0 {
            self.total_wins / self.wins as f64
        } else {
            0.0
        }
    }

    fn avg_loss(&self) -> f64 {
        if self.losses > 0 {
            self.total_losses / self.losses as f64
        } else {
            0.0
        }
    }

    fn profit_ratio(&self) -> f64 {
        let avg_loss = self.avg_loss();
        if avg_loss != 0.0 {
            (self.avg_win() / avg_loss).abs()
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::TradeReason;
    use chrono::NaiveDate;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn portfolio_with_equity(values: &[f64]) -> Portfolio {
        let mut portfolio = Portfolio::new(values.first().copied().unwrap_or(100.0), 0);
        for (i, &v) in values.iter().enumerate() {
            portfolio.equity_curve.push(EquityPoint {
                date: date(i as u32 + 1),
                equity: v,
                cash: v,
                position_value: 0.0,
            });
        }
        portfolio
    }

    fn sell(pnl: f64, commission: f64) -> Trade {
        Trade {
            date: date(5),
            symbol: "AAPL".into(),
            side: Side::Sell,
            quantity: 10,
            execution_price: 100.0,
            commission,
            pnl: Some(pnl),
            reason: TradeReason::SignalExit,
        }
    }

    fn buy(commission: f64) -> Trade {
        Trade {
            side: Side::Buy,
            pnl: None,
            reason: TradeReason::SignalEntry,
            ..sell(0.0, commission)
        }
    }

    #[test]
    fn empty_curve_defaults() {
        let portfolio = Portfolio::new(1000.0, 0);
        let m = Metrics::compute(&portfolio, 0.03);
        assert!((m.final_equity - 1000.0).abs() < f64::EPSILON);
        assert_eq!(m.total_return, 0.0);
        assert_eq!(m.annual_return, 0.0);
        assert_eq!(m.sharpe, 0.0);
        assert_eq!(m.max_drawdown, 0.0);
        assert!(m.error.is_none());
    }

    #[test]
    fn single_point_has_no_return_stats() {
        let m = Metrics::compute(&portfolio_with_equity(&[1000.0]), 0.03);
        assert_eq!(m.annual_return, 0.0);
        assert_eq!(m.annual_volatility, 0.0);
        assert_eq!(m.sharpe, 0.0);
    }

    #[test]
    fn total_return_and_annualization() {
        let m = Metrics::compute(&portfolio_with_equity(&[100.0, 105.0, 110.0]), 0.03);
        assert!((m.total_return - 0.10).abs() < 1e-12);
        let expected = 1.1_f64.powf(252.0 / 2.0) - 1.0;
        assert!((m.annual_return - expected).abs() / expected < 1e-9);
        assert!((m.total_pnl - 10.0).abs() < 1e-9);
    }

    #[test]
    fn flat_curve_has_zero_sharpe() {
        let m = Metrics::compute(&portfolio_with_equity(&[100.0, 100.0, 100.0]), 0.03);
        assert_eq!(m.annual_volatility, 0.0);
        assert_eq!(m.sharpe, 0.0);
    }

    #[test]
    fn volatility_uses_sample_std() {
        let equity = [100.0, 110.0, 99.0, 108.9];
        let m = Metrics::compute(&portfolio_with_equity(&equity), 0.0);
        let returns = [0.1, -0.1, 0.1];
        let expected = sample_stddev(&returns).unwrap() * 252.0_f64.sqrt();
        assert!((m.annual_volatility - expected).abs() < 1e-9);
        assert!((m.sharpe - m.annual_return / expected).abs() < 1e-9);
    }

    #[test]
    fn max_drawdown_from_running_peak() {
        let m = Metrics::compute(&portfolio_with_equity(&[100.0, 120.0, 90.0, 130.0, 117.0]), 0.03);
        assert!((m.max_drawdown - 0.25).abs() < 1e-12);
        assert!((m.calmar - m.annual_return / 0.25).abs() < 1e-9);
    }

    #[test]
    fn sortino_needs_two_down_days() {
        let m = Metrics::compute(&portfolio_with_equity(&[100.0, 110.0, 105.0, 115.0]), 0.03);
        assert_eq!(m.sortino, 0.0);

        let m = Metrics::compute(&portfolio_with_equity(&[100.0, 95.0, 92.0, 110.0]), 0.03);
        assert!(m.sortino != 0.0);
    }

    #[test]
    fn trade_statistics() {
        let mut portfolio = portfolio_with_equity(&[1000.0, 1100.0]);
        portfolio.trades = vec![
            buy(1.0),
            sell(100.0, 1.0),
            buy(1.0),
            sell(-50.0, 1.0),
            buy(1.0),
            sell(200.0, 1.0),
        ];

        let m = Metrics::compute(&portfolio, 0.03);
        assert_eq!(m.total_trades, 6);
        assert_eq!(m.buy_trades, 3);
        assert_eq!(m.sell_trades, 3);
        assert_eq!(m.winning_trades, 2);
        assert_eq!(m.losing_trades, 1);
        assert!((m.win_rate - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.avg_win - 150.0).abs() < 1e-12);
        assert!((m.avg_loss + 50.0).abs() < 1e-12);
        assert!((m.profit_ratio - 3.0).abs() < 1e-12);
        assert!((m.realized_pnl - 250.0).abs() < 1e-12);
        assert!((m.total_commission - 6.0).abs() < 1e-12);
    }

    #[test]
    fn profit_ratio_zero_without_losses() {
        let mut portfolio = portfolio_with_equity(&[1000.0, 1100.0]);
        portfolio.trades = vec![buy(0.0), sell(100.0, 0.0)];
        let m = Metrics::compute(&portfolio, 0.03);
        assert_eq!(m.profit_ratio, 0.0);
        assert!((m.win_rate - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn breakeven_sell_counts_toward_win_rate_denominator() {
        let mut portfolio = portfolio_with_equity(&[1000.0, 1000.0]);
        portfolio.trades = vec![sell(0.0, 0.0), sell(10.0, 0.0)];
        let m = Metrics::compute(&portfolio, 0.03);
        assert_eq!(m.winning_trades, 1);
        assert_eq!(m.losing_trades, 0);
        assert!((m.win_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_metrics_carry_error() {
        let m = Metrics::empty(5000.0, "no price data in range");
        assert_eq!(m.error.as_deref(), Some("no price data in range"));
        assert!((m.final_equity - 5000.0).abs() < f64::EPSILON);
        assert_eq!(m.total_trades, 0);
    }

    #[test]
    fn daily_returns_guard_non_positive_equity() {
        let curve = portfolio_with_equity(&[0.0, 100.0, 110.0]).equity_curve;
        let returns = daily_returns(&curve);
        assert_eq!(returns[0], 0.0);
        assert!((returns[1] - 0.1).abs() < 1e-12);
    }
}
