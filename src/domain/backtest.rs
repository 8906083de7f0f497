//! Backtest engine and daily event loop.
//!
//! One pass over the unified timeline. Each day:
//! 1. Mark open positions to the day's close (symbols without a bar are skipped)
//! 2. Risk exits for every held symbol with a bar
//! 3. Signal entries and exits for every symbol with a bar, in supplied order
//! 4. Record one equity point

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::error::ConfluenceError;
use crate::domain::execution::{enter_long, exit_position, EntryOrder, EntryResult, ExecutionConfig};
use crate::domain::fusion::fuse;
use crate::domain::metrics::Metrics;
use crate::domain::portfolio::{EquityPoint, Portfolio};
use crate::domain::price_bar::within_range;
use crate::domain::risk::{check_exit, drawdown_halted, in_cooldown, RiskLimits};
use crate::domain::strategy::{StrategyParams, StrategySet};
use crate::domain::symbol_data::{build_unified_timeline, SymbolData};
use crate::domain::trade::{Trade, TradeReason};
use crate::ports::data_port::DataPort;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub symbols: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub commission_rate: f64,
    pub slippage_rate: f64,
    pub risk_free_rate: f64,
    pub signal_threshold: f64,
    pub strategy: StrategyParams,
    pub risk: RiskLimits,
}

impl BacktestConfig {
    pub const DEFAULT_INITIAL_CAPITAL: f64 = 1_000_000.0;
    pub const DEFAULT_RISK_FREE_RATE: f64 = 0.03;
    pub const DEFAULT_SIGNAL_THRESHOLD: f64 = 0.3;

    /// Config with default capital, costs, threshold, strategy and risk limits.
    pub fn new(symbols: Vec<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        let execution = ExecutionConfig::default();
        BacktestConfig {
            symbols,
            start_date,
            end_date,
            initial_capital: Self::DEFAULT_INITIAL_CAPITAL,
            commission_rate: execution.commission_rate,
            slippage_rate: execution.slippage_rate,
            risk_free_rate: Self::DEFAULT_RISK_FREE_RATE,
            signal_threshold: Self::DEFAULT_SIGNAL_THRESHOLD,
            strategy: StrategyParams::default(),
            risk: RiskLimits::default(),
        }
    }

    pub fn execution(&self) -> ExecutionConfig {
        ExecutionConfig {
            commission_rate: self.commission_rate,
            slippage_rate: self.slippage_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestReport {
    /// Symbols that had data in range and took part in the run.
    pub symbols: Vec<String>,
    pub metrics: Metrics,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<Trade>,
}

/// Run the daily loop over `timeline` and return the final portfolio.
pub fn simulate(symbols: &[SymbolData], timeline: &[NaiveDate], config: &BacktestConfig) -> Portfolio {
    let mut portfolio = Portfolio::new(config.initial_capital, symbols.len());
    let weights = config.strategy.weights();
    let execution = config.execution();

    for (day, &date) in timeline.iter().enumerate() {
        for (slot, sd) in symbols.iter().enumerate() {
            if let (Some(bar), Some(position)) = (sd.get_bar(date), portfolio.position_mut(slot)) {
                position.mark(bar.close);
            }
        }

        for (slot, sd) in symbols.iter().enumerate() {
            let Some(bar) = sd.get_bar(date) else {
                continue;
            };
            let exit = portfolio
                .position(slot)
                .and_then(|position| check_exit(position, bar.close, &config.risk));
            let Some(exit) = exit else {
                continue;
            };
            if let Some(trade) = exit_position(&mut portfolio, slot, bar.close, date, exit.into(), &execution) {
                tracing::debug!(
                    "{} {}: {} {} @ {:.2}, pnl {:.2}",
                    date,
                    trade.symbol,
                    trade.reason,
                    trade.quantity,
                    trade.execution_price,
                    trade.pnl.unwrap_or_default()
                );
                portfolio.mark_traded(slot, day);
            }
        }

        if drawdown_halted(portfolio.drawdown(), &config.risk) {
            tracing::debug!(
                "{}: drawdown {:.2}% at or beyond limit, skipping signals",
                date,
                portfolio.drawdown() * 100.0
            );
            portfolio.record_equity(date);
            continue;
        }

        for (slot, sd) in symbols.iter().enumerate() {
            let Some(index) = sd.get_bar_index(date) else {
                continue;
            };
            let close = sd.bars[index].close;

            let fused = fuse(sd.signal_slices(), weights, index);
            if !fused.is_actionable(config.signal_threshold) {
                continue;
            }
            if in_cooldown(portfolio.last_trade_index(slot), day, config.risk.cooldown_days) {
                tracing::debug!("{} {}: signal ignored during cooldown", date, sd.symbol);
                continue;
            }

            if fused.is_bullish() && !portfolio.has_position(slot) {
                let order = EntryOrder {
                    slot,
                    symbol: &sd.symbol,
                    close,
                    date,
                    strength: fused.combined,
                };
                match enter_long(&mut portfolio, &order, &config.risk, &execution) {
                    EntryResult::Entered {
                        quantity,
                        execution_price,
                        commission,
                    } => {
                        tracing::debug!(
                            "{} {}: buy {} @ {:.2}, commission {:.2}, signal {:.3}",
                            date,
                            sd.symbol,
                            quantity,
                            execution_price,
                            commission,
                            fused.combined
                        );
                        portfolio.mark_traded(slot, day);
                    }
                    EntryResult::Skipped(reason) => {
                        tracing::debug!("{} {}: entry skipped ({:?})", date, sd.symbol, reason);
                    }
                }
            } else if fused.is_bearish() && portfolio.has_position(slot) {
                if let Some(trade) =
                    exit_position(&mut portfolio, slot, close, date, TradeReason::SignalExit, &execution)
                {
                    tracing::debug!(
                        "{} {}: sell {} @ {:.2}, pnl {:.2}, signal {:.3}",
                        date,
                        trade.symbol,
                        trade.quantity,
                        trade.execution_price,
                        trade.pnl.unwrap_or_default(),
                        fused.combined
                    );
                    portfolio.mark_traded(slot, day);
                }
            }
        }

        portfolio.record_equity(date);
    }

    portfolio
}

/// Load bars for every configured symbol, simulate, and compute metrics.
///
/// Symbols without data in range are excluded from the run. An empty timeline
/// yields a report with no equity points and `metrics.error` set.
pub fn run_backtest(data_port: &dyn DataPort, config: &BacktestConfig) -> Result<BacktestReport, ConfluenceError> {
    let strategies = StrategySet::from_params(&config.strategy);
    let symbols = load_symbols(data_port, config, &strategies)?;

    let timeline = build_unified_timeline(&symbols);
    if timeline.is_empty() {
        tracing::warn!(
            "No price data between {} and {} for any requested symbol",
            config.start_date,
            config.end_date
        );
        return Ok(BacktestReport {
            symbols: Vec::new(),
            metrics: Metrics::empty(config.initial_capital, "no price data in the requested date range"),
            equity_curve: Vec::new(),
            trades: Vec::new(),
        });
    }

    tracing::info!(
        "Starting backtest: {} symbols, {} trading days ({} to {})",
        symbols.len(),
        timeline.len(),
        timeline[0],
        timeline[timeline.len() - 1]
    );

    let portfolio = simulate(&symbols, &timeline, config);
    let metrics = Metrics::compute(&portfolio, config.risk_free_rate);

    tracing::info!(
        "Backtest complete: {} trades, {} positions open, final equity {:.2} ({:.2}%)",
        metrics.total_trades,
        portfolio.position_count(),
        metrics.final_equity,
        metrics.total_return * 100.0
    );

    Ok(BacktestReport {
        symbols: symbols.into_iter().map(|sd| sd.symbol).collect(),
        metrics,
        equity_curve: portfolio.equity_curve,
        trades: portfolio.trades,
    })
}

fn load_symbols(
    data_port: &dyn DataPort,
    config: &BacktestConfig,
    strategies: &StrategySet,
) -> Result<Vec<SymbolData>, ConfluenceError> {
    let mut loaded = Vec::with_capacity(config.symbols.len());
    let mut seen = HashSet::new();
    for symbol in &config.symbols {
        if !seen.insert(symbol.as_str()) {
            tracing::warn!("Ignoring duplicate symbol {}", symbol);
            continue;
        }
        let bars = match data_port.fetch_bars(symbol, config.start_date, config.end_date) {
            Ok(bars) => within_range(bars, config.start_date, config.end_date),
            Err(ConfluenceError::NoData { .. }) => Vec::new(),
            Err(e) => return Err(e),
        };
        if bars.is_empty() {
            tracing::warn!("Excluding {}: no bars in range", symbol);
            continue;
        }
        let sd = SymbolData::new(symbol.clone(), bars, strategies);
        tracing::debug!("Loaded {} bars for {}", sd.bar_count(), symbol);
        loaded.push(sd);
    }
    Ok(loaded)
}
