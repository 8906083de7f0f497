//! Configuration validation.
//!
//! Checks presence, parseability and ranges of every config field before a
//! run. Optional keys fall back to the domain defaults; a key that is present
//! but unparseable is an error rather than a silent default.

use crate::domain::analysis::AnalysisParams;
use crate::domain::backtest::BacktestConfig;
use crate::domain::error::ConfluenceError;
use crate::domain::risk::RiskLimits;
use crate::domain::strategy::StrategyParams;
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), ConfluenceError> {
    validate_symbols(config)?;
    validate_dates(config)?;
    positive(config, "backtest", "initial_capital", BacktestConfig::DEFAULT_INITIAL_CAPITAL)?;
    fraction(config, "backtest", "commission_rate", 0.001)?;
    fraction(config, "backtest", "slippage_rate", 0.001)?;
    fraction(config, "backtest", "risk_free_rate", BacktestConfig::DEFAULT_RISK_FREE_RATE)?;
    unit_interval(config, "backtest", "signal_threshold", BacktestConfig::DEFAULT_SIGNAL_THRESHOLD)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), ConfluenceError> {
    let d = StrategyParams::default();

    let short = window(config, "ma_short_window", d.ma_short_window)?;
    let long = window(config, "ma_long_window", d.ma_long_window)?;
    if long <= short {
        return Err(ConfluenceError::invalid(
            "strategy",
            "ma_long_window",
            "ma_long_window must be greater than ma_short_window",
        ));
    }

    window(config, "rsi_period", d.rsi_period)?;
    let oversold = read_f64(config, "strategy", "rsi_oversold", d.rsi_oversold)?;
    let overbought = read_f64(config, "strategy", "rsi_overbought", d.rsi_overbought)?;
    if !(0.0 < oversold && oversold < overbought && overbought < 100.0) {
        return Err(ConfluenceError::invalid(
            "strategy",
            "rsi_oversold",
            "thresholds must satisfy 0 < rsi_oversold < rsi_overbought < 100",
        ));
    }

    let fast = window(config, "macd_fast", d.macd_fast)?;
    let slow = window(config, "macd_slow", d.macd_slow)?;
    if slow <= fast {
        return Err(ConfluenceError::invalid(
            "strategy",
            "macd_slow",
            "macd_slow must be greater than macd_fast",
        ));
    }
    window(config, "macd_signal", d.macd_signal)?;

    let mut total = 0.0;
    for (key, default) in [
        ("ma_weight", d.ma_weight),
        ("rsi_weight", d.rsi_weight),
        ("macd_weight", d.macd_weight),
    ] {
        let weight = read_f64(config, "strategy", key, default)?;
        if weight < 0.0 {
            return Err(ConfluenceError::invalid("strategy", key, format!("{} must be non-negative", key)));
        }
        total += weight;
    }
    if total <= 0.0 {
        return Err(ConfluenceError::invalid(
            "strategy",
            "ma_weight",
            "strategy weights must not all be zero",
        ));
    }
    Ok(())
}

pub fn validate_risk_config(config: &dyn ConfigPort) -> Result<(), ConfluenceError> {
    let d = RiskLimits::default();
    open_unit(config, "risk", "stop_loss_pct", d.stop_loss_pct)?;
    positive(config, "risk", "take_profit_pct", d.take_profit_pct)?;
    non_negative(config, "risk", "trailing_activation_pct", d.trailing_activation_pct)?;
    open_unit(config, "risk", "trailing_stop_pct", d.trailing_stop_pct)?;
    open_unit(config, "risk", "max_position_pct", d.max_position_pct)?;
    positive(config, "risk", "max_total_exposure", d.max_total_exposure)?;
    fraction(config, "risk", "max_drawdown_pct", d.max_drawdown_pct)?;
    read_usize(config, "risk", "cooldown_days", d.cooldown_days)?;
    Ok(())
}

pub fn validate_analysis_config(config: &dyn ConfigPort) -> Result<(), ConfluenceError> {
    let d = AnalysisParams::default();
    unit_interval(config, "analysis", "threshold", d.threshold)?;
    open_unit(config, "analysis", "confidence_decay", d.confidence_decay)?;
    let window = read_usize(config, "analysis", "chart_window", d.chart_window)?;
    if window == 0 {
        return Err(ConfluenceError::invalid(
            "analysis",
            "chart_window",
            "chart_window must be at least 1",
        ));
    }
    Ok(())
}

/// Every section, in the order a full run needs them.
pub fn validate_all(config: &dyn ConfigPort) -> Result<(), ConfluenceError> {
    validate_backtest_config(config)?;
    validate_strategy_config(config)?;
    validate_risk_config(config)?;
    validate_analysis_config(config)?;
    Ok(())
}

pub fn parse_date(value: &str, section: &str, key: &str) -> Result<NaiveDate, ConfluenceError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        ConfluenceError::invalid(section, key, format!("invalid {} format, expected YYYY-MM-DD", key))
    })
}

pub fn read_date(config: &dyn ConfigPort, section: &str, key: &str) -> Result<NaiveDate, ConfluenceError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => parse_date(&s, section, key),
        _ => Err(ConfluenceError::missing(section, key)),
    }
}

pub fn read_f64(config: &dyn ConfigPort, section: &str, key: &str, default: f64) -> Result<f64, ConfluenceError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(s) => match s.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(ConfluenceError::invalid(section, key, format!("{} must be a number", key))),
        },
    }
}

pub fn read_usize(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, ConfluenceError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(s) => s.trim().parse::<usize>().map_err(|_| {
            ConfluenceError::invalid(section, key, format!("{} must be a non-negative integer", key))
        }),
    }
}

fn validate_symbols(config: &dyn ConfigPort) -> Result<(), ConfluenceError> {
    match config.get_string("backtest", "symbols") {
        Some(s) => parse_symbols(&s)
            .map(|_| ())
            .map_err(|e| ConfluenceError::invalid("backtest", "symbols", e.to_string())),
        None => Err(ConfluenceError::missing("backtest", "symbols")),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), ConfluenceError> {
    let start_date = read_date(config, "backtest", "start_date")?;
    let end_date = read_date(config, "backtest", "end_date")?;

    if start_date >= end_date {
        return Err(ConfluenceError::invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

fn window(config: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, ConfluenceError> {
    let value = read_usize(config, "strategy", key, default)?;
    if value == 0 {
        return Err(ConfluenceError::invalid("strategy", key, format!("{} must be at least 1", key)));
    }
    Ok(value)
}

fn positive(config: &dyn ConfigPort, section: &str, key: &str, default: f64) -> Result<f64, ConfluenceError> {
    let value = read_f64(config, section, key, default)?;
    if value <= 0.0 {
        return Err(ConfluenceError::invalid(section, key, format!("{} must be positive", key)));
    }
    Ok(value)
}

fn non_negative(config: &dyn ConfigPort, section: &str, key: &str, default: f64) -> Result<f64, ConfluenceError> {
    let value = read_f64(config, section, key, default)?;
    if value < 0.0 {
        return Err(ConfluenceError::invalid(section, key, format!("{} must be non-negative", key)));
    }
    Ok(value)
}

/// `[0, 1)`
fn fraction(config: &dyn ConfigPort, section: &str, key: &str, default: f64) -> Result<f64, ConfluenceError> {
    let value = read_f64(config, section, key, default)?;
    if !(0.0..1.0).contains(&value) {
        return Err(ConfluenceError::invalid(section, key, format!("{} must be in [0, 1)", key)));
    }
    Ok(value)
}

/// `[0, 1]`
fn unit_interval(config: &dyn ConfigPort, section: &str, key: &str, default: f64) -> Result<f64, ConfluenceError> {
    let value = read_f64(config, section, key, default)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfluenceError::invalid(section, key, format!("{} must be in [0, 1]", key)));
    }
    Ok(value)
}

/// `(0, 1]`
fn open_unit(config: &dyn ConfigPort, section: &str, key: &str, default: f64) -> Result<f64, ConfluenceError> {
    let value = read_f64(config, section, key, default)?;
    if value <= 0.0 || value > 1.0 {
        return Err(ConfluenceError::invalid(section, key, format!("{} must be in (0, 1]", key)));
    }
    Ok(value)
}
