//! Latest-signal analysis for a single symbol.
//!
//! Runs the three generators over the full history, takes each strategy's
//! most recent event, and blends them into a buy/sell/hold call. Also returns
//! the trailing indicator series for charting.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use crate::domain::indicator::{calculate_macd, calculate_rsi, calculate_sma, IndicatorType};
use crate::domain::price_bar::{closes, PriceBar};
use crate::domain::strategy::{Signal, StrategyParams, StrategySet, STRATEGY_COUNT};

/// Blend weights for MA, RSI and MACD.
pub const ANALYSIS_WEIGHTS: [f64; STRATEGY_COUNT] = [0.4, 0.3, 0.3];

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisParams {
    pub threshold: f64,
    pub confidence_decay: f64,
    pub chart_window: usize,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        AnalysisParams {
            threshold: 0.15,
            confidence_decay: 0.95,
            chart_window: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Buy,
    Sell,
    Hold,
}

impl Classification {
    pub fn from_strength(combined: f64, threshold: f64) -> Self {
        if combined >= threshold {
            Classification::Buy
        } else if combined <= -threshold {
            Classification::Sell
        } else {
            Classification::Hold
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Classification::Buy => "buy",
            Classification::Sell => "sell",
            Classification::Hold => "hold",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyReading {
    pub strategy: &'static str,
    pub signal: Signal,
    /// Date of the event, `None` when the strategy never fired.
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub label: String,
    pub values: Vec<Option<f64>>,
}

impl ChartSeries {
    fn new(label: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        ChartSeries {
            label: label.into(),
            values,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ChartData {
    pub dates: Vec<NaiveDate>,
    pub closes: Vec<f64>,
    pub indicators: Vec<ChartSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolAnalysis {
    pub symbol: String,
    pub as_of: Option<NaiveDate>,
    pub last_close: Option<f64>,
    pub readings: Vec<StrategyReading>,
    pub combined: f64,
    pub classification: Classification,
    pub chart: ChartData,
}

pub fn analyze_symbol(
    symbol: &str,
    bars: &[PriceBar],
    strategy_params: &StrategyParams,
    params: &AnalysisParams,
) -> SymbolAnalysis {
    let closes = closes(bars);
    let strategies = StrategySet::from_params(strategy_params);
    let series = strategies.generate_all(&closes);

    let readings: Vec<StrategyReading> = strategies
        .generators()
        .iter()
        .zip(series.iter())
        .map(|(generator, signals)| {
            let latest = signals.iter().enumerate().rev().find(|(_, s)| s.is_event());
            StrategyReading {
                strategy: generator.name(),
                signal: latest.map(|(_, s)| *s).unwrap_or_default(),
                date: latest.map(|(i, _)| bars[i].date),
            }
        })
        .collect();

    let weight_sum: f64 = ANALYSIS_WEIGHTS.iter().sum();
    let weighted: f64 = readings
        .iter()
        .zip(ANALYSIS_WEIGHTS.iter())
        .map(|(r, w)| r.signal.scalar() * w)
        .sum();
    let combined = (weighted / weight_sum).clamp(-1.0, 1.0) * params.confidence_decay;

    SymbolAnalysis {
        symbol: symbol.to_string(),
        as_of: bars.last().map(|b| b.date),
        last_close: bars.last().map(|b| b.close),
        readings,
        combined,
        classification: Classification::from_strength(combined, params.threshold),
        chart: build_chart(bars, &closes, strategy_params, params.chart_window),
    }
}

fn build_chart(bars: &[PriceBar], closes: &[f64], p: &StrategyParams, window: usize) -> ChartData {
    let start = bars.len().saturating_sub(window);
    let tail = |values: Vec<Option<f64>>| values[start..].to_vec();
    let dense = |values: Vec<f64>| values[start..].iter().copied().map(Some).collect::<Vec<_>>();

    let macd = calculate_macd(closes, p.macd_fast, p.macd_slow, p.macd_signal);
    let macd_label = IndicatorType::Macd {
        fast: p.macd_fast,
        slow: p.macd_slow,
        signal: p.macd_signal,
    }
    .to_string();

    ChartData {
        dates: bars[start..].iter().map(|b| b.date).collect(),
        closes: closes[start..].to_vec(),
        indicators: vec![
            ChartSeries::new(
                IndicatorType::Sma(p.ma_short_window).to_string(),
                tail(calculate_sma(closes, p.ma_short_window)),
            ),
            ChartSeries::new(
                IndicatorType::Sma(p.ma_long_window).to_string(),
                tail(calculate_sma(closes, p.ma_long_window)),
            ),
            ChartSeries::new(
                IndicatorType::Rsi(p.rsi_period).to_string(),
                tail(calculate_rsi(closes, p.rsi_period)),
            ),
            ChartSeries::new(format!("{} line", macd_label), dense(macd.line)),
            ChartSeries::new(format!("{} signal", macd_label), dense(macd.signal)),
            ChartSeries::new(format!("{} histogram", macd_label), dense(macd.histogram)),
        ],
    }
}
