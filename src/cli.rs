//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::{JsonReportAdapter, STDOUT};
use crate::domain::analysis::{analyze_symbol, AnalysisParams, SymbolAnalysis};
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestReport};
use crate::domain::config_validation::{
    read_date, validate_all, validate_analysis_config, validate_backtest_config,
    validate_risk_config, validate_strategy_config,
};
use crate::domain::error::ConfluenceError;
use crate::domain::risk::RiskLimits;
use crate::domain::strategy::StrategyParams;
use crate::domain::universe::{parse_symbols, survey_universe};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_DATA_DIR: &str = "data";

#[derive(Parser, Debug)]
#[command(name = "confluence", about = "Multi-strategy signal-fusion backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a portfolio backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory holding <SYMBOL>.csv files
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Comma-separated symbols, overriding [backtest] symbols
        #[arg(long)]
        symbols: Option<String>,
        /// Report path, `-` for stdout
        #[arg(short, long)]
        output: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Latest blended signal for one symbol
    Analyze {
        symbol: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// First date analyzed (YYYY-MM-DD), default earliest bar
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Last date analyzed (YYYY-MM-DD), default latest bar
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols available in the data directory
    ListSymbols {
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Show data range for symbol(s)
    Info {
        #[arg(long)]
        symbols: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            data_dir,
            symbols,
            output,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config, symbols.as_deref())
            } else {
                run_backtest(&config, data_dir.as_deref(), symbols.as_deref(), output.as_deref())
            }
        }
        Command::Analyze {
            symbol,
            config,
            data_dir,
            start,
            end,
            output,
        } => {
            let window = (start.unwrap_or(NaiveDate::MIN), end.unwrap_or(NaiveDate::MAX));
            run_analyze(&symbol, config.as_deref(), data_dir.as_deref(), window, output.as_deref())
        }
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { data_dir, config } => {
            run_list_symbols(data_dir.as_deref(), config.as_deref())
        }
        Command::Info {
            symbols,
            data_dir,
            config,
        } => run_info(symbols.as_deref(), data_dir.as_deref(), config.as_deref()),
    }
}

fn fail(err: ConfluenceError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(fail)
}

fn load_optional_config(path: Option<&Path>) -> Result<Option<FileConfigAdapter>, ExitCode> {
    path.map(load_config).transpose()
}

/// `--data-dir`, then `[data] dir`, then `./data`.
pub fn resolve_data_dir(flag: Option<&Path>, config: Option<&dyn ConfigPort>) -> PathBuf {
    if let Some(dir) = flag {
        return dir.to_path_buf();
    }
    config
        .and_then(|c| c.get_string("data", "dir"))
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

fn run_backtest(
    config_path: &Path,
    data_dir: Option<&Path>,
    symbols_override: Option<&str>,
    output_path: Option<&str>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_all(&adapter) {
        return fail(e);
    }

    let bt_config = match build_backtest_config(&adapter, symbols_override) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    let data_dir = resolve_data_dir(data_dir, Some(&adapter));
    let data_port = CsvAdapter::new(data_dir.clone());
    eprintln!(
        "Running backtest: {} symbols from {}, {} to {}",
        bt_config.symbols.len(),
        data_dir.display(),
        bt_config.start_date,
        bt_config.end_date,
    );

    let report = match backtest_engine::run_backtest(&data_port, &bt_config) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    print_summary(&report);

    let output = output_path
        .map(str::to_string)
        .or_else(|| adapter.get_string("report", "output"))
        .unwrap_or_else(|| STDOUT.to_string());
    let reporter = JsonReportAdapter::new(adapter.get_bool("report", "pretty", true));
    match reporter.write(&report, &output) {
        Ok(()) => {
            if output != STDOUT {
                eprintln!("\nReport written to: {}", output);
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn print_summary(report: &BacktestReport) {
    let m = &report.metrics;
    if let Some(reason) = &m.error {
        eprintln!("\nwarning: {}", reason);
    }
    eprintln!("\n=== Results ({}) ===", report.symbols.join(", "));
    eprintln!("Final Equity:     {:.2}", m.final_equity);
    eprintln!("Total Return:     {:.2}%", m.total_return * 100.0);
    eprintln!("Annualized:       {:.2}%", m.annual_return * 100.0);
    eprintln!("Volatility:       {:.2}%", m.annual_volatility * 100.0);
    eprintln!("Sharpe Ratio:     {:.2}", m.sharpe);
    eprintln!("Sortino Ratio:    {:.2}", m.sortino);
    eprintln!("Calmar Ratio:     {:.2}", m.calmar);
    eprintln!("Max Drawdown:     -{:.1}%", m.max_drawdown * 100.0);
    eprintln!(
        "Trades:           {} ({} buys, {} sells)",
        m.total_trades, m.buy_trades, m.sell_trades
    );
    eprintln!("Win Rate:         {:.1}%", m.win_rate * 100.0);
    eprintln!("Profit Ratio:     {:.2}", m.profit_ratio);
    eprintln!("Commission:       {:.2}", m.total_commission);
}

pub fn build_backtest_config(
    adapter: &dyn ConfigPort,
    symbols_override: Option<&str>,
) -> Result<BacktestConfig, ConfluenceError> {
    let symbols_str = match symbols_override {
        Some(s) => s.to_string(),
        None => adapter
            .get_string("backtest", "symbols")
            .ok_or_else(|| ConfluenceError::missing("backtest", "symbols"))?,
    };
    let symbols = parse_symbols(&symbols_str)
        .map_err(|e| ConfluenceError::invalid("backtest", "symbols", e.to_string()))?;

    let start_date = read_date(adapter, "backtest", "start_date")?;
    let end_date = read_date(adapter, "backtest", "end_date")?;
    let defaults = BacktestConfig::new(Vec::new(), start_date, end_date);

    Ok(BacktestConfig {
        symbols,
        start_date,
        end_date,
        initial_capital: adapter.get_double("backtest", "initial_capital", defaults.initial_capital),
        commission_rate: adapter.get_double("backtest", "commission_rate", defaults.commission_rate),
        slippage_rate: adapter.get_double("backtest", "slippage_rate", defaults.slippage_rate),
        risk_free_rate: adapter.get_double("backtest", "risk_free_rate", defaults.risk_free_rate),
        signal_threshold: adapter.get_double(
            "backtest",
            "signal_threshold",
            defaults.signal_threshold,
        ),
        strategy: build_strategy_params(adapter),
        risk: build_risk_limits(adapter),
    })
}

fn get_usize(adapter: &dyn ConfigPort, section: &str, key: &str, default: usize) -> usize {
    adapter.get_int(section, key, default as i64).max(0) as usize
}

pub fn build_strategy_params(adapter: &dyn ConfigPort) -> StrategyParams {
    let d = StrategyParams::default();
    StrategyParams {
        ma_short_window: get_usize(adapter, "strategy", "ma_short_window", d.ma_short_window),
        ma_long_window: get_usize(adapter, "strategy", "ma_long_window", d.ma_long_window),
        rsi_period: get_usize(adapter, "strategy", "rsi_period", d.rsi_period),
        rsi_oversold: adapter.get_double("strategy", "rsi_oversold", d.rsi_oversold),
        rsi_overbought: adapter.get_double("strategy", "rsi_overbought", d.rsi_overbought),
        macd_fast: get_usize(adapter, "strategy", "macd_fast", d.macd_fast),
        macd_slow: get_usize(adapter, "strategy", "macd_slow", d.macd_slow),
        macd_signal: get_usize(adapter, "strategy", "macd_signal", d.macd_signal),
        ma_weight: adapter.get_double("strategy", "ma_weight", d.ma_weight),
        rsi_weight: adapter.get_double("strategy", "rsi_weight", d.rsi_weight),
        macd_weight: adapter.get_double("strategy", "macd_weight", d.macd_weight),
    }
}

pub fn build_risk_limits(adapter: &dyn ConfigPort) -> RiskLimits {
    let d = RiskLimits::default();
    RiskLimits {
        stop_loss_pct: adapter.get_double("risk", "stop_loss_pct", d.stop_loss_pct),
        take_profit_pct: adapter.get_double("risk", "take_profit_pct", d.take_profit_pct),
        trailing_activation_pct: adapter.get_double(
            "risk",
            "trailing_activation_pct",
            d.trailing_activation_pct,
        ),
        trailing_stop_pct: adapter.get_double("risk", "trailing_stop_pct", d.trailing_stop_pct),
        max_position_pct: adapter.get_double("risk", "max_position_pct", d.max_position_pct),
        max_total_exposure: adapter.get_double("risk", "max_total_exposure", d.max_total_exposure),
        max_drawdown_pct: adapter.get_double("risk", "max_drawdown_pct", d.max_drawdown_pct),
        cooldown_days: get_usize(adapter, "risk", "cooldown_days", d.cooldown_days),
    }
}

pub fn build_analysis_params(adapter: &dyn ConfigPort) -> AnalysisParams {
    let d = AnalysisParams::default();
    AnalysisParams {
        threshold: adapter.get_double("analysis", "threshold", d.threshold),
        confidence_decay: adapter.get_double("analysis", "confidence_decay", d.confidence_decay),
        chart_window: get_usize(adapter, "analysis", "chart_window", d.chart_window),
    }
}

pub fn run_dry_run(config_path: &Path, symbols_override: Option<&str>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_all(&adapter) {
        return fail(e);
    }
    let bt_config = match build_backtest_config(&adapter, symbols_override) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    eprintln!("Config validated successfully");

    let s = &bt_config.strategy;
    let r = &bt_config.risk;
    eprintln!("\nUniverse:");
    eprintln!("  symbols: {}", bt_config.symbols.join(", "));
    eprintln!("  period:  {} to {}", bt_config.start_date, bt_config.end_date);
    eprintln!("\nStrategies (weight):");
    eprintln!("  ma_crossover({}/{}): {}", s.ma_short_window, s.ma_long_window, s.ma_weight);
    eprintln!(
        "  rsi_reversal({}, {}/{}): {}",
        s.rsi_period, s.rsi_oversold, s.rsi_overbought, s.rsi_weight
    );
    eprintln!(
        "  macd_cross({}/{}/{}): {}",
        s.macd_fast, s.macd_slow, s.macd_signal, s.macd_weight
    );
    eprintln!("  signal threshold: {}", bt_config.signal_threshold);
    eprintln!("\nRisk:");
    eprintln!(
        "  stop-loss {:.1}%, take-profit {:.1}%, trailing {:.1}% after +{:.1}%",
        r.stop_loss_pct * 100.0,
        r.take_profit_pct * 100.0,
        r.trailing_stop_pct * 100.0,
        r.trailing_activation_pct * 100.0,
    );
    eprintln!(
        "  max position {:.1}%, exposure {:.1}x, cooldown {} days",
        r.max_position_pct * 100.0,
        r.max_total_exposure,
        r.cooldown_days,
    );

    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn run_analyze(
    symbol: &str,
    config_path: Option<&Path>,
    data_dir: Option<&Path>,
    (start_date, end_date): (NaiveDate, NaiveDate),
    output_path: Option<&str>,
) -> ExitCode {
    if start_date > end_date {
        return fail(ConfluenceError::invalid("analyze", "start", "--start must not be after --end"));
    }
    let config = match load_optional_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let config_port = config.as_ref().map(|c| c as &dyn ConfigPort);

    if let Some(c) = config_port {
        if let Err(e) = validate_strategy_config(c).and_then(|_| validate_analysis_config(c)) {
            return fail(e);
        }
    }
    let (strategy_params, analysis_params) = match config_port {
        Some(c) => (build_strategy_params(c), build_analysis_params(c)),
        None => (StrategyParams::default(), AnalysisParams::default()),
    };

    let symbol = symbol.trim().to_uppercase();
    let data_port = CsvAdapter::new(resolve_data_dir(data_dir, config_port));
    let bars = match data_port.fetch_bars(&symbol, start_date, end_date) {
        Ok(b) if b.is_empty() => return fail(ConfluenceError::NoData { symbol }),
        Ok(b) => b,
        Err(e) => return fail(e),
    };

    let analysis = analyze_symbol(&symbol, &bars, &strategy_params, &analysis_params);
    print_analysis(&analysis);

    let json = match serde_json::to_string_pretty(&analysis) {
        Ok(j) => j,
        Err(e) => return fail(e.into()),
    };
    match output_path {
        None | Some(STDOUT) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Some(path) => match fs::write(path, json + "\n") {
            Ok(()) => {
                eprintln!("\nAnalysis written to: {}", path);
                ExitCode::SUCCESS
            }
            Err(e) => fail(e.into()),
        },
    }
}

fn print_analysis(analysis: &SymbolAnalysis) {
    eprintln!("\n=== {} ===", analysis.symbol);
    if let (Some(date), Some(close)) = (analysis.as_of, analysis.last_close) {
        eprintln!("As of {}: close {:.2}", date, close);
    }
    for reading in &analysis.readings {
        match reading.date {
            Some(date) => eprintln!(
                "  {:<14} {:+.3} on {}",
                reading.strategy,
                reading.signal.scalar(),
                date
            ),
            None => eprintln!("  {:<14} no signal", reading.strategy),
        }
    }
    eprintln!(
        "Combined: {:+.3} => {}",
        analysis.combined, analysis.classification
    );
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let sections: [(&str, fn(&dyn ConfigPort) -> Result<(), ConfluenceError>); 4] = [
        ("backtest", validate_backtest_config),
        ("strategy", validate_strategy_config),
        ("risk", validate_risk_config),
        ("analysis", validate_analysis_config),
    ];
    for (name, validate) in sections {
        match validate(&adapter) {
            Ok(()) => eprintln!("  [{}] ok", name),
            Err(e) => return fail(e),
        }
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_list_symbols(data_dir: Option<&Path>, config_path: Option<&Path>) -> ExitCode {
    let config = match load_optional_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let data_dir = resolve_data_dir(data_dir, config.as_ref().map(|c| c as &dyn ConfigPort));
    let adapter = CsvAdapter::new(data_dir.clone());

    let symbols = match adapter.list_symbols() {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    if symbols.is_empty() {
        eprintln!("No symbols found in {}", data_dir.display());
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}

fn run_info(
    symbols_override: Option<&str>,
    data_dir: Option<&Path>,
    config_path: Option<&Path>,
) -> ExitCode {
    let config = match load_optional_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let config_port = config.as_ref().map(|c| c as &dyn ConfigPort);
    let adapter = CsvAdapter::new(resolve_data_dir(data_dir, config_port));

    let symbols = match resolve_symbols(symbols_override, config_port) {
        Some(Ok(s)) => s,
        Some(Err(e)) => return fail(e),
        None => match adapter.list_symbols() {
            Ok(s) => s,
            Err(e) => return fail(e),
        },
    };

    let survey = match survey_universe(&adapter, &symbols) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    for coverage in &survey.available {
        println!(
            "{}: {} bars, {} to {}",
            coverage.symbol, coverage.bars, coverage.first_date, coverage.last_date
        );
    }
    for symbol in &survey.missing {
        eprintln!("{}: no data found", symbol);
    }
    ExitCode::SUCCESS
}

/// `--symbols`, then `[backtest] symbols`; `None` when neither is set.
pub fn resolve_symbols(
    symbols_override: Option<&str>,
    config: Option<&dyn ConfigPort>,
) -> Option<Result<Vec<String>, ConfluenceError>> {
    let raw = symbols_override
        .map(str::to_string)
        .or_else(|| config.and_then(|c| c.get_string("backtest", "symbols")))?;
    Some(parse_symbols(&raw).map_err(|e| ConfluenceError::invalid("backtest", "symbols", e.to_string())))
}
