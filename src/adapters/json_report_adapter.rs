//! JSON report adapter implementing ReportPort.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::domain::backtest::BacktestReport;
use crate::domain::error::ConfluenceError;
use crate::ports::report_port::ReportPort;

pub const STDOUT: &str = "-";

pub struct JsonReportAdapter {
    pretty: bool,
}

impl JsonReportAdapter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    pub fn render(&self, report: &BacktestReport) -> Result<String, ConfluenceError> {
        let mut json = if self.pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };
        json.push('\n');
        Ok(json)
    }
}

impl Default for JsonReportAdapter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ReportPort for JsonReportAdapter {
    fn write(&self, report: &BacktestReport, output_path: &str) -> Result<(), ConfluenceError> {
        let json = self.render(report)?;

        if output_path == STDOUT {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(json.as_bytes())?;
            stdout.flush()?;
            return Ok(());
        }

        let path = Path::new(output_path);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                return Err(ConfluenceError::Report {
                    reason: format!("output directory does not exist: {}", parent.display()),
                });
            }
        }
        fs::write(path, json)?;
        tracing::info!("Report written to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::Metrics;
    use crate::domain::portfolio::EquityPoint;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn sample_report() -> BacktestReport {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        BacktestReport {
            symbols: vec!["AAPL".into()],
            metrics: Metrics::empty(100_000.0, "no trading days"),
            equity_curve: vec![EquityPoint {
                date,
                equity: 100_000.0,
                cash: 100_000.0,
                position_value: 0.0,
            }],
            trades: Vec::new(),
        }
    }

    #[test]
    fn writes_pretty_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        JsonReportAdapter::default()
            .write(&sample_report(), path.to_str().unwrap())
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\n  \"metrics\""));
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["symbols"][0], "AAPL");
        assert_eq!(value["equity_curve"][0]["date"], "2024-01-02");
        assert_eq!(value["metrics"]["error"], "no trading days");
    }

    #[test]
    fn compact_render_is_single_line() {
        let json = JsonReportAdapter::new(false).render(&sample_report()).unwrap();
        assert_eq!(json.lines().count(), 1);
    }

    #[test]
    fn render_is_deterministic() {
        let adapter = JsonReportAdapter::default();
        let report = sample_report();
        assert_eq!(adapter.render(&report).unwrap(), adapter.render(&report).unwrap());
    }

    #[test]
    fn missing_directory_is_report_error() {
        let result = JsonReportAdapter::default().write(&sample_report(), "/nonexistent/dir/report.json");
        assert!(matches!(result, Err(ConfluenceError::Report { .. })));
    }
}
