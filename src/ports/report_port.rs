//! Report output port trait.

use crate::domain::backtest::BacktestReport;
use crate::domain::error::ConfluenceError;

/// Port for writing backtest reports.
pub trait ReportPort {
    /// Write `report` to `output_path`; `-` means stdout.
    fn write(&self, report: &BacktestReport, output_path: &str) -> Result<(), ConfluenceError>;
}
