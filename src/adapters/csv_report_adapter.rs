//! CSV report adapter.
//!
//! Writes three files into the output directory: `equity_curve.csv`,
//! `trades.csv` and a human-readable `summary.txt`.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::PairtraderError;
use crate::domain::strategy::PairStrategy;
use crate::ports::report_port::ReportPort;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        CsvReportAdapter
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn csv_err(e: csv::Error) -> PairtraderError {
    PairtraderError::Io(std::io::Error::other(e))
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        strategy: &PairStrategy,
        output_dir: &Path,
    ) -> Result<(), PairtraderError> {
        fs::create_dir_all(output_dir)?;

        let mut equity = csv::Writer::from_path(output_dir.join("equity_curve.csv"))
            .map_err(csv_err)?;
        equity.write_record(["timestamp", "value"]).map_err(csv_err)?;
        for point in &result.portfolio.equity_curve {
            equity
                .write_record([
                    point.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                    format!("{:.2}", point.value),
                ])
                .map_err(csv_err)?;
        }
        equity.flush()?;

        let mut trades =
            csv::Writer::from_path(output_dir.join("trades.csv")).map_err(csv_err)?;
        trades
            .write_record(["timestamp", "kind", "indicator", "realized_pnl"])
            .map_err(csv_err)?;
        for trade in &result.portfolio.trades {
            let pnl = trade
                .realized_pnl
                .map(|p| format!("{:.2}", p))
                .unwrap_or_default();
            trades
                .write_record([
                    trade.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                    trade.kind.to_string(),
                    format!("{:.4}", trade.indicator),
                    pnl,
                ])
                .map_err(csv_err)?;
        }
        trades.flush()?;

        let summary = &result.summary;
        let mut text = String::new();
        let _ = writeln!(text, "Strategy:         {}", strategy.name());
        let _ = writeln!(text, "Initial Capital:  {:.2}", summary.initial_capital);
        let _ = writeln!(text, "Final Value:      {:.2}", summary.final_value);
        let _ = writeln!(text, "Total PnL:        {:.2}", summary.total_pnl);
        let _ = writeln!(text, "Return:           {:.2}%", summary.return_pct);
        let _ = writeln!(text, "Trades:           {}", summary.trade_count);
        let _ = writeln!(text, "Stop Losses:      {}", summary.stop_loss_count);
        let _ = writeln!(text, "Panic Exits:      {}", summary.panic_exit_count);
        match summary.avg_pnl_per_trade {
            Some(avg) => {
                let _ = writeln!(text, "Avg PnL/Trade:    {:.2}", avg);
            }
            None => {
                let _ = writeln!(text, "Avg PnL/Trade:    n/a");
            }
        }
        match summary.sharpe_ratio {
            Some(sharpe) => {
                let _ = writeln!(text, "Sharpe Ratio:     {:.2}", sharpe);
            }
            None => {
                let _ = writeln!(text, "Sharpe Ratio:     n/a");
            }
        }
        fs::write(output_dir.join("summary.txt"), text)?;

        Ok(())
    }
}
