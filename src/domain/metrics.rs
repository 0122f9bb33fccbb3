//! Performance metrics over a finished run.

use super::portfolio::PairPortfolio;
use super::state_machine::TradeKind;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Headline numbers for one backtest.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub initial_capital: f64,
    pub final_value: f64,
    pub total_pnl: f64,
    pub return_pct: f64,
    /// Round trips opened, i.e. entry fills.
    pub trade_count: usize,
    pub stop_loss_count: usize,
    pub panic_exit_count: usize,
    /// Mean realized pnl across closed trades. `None` until something
    /// closed.
    pub avg_pnl_per_trade: Option<f64>,
    /// Annualized, from per-bar equity returns. `None` when the curve is
    /// too short or never moves.
    pub sharpe_ratio: Option<f64>,
}

impl Summary {
    pub fn compute(portfolio: &PairPortfolio, final_value: f64) -> Summary {
        let initial_capital = portfolio.initial_capital;
        let total_pnl = final_value - initial_capital;
        let return_pct = if initial_capital > 0.0 {
            total_pnl / initial_capital * 100.0
        } else {
            0.0
        };

        let trade_count = portfolio
            .trades
            .iter()
            .filter(|t| t.kind == TradeKind::Enter)
            .count();
        let stop_loss_count = portfolio
            .trades
            .iter()
            .filter(|t| t.kind == TradeKind::StopLoss)
            .count();
        let panic_exit_count = portfolio
            .trades
            .iter()
            .filter(|t| t.kind == TradeKind::PanicExit)
            .count();

        let closed: Vec<f64> = portfolio
            .trades
            .iter()
            .filter_map(|t| t.realized_pnl)
            .collect();
        let avg_pnl_per_trade = if closed.is_empty() {
            None
        } else {
            Some(closed.iter().sum::<f64>() / closed.len() as f64)
        };

        let values: Vec<f64> = portfolio.equity_curve.iter().map(|p| p.value).collect();

        Summary {
            initial_capital,
            final_value,
            total_pnl,
            return_pct,
            trade_count,
            stop_loss_count,
            panic_exit_count,
            avg_pnl_per_trade,
            sharpe_ratio: annualized_sharpe(&values),
        }
    }
}

/// Sharpe ratio of per-bar simple returns, zero risk-free rate, annualized
/// by `sqrt(252)`. `None` when fewer than two returns exist or the returns
/// never vary.
pub fn annualized_sharpe(equity: &[f64]) -> Option<f64> {
    let returns: Vec<f64> = equity
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect();
    if returns.len() < 2 {
        return None;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std = variance.sqrt();
    if std > 0.0 {
        Some(mean / std * TRADING_DAYS_PER_YEAR.sqrt())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state_machine::TradeKind;
    use crate::domain::portfolio::TradeRecord;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn ts(day: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(16, 0, 0)
            .unwrap()
    }

    fn trade(kind: TradeKind, realized_pnl: Option<f64>) -> TradeRecord {
        TradeRecord {
            timestamp: ts(1),
            kind,
            indicator: 60.0,
            realized_pnl,
        }
    }

    #[test]
    fn sharpe_needs_two_returns() {
        assert_eq!(annualized_sharpe(&[]), None);
        assert_eq!(annualized_sharpe(&[100_000.0]), None);
        assert_eq!(annualized_sharpe(&[100_000.0, 100_100.0]), None);
    }

    #[test]
    fn sharpe_none_on_flat_curve() {
        let flat = [100_000.0; 10];
        assert_eq!(annualized_sharpe(&flat), None);
    }

    #[test]
    fn sharpe_known_value() {
        // Returns alternate +1% and -1%: mean 0 would kill it, so tilt one.
        let equity = [100.0, 102.0, 100.98, 103.0];
        let r1: f64 = 0.02;
        let r2 = 100.98 / 102.0 - 1.0;
        let r3 = 103.0 / 100.98 - 1.0;
        let mean = (r1 + r2 + r3) / 3.0;
        let var = ((r1 - mean).powi(2) + (r2 - mean).powi(2) + (r3 - mean).powi(2)) / 2.0;
        let expected = mean / var.sqrt() * 252.0_f64.sqrt();

        assert_relative_eq!(annualized_sharpe(&equity).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn sharpe_skips_non_positive_bases() {
        // A zero value cannot be a return base; that window drops.
        let equity = [100.0, 0.0, 100.0, 101.0, 103.0];
        assert!(annualized_sharpe(&equity).is_some());
    }

    #[test]
    fn summary_counts_trade_kinds() {
        let mut p = PairPortfolio::new(100_000.0);
        p.trades = vec![
            trade(TradeKind::Enter, None),
            trade(TradeKind::Exit, Some(1_000.0)),
            trade(TradeKind::Enter, None),
            trade(TradeKind::StopLoss, Some(-2_000.0)),
            trade(TradeKind::Enter, None),
            trade(TradeKind::PanicExit, Some(-500.0)),
        ];

        let s = Summary::compute(&p, 98_500.0);
        assert_eq!(s.trade_count, 3);
        assert_eq!(s.stop_loss_count, 1);
        assert_eq!(s.panic_exit_count, 1);
        assert_relative_eq!(s.avg_pnl_per_trade.unwrap(), -500.0, epsilon = 1e-9);
        assert_relative_eq!(s.total_pnl, -1_500.0, epsilon = 1e-9);
        assert_relative_eq!(s.return_pct, -1.5, epsilon = 1e-9);
    }

    #[test]
    fn summary_with_no_trades() {
        let mut p = PairPortfolio::new(100_000.0);
        for day in 1..=5 {
            p.record_equity(ts(day), 100_000.0);
        }

        let s = Summary::compute(&p, 100_000.0);
        assert_eq!(s.trade_count, 0);
        assert_eq!(s.avg_pnl_per_trade, None);
        assert_eq!(s.sharpe_ratio, None);
        assert_eq!(s.return_pct, 0.0);
    }
}
