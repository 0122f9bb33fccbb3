//! Backtest engine: replay an aligned pair series through a strategy.
//!
//! One pass, bar by bar. Equity is recorded before the bar's transition so
//! the curve reflects what the book was worth when the decision was made.

use chrono::NaiveDate;

use super::bar::PairSeries;
use super::error::PairtraderError;
use super::metrics::Summary;
use super::portfolio::PairPortfolio;
use super::state_machine::PositionStateMachine;
use super::strategy::PairStrategy;

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    /// Inclusive date window applied when history is fetched. `None` means
    /// everything the data source has.
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 100_000.0,
            start_date: None,
            end_date: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub portfolio: PairPortfolio,
    pub summary: Summary,
}

/// Run one strategy over one aligned series.
///
/// Warmup bars where the strategy cannot decide yet are held through;
/// rejected entries (a leg floored to zero) leave the machine flat. Fatal
/// errors, a missing implied volatility series for instance, abort the run.
pub fn run_backtest(
    strategy: &PairStrategy,
    series: &PairSeries,
    config: &BacktestConfig,
) -> Result<BacktestResult, PairtraderError> {
    if !(config.initial_capital.is_finite() && config.initial_capital > 0.0) {
        return Err(PairtraderError::InvalidParameter {
            name: "initial_capital".to_string(),
            reason: "must be positive".to_string(),
        });
    }
    if series.is_empty() {
        return Err(PairtraderError::InsufficientData {
            what: "aligned pair series".to_string(),
            have: 0,
            need: 1,
        });
    }

    let frame = strategy.compute_indicators(series)?;
    let mut portfolio = PairPortfolio::new(config.initial_capital);
    let mut machine = PositionStateMachine::new(strategy.stop_loss_pct());

    for (index, bar) in series.bars.iter().enumerate() {
        let value = portfolio.mark_to_market(bar);
        portfolio.record_equity(bar.timestamp, value);

        let signal = match strategy.decide(&frame, index, machine.position()) {
            Ok(signal) => signal,
            Err(e) if e.is_recoverable() => continue,
            Err(e) => return Err(e),
        };

        let Some(transition) = machine.evaluate(&signal, value, portfolio.entry_value) else {
            continue;
        };

        match portfolio.apply_transition(&transition, bar) {
            Ok(Some(_)) => machine.apply(&transition),
            Ok(None) => {}
            Err(e) if e.is_recoverable() => {}
            Err(e) => return Err(e),
        }
    }

    let final_value = series
        .bars
        .last()
        .map(|bar| portfolio.mark_to_market(bar))
        .unwrap_or(config.initial_capital);
    let summary = Summary::compute(&portfolio, final_value);

    Ok(BacktestResult { portfolio, summary })
}
