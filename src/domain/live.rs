//! Live polling driver.
//!
//! One `tick` per poll: recompute indicators over the fetched lookback
//! window, decide at the newest bar, and push any transition through the
//! execution port. Every port call can fail; a failed tick reports the
//! reason and leaves both the local book and the broker untouched, so the
//! next poll retries from the same state.

use chrono::NaiveDateTime;

use super::bar::PairSeries;
use super::error::PairtraderError;
use super::state_machine::{PositionStateMachine, SpreadPosition, TradeKind, Transition};
use super::strategy::PairStrategy;
use crate::ports::execution_port::ExecutionPort;

#[derive(Debug, Clone)]
pub struct LiveConfig {
    pub poll_interval_secs: u64,
    /// Bars fetched per poll. Clamped up to the strategy's minimum history
    /// by the caller.
    pub lookback_bars: usize,
}

impl Default for LiveConfig {
    fn default() -> Self {
        LiveConfig {
            poll_interval_secs: 300,
            lookback_bars: 100,
        }
    }
}

/// What one poll did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickAction {
    Hold,
    Enter {
        target: SpreadPosition,
        qty_a: f64,
        qty_b: f64,
    },
    Exit {
        kind: TradeKind,
    },
    /// Nothing was done and nothing changed; the reason says why.
    Skipped {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub timestamp: NaiveDateTime,
    /// Position after the tick.
    pub position: SpreadPosition,
    pub indicator: Option<f64>,
    pub action: TickAction,
}

/// Strategy runner against a broker-shaped port. Keeps its own optimistic
/// estimates of the open legs; the broker's book is reconciled only through
/// `close_all_positions`, which flattens everything regardless of what the
/// local estimates say.
pub struct LiveDriver {
    strategy: PairStrategy,
    machine: PositionStateMachine,
    symbol_a: String,
    symbol_b: String,
    qty_a: f64,
    qty_b: f64,
    entry_value: f64,
}

impl LiveDriver {
    pub fn new(strategy: PairStrategy, symbol_a: &str, symbol_b: &str) -> Self {
        let machine = PositionStateMachine::new(strategy.stop_loss_pct());
        LiveDriver {
            strategy,
            machine,
            symbol_a: symbol_a.to_string(),
            symbol_b: symbol_b.to_string(),
            qty_a: 0.0,
            qty_b: 0.0,
            entry_value: 0.0,
        }
    }

    pub fn position(&self) -> SpreadPosition {
        self.machine.position()
    }

    pub fn strategy(&self) -> &PairStrategy {
        &self.strategy
    }

    /// Evaluate the newest bar of `series` and act on it.
    pub fn tick(&mut self, series: &PairSeries, execution: &dyn ExecutionPort) -> TickReport {
        let Some(last_bar) = series.bars.last() else {
            return self.skipped(NaiveDateTime::default(), None, "no bars in lookback window");
        };
        let timestamp = last_bar.timestamp;
        let index = series.len() - 1;

        let frame = match self.strategy.compute_indicators(series) {
            Ok(frame) => frame,
            Err(e) => return self.skipped(timestamp, None, &e.to_string()),
        };
        let signal = match self.strategy.decide(&frame, index, self.machine.position()) {
            Ok(signal) => signal,
            Err(e) => return self.skipped(timestamp, None, &e.to_string()),
        };
        let indicator = Some(signal.indicator);

        let account_value = match execution.get_account_value() {
            Ok(value) => value,
            Err(e) => return self.skipped(timestamp, indicator, &e.to_string()),
        };

        let Some(transition) = self.machine.evaluate(&signal, account_value, self.entry_value)
        else {
            return TickReport {
                timestamp,
                position: self.machine.position(),
                indicator,
                action: TickAction::Hold,
            };
        };

        let action = match &transition {
            Transition::Enter { target, size, .. } => {
                match self.execute_entry(*target, *size, account_value, execution) {
                    Ok(action) => action,
                    Err(reason) => return self.skipped(timestamp, indicator, &reason),
                }
            }
            Transition::Exit { kind, .. } => match execution.close_all_positions() {
                Ok(()) => {
                    self.qty_a = 0.0;
                    self.qty_b = 0.0;
                    self.entry_value = 0.0;
                    TickAction::Exit { kind: *kind }
                }
                Err(e) => return self.skipped(timestamp, indicator, &e.to_string()),
            },
        };

        self.machine.apply(&transition);
        TickReport {
            timestamp,
            position: self.machine.position(),
            indicator,
            action,
        }
    }

    /// Close everything at the broker and reset the local book. Called on
    /// shutdown no matter what state the driver believes it is in.
    pub fn flatten(&mut self, execution: &dyn ExecutionPort) -> Result<(), PairtraderError> {
        execution.close_all_positions()?;
        self.qty_a = 0.0;
        self.qty_b = 0.0;
        self.entry_value = 0.0;
        self.machine = PositionStateMachine::new(self.strategy.stop_loss_pct());
        Ok(())
    }

    fn execute_entry(
        &mut self,
        target: SpreadPosition,
        size: f64,
        account_value: f64,
        execution: &dyn ExecutionPort,
    ) -> Result<TickAction, String> {
        let price_a = fetch_price(execution, &self.symbol_a)?;
        let price_b = fetch_price(execution, &self.symbol_b)?;

        let leg_dollars = account_value * size / 2.0;
        let shares_a = (leg_dollars / price_a).floor();
        let shares_b = (leg_dollars / price_b).floor();
        if shares_a == 0.0 || shares_b == 0.0 {
            return Err("entry rejected: a leg floors to zero shares".to_string());
        }
        let (qty_a, qty_b) = match target {
            SpreadPosition::LongAShortB => (shares_a, -shares_b),
            SpreadPosition::ShortALongB => (-shares_a, shares_b),
            SpreadPosition::Flat => return Err("entry target is flat".to_string()),
        };

        execution
            .submit_order(&self.symbol_a, qty_a)
            .map_err(|e| e.to_string())?;
        if let Err(e) = execution.submit_order(&self.symbol_b, qty_b) {
            // Leg A is already live; unwind it rather than run one-legged.
            let unwound = execution.submit_order(&self.symbol_a, -qty_a).is_ok();
            let note = if unwound {
                "leg A unwound"
            } else {
                "leg A unwind failed, close-all on next exit will catch it"
            };
            return Err(format!("leg B order failed ({e}); {note}"));
        }

        self.qty_a = qty_a;
        self.qty_b = qty_b;
        self.entry_value = account_value;
        Ok(TickAction::Enter { target, qty_a, qty_b })
    }

    fn skipped(
        &self,
        timestamp: NaiveDateTime,
        indicator: Option<f64>,
        reason: &str,
    ) -> TickReport {
        TickReport {
            timestamp,
            position: self.machine.position(),
            indicator,
            action: TickAction::Skipped {
                reason: reason.to_string(),
            },
        }
    }
}

fn fetch_price(execution: &dyn ExecutionPort, symbol: &str) -> Result<f64, String> {
    let price = execution.get_price(symbol).map_err(|e| e.to_string())?;
    if price.is_finite() && price > 0.0 {
        Ok(price)
    } else {
        Err(PairtraderError::InvalidPrice {
            symbol: symbol.to_string(),
            price,
        }
        .to_string())
    }
}
