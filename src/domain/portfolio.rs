//! Two-leg portfolio ledger.
//!
//! Cash plus two signed share quantities. Fills are instantaneous at the
//! bar's close, no commission or slippage, so cash and position value trade
//! off exactly at every transition.

use chrono::NaiveDateTime;

use super::bar::PairBar;
use super::error::PairtraderError;
use super::state_machine::{SpreadPosition, TradeKind, Transition};

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

/// One executed transition. `realized_pnl` is set on the three exit kinds
/// and `None` on entries.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub timestamp: NaiveDateTime,
    pub kind: TradeKind,
    pub indicator: f64,
    pub realized_pnl: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PairPortfolio {
    pub cash: f64,
    pub initial_capital: f64,
    /// Signed share counts. Both zero exactly when flat; when open they
    /// carry opposite signs.
    pub qty_a: f64,
    pub qty_b: f64,
    /// Portfolio value at the instant the open position was entered, before
    /// its fills. Zero while flat.
    pub entry_value: f64,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<TradeRecord>,
}

impl PairPortfolio {
    pub fn new(initial_capital: f64) -> Self {
        PairPortfolio {
            cash: initial_capital,
            initial_capital,
            qty_a: 0.0,
            qty_b: 0.0,
            entry_value: 0.0,
            equity_curve: Vec::new(),
            trades: Vec::new(),
        }
    }

    pub fn is_flat(&self) -> bool {
        self.qty_a == 0.0 && self.qty_b == 0.0
    }

    pub fn mark_to_market(&self, bar: &PairBar) -> f64 {
        self.cash + self.qty_a * bar.price_a + self.qty_b * bar.price_b
    }

    pub fn record_equity(&mut self, timestamp: NaiveDateTime, value: f64) {
        self.equity_curve.push(EquityPoint { timestamp, value });
    }

    /// Execute a transition at this bar's prices.
    ///
    /// Entries split `value * size` evenly across the legs and floor each
    /// leg to whole shares. If either leg floors to zero the entry is
    /// rejected and nothing changes; `Ok(None)` tells the caller to leave
    /// its state machine flat. Exits liquidate both legs and realize pnl
    /// against the entry snapshot.
    pub fn apply_transition(
        &mut self,
        transition: &Transition,
        bar: &PairBar,
    ) -> Result<Option<TradeRecord>, PairtraderError> {
        check_price("leg A", bar.price_a)?;
        check_price("leg B", bar.price_b)?;
        let value = self.mark_to_market(bar);

        let record = match transition {
            Transition::Enter {
                target,
                size,
                indicator,
            } => {
                let leg_dollars = value * size / 2.0;
                let shares_a = (leg_dollars / bar.price_a).floor();
                let shares_b = (leg_dollars / bar.price_b).floor();
                let (qty_a, qty_b) = match target {
                    SpreadPosition::LongAShortB => (shares_a, -shares_b),
                    SpreadPosition::ShortALongB => (-shares_a, shares_b),
                    SpreadPosition::Flat => return Ok(None),
                };
                if shares_a == 0.0 || shares_b == 0.0 {
                    return Ok(None);
                }

                self.qty_a = qty_a;
                self.qty_b = qty_b;
                self.cash -= qty_a * bar.price_a + qty_b * bar.price_b;
                self.entry_value = value;
                TradeRecord {
                    timestamp: bar.timestamp,
                    kind: TradeKind::Enter,
                    indicator: *indicator,
                    realized_pnl: None,
                }
            }
            Transition::Exit { kind, indicator } => {
                if self.is_flat() {
                    return Ok(None);
                }
                self.cash += self.qty_a * bar.price_a + self.qty_b * bar.price_b;
                let realized = value - self.entry_value;
                self.qty_a = 0.0;
                self.qty_b = 0.0;
                self.entry_value = 0.0;
                TradeRecord {
                    timestamp: bar.timestamp,
                    kind: *kind,
                    indicator: *indicator,
                    realized_pnl: Some(realized),
                }
            }
        };

        self.trades.push(record.clone());
        Ok(Some(record))
    }
}

fn check_price(symbol: &str, price: f64) -> Result<(), PairtraderError> {
    if price.is_finite() && price > 0.0 {
        Ok(())
    } else {
        Err(PairtraderError::InvalidPrice {
            symbol: symbol.to_string(),
            price,
        })
    }
}
