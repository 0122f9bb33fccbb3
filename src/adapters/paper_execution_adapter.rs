//! In-memory paper broker.
//!
//! Fills every order instantly and completely at the last mark supplied
//! through `set_price`. The driver owning the adapter is responsible for
//! refreshing marks before each tick; an order against a symbol with no
//! mark fails like a rejected order would.

use crate::domain::error::PairtraderError;
use crate::ports::execution_port::ExecutionPort;
use std::cell::RefCell;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct PaperAccount {
    cash: f64,
    /// Signed share counts keyed by symbol. Zero entries are removed.
    positions: HashMap<String, f64>,
    marks: HashMap<String, f64>,
}

pub struct PaperExecutionAdapter {
    account: RefCell<PaperAccount>,
}

impl PaperExecutionAdapter {
    pub fn new(initial_cash: f64) -> Self {
        PaperExecutionAdapter {
            account: RefCell::new(PaperAccount {
                cash: initial_cash,
                ..PaperAccount::default()
            }),
        }
    }

    pub fn set_price(&self, symbol: &str, price: f64) {
        self.account
            .borrow_mut()
            .marks
            .insert(symbol.to_string(), price);
    }

    pub fn cash(&self) -> f64 {
        self.account.borrow().cash
    }

    pub fn position(&self, symbol: &str) -> f64 {
        self.account
            .borrow()
            .positions
            .get(symbol)
            .copied()
            .unwrap_or(0.0)
    }
}

fn no_mark(action: &str, symbol: &str) -> PairtraderError {
    PairtraderError::ExecutionFailure {
        action: action.to_string(),
        reason: format!("no mark for {}", symbol),
    }
}

impl ExecutionPort for PaperExecutionAdapter {
    fn get_price(&self, symbol: &str) -> Result<f64, PairtraderError> {
        self.account
            .borrow()
            .marks
            .get(symbol)
            .copied()
            .ok_or_else(|| no_mark("get_price", symbol))
    }

    fn get_account_value(&self) -> Result<f64, PairtraderError> {
        let account = self.account.borrow();
        let mut value = account.cash;
        for (symbol, qty) in &account.positions {
            let mark = account
                .marks
                .get(symbol)
                .copied()
                .ok_or_else(|| no_mark("get_account_value", symbol))?;
            value += qty * mark;
        }
        Ok(value)
    }

    fn submit_order(&self, symbol: &str, quantity: f64) -> Result<(), PairtraderError> {
        let mut account = self.account.borrow_mut();
        let mark = account
            .marks
            .get(symbol)
            .copied()
            .ok_or_else(|| no_mark("submit_order", symbol))?;

        account.cash -= quantity * mark;
        let entry = account.positions.entry(symbol.to_string()).or_insert(0.0);
        *entry += quantity;
        if *entry == 0.0 {
            account.positions.remove(symbol);
        }
        Ok(())
    }

    fn close_all_positions(&self) -> Result<(), PairtraderError> {
        let mut account = self.account.borrow_mut();
        // Fail before touching anything if any mark is missing.
        let mut proceeds = 0.0;
        for (symbol, qty) in &account.positions {
            let mark = account
                .marks
                .get(symbol)
                .copied()
                .ok_or_else(|| no_mark("close_all_positions", symbol))?;
            proceeds += qty * mark;
        }
        account.cash += proceeds;
        account.positions.clear();
        Ok(())
    }
}
