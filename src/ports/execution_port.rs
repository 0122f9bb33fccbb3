//! Order execution port trait.
//!
//! Quantities are signed share counts: positive buys, negative sells or
//! shorts. Fills are assumed immediate and complete; partial-fill brokers
//! need a richer adapter behind the same trait.

use crate::domain::error::PairtraderError;

pub trait ExecutionPort {
    fn get_price(&self, symbol: &str) -> Result<f64, PairtraderError>;

    /// Cash plus marked positions.
    fn get_account_value(&self) -> Result<f64, PairtraderError>;

    fn submit_order(&self, symbol: &str, quantity: f64) -> Result<(), PairtraderError>;

    /// Flatten every open position, long and short.
    fn close_all_positions(&self) -> Result<(), PairtraderError>;
}
