//! Historical price access port trait.
//!
//! Implied volatility series ride through the same methods: an implied
//! symbol's bars carry the vol level in `close`.

use crate::domain::bar::PriceBar;
use crate::domain::error::PairtraderError;
use chrono::{NaiveDate, NaiveDateTime};

pub trait DataPort {
    /// Closes for `symbol` inside the inclusive date window, ascending by
    /// timestamp. `None` bounds mean unbounded on that side.
    fn fetch_history(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<PriceBar>, PairtraderError>;

    /// The newest `limit` bars for `symbol`, ascending.
    fn fetch_recent(&self, symbol: &str, limit: usize) -> Result<Vec<PriceBar>, PairtraderError>;

    /// Every symbol with stored data, sorted.
    fn list_symbols(&self) -> Result<Vec<String>, PairtraderError>;

    /// First timestamp, last timestamp and bar count, or `None` when the
    /// symbol has no rows.
    fn data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, PairtraderError>;
}
