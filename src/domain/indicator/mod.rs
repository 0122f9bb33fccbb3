//! Pure indicator pipelines.
//!
//! Every indicator maps a price series to one `Option<f64>` per input bar.
//! `None` marks a value that is not ready: the warmup window is not yet full,
//! or the value is undefined for the inputs (an unchanged RSI window). All
//! functions are deterministic and re-derivable from raw history alone.

pub mod rsi;
pub mod zscore;
pub mod vrp;

pub use rsi::rsi;
pub use vrp::{realized_volatility, vrp_zscore};
pub use zscore::zscore;
