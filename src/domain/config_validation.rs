//! Configuration validation.
//!
//! Structural checks on the INI file: sections and keys present, dates
//! parseable, kinds known. Numeric strategy bounds live with the parameter
//! constructors in [`super::strategy`]; building a strategy from a config
//! is the second half of validation.

use crate::domain::error::PairtraderError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const STRATEGY_KINDS: [&str; 3] = ["rsi_threshold", "zscore", "vrp_adaptive"];

/// Everything the backtest and live subcommands both need.
pub fn validate_common_config(config: &dyn ConfigPort) -> Result<(), PairtraderError> {
    validate_data_dir(config)?;
    validate_pair(config)?;
    validate_strategy_kind(config)?;
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), PairtraderError> {
    validate_initial_capital(config)?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_live_config(config: &dyn ConfigPort) -> Result<(), PairtraderError> {
    let poll = config.get_int("live", "poll_interval_secs", 300);
    if poll < 1 {
        return Err(invalid("live", "poll_interval_secs", "must be at least 1"));
    }
    let lookback = config.get_int("live", "lookback_bars", 100);
    if lookback < 2 {
        return Err(invalid("live", "lookback_bars", "must be at least 2"));
    }
    Ok(())
}

fn validate_data_dir(config: &dyn ConfigPort) -> Result<(), PairtraderError> {
    match config.get_string("data", "dir") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        Some(_) => Err(invalid("data", "dir", "must not be empty")),
        None => Err(missing("data", "dir")),
    }
}

fn validate_pair(config: &dyn ConfigPort) -> Result<(), PairtraderError> {
    let symbol_a = require_symbol(config, "symbol_a")?;
    let symbol_b = require_symbol(config, "symbol_b")?;
    if symbol_a == symbol_b {
        return Err(invalid(
            "pair",
            "symbol_b",
            "must differ from symbol_a",
        ));
    }
    if let Some(s) = config.get_string("pair", "implied_vol_symbol") {
        if s.trim().is_empty() {
            return Err(invalid("pair", "implied_vol_symbol", "must not be empty"));
        }
    }
    Ok(())
}

fn require_symbol(config: &dyn ConfigPort, key: &str) -> Result<String, PairtraderError> {
    match config.get_string("pair", key) {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(_) => Err(invalid("pair", key, "must not be empty")),
        None => Err(missing("pair", key)),
    }
}

fn validate_strategy_kind(config: &dyn ConfigPort) -> Result<(), PairtraderError> {
    let kind = match config.get_string("strategy", "kind") {
        Some(s) if !s.trim().is_empty() => s.trim().to_string(),
        Some(_) => return Err(invalid("strategy", "kind", "must not be empty")),
        None => return Err(missing("strategy", "kind")),
    };
    if !STRATEGY_KINDS.contains(&kind.as_str()) {
        return Err(invalid(
            "strategy",
            "kind",
            &format!("unknown kind, expected one of {}", STRATEGY_KINDS.join(", ")),
        ));
    }
    // The VRP strategy cannot run without an implied volatility series.
    if kind == "vrp_adaptive" && config.get_string("pair", "implied_vol_symbol").is_none() {
        return Err(missing("pair", "implied_vol_symbol"));
    }
    Ok(())
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), PairtraderError> {
    let value = config.get_double("backtest", "initial_capital", 100_000.0);
    if !(value.is_finite() && value > 0.0) {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "must be positive",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), PairtraderError> {
    let start = parse_optional_date(config, "start_date")?;
    let end = parse_optional_date(config, "end_date")?;
    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(invalid(
                "backtest",
                "start_date",
                "must be before end_date",
            ));
        }
    }
    Ok(())
}

/// Both dates are optional; an absent bound leaves that side of the window
/// open.
pub fn parse_optional_date(
    config: &dyn ConfigPort,
    key: &str,
) -> Result<Option<NaiveDate>, PairtraderError> {
    match config.get_string("backtest", key) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                invalid(
                    "backtest",
                    key,
                    &format!("invalid {} format, expected YYYY-MM-DD", key),
                )
            }),
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> PairtraderError {
    PairtraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn missing(section: &str, key: &str) -> PairtraderError {
    PairtraderError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}
