#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use pairtrader::domain::backtest::BacktestConfig;
use pairtrader::domain::bar::{PairBar, PairSeries, PriceBar};
use pairtrader::domain::error::PairtraderError;
use pairtrader::domain::strategy::{PairStrategy, RsiThresholdParams, ZScoreParams};
use pairtrader::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_history(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<PriceBar>, PairtraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(PairtraderError::DataSource {
                reason: reason.clone(),
            });
        }
        let mut bars = self.data.get(symbol).cloned().unwrap_or_default();
        bars.retain(|b| {
            let date = b.timestamp.date();
            start_date.is_none_or(|start| date >= start) && end_date.is_none_or(|end| date <= end)
        });
        Ok(bars)
    }

    fn fetch_recent(&self, symbol: &str, limit: usize) -> Result<Vec<PriceBar>, PairtraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(PairtraderError::DataSource {
                reason: reason.clone(),
            });
        }
        let bars = self.data.get(symbol).cloned().unwrap_or_default();
        let skip = bars.len().saturating_sub(limit);
        Ok(bars[skip..].to_vec())
    }

    fn list_symbols(&self) -> Result<Vec<String>, PairtraderError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, PairtraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(PairtraderError::DataSource {
                reason: reason.clone(),
            });
        }
        match self.data.get(symbol) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.timestamp).min().unwrap();
                let max = bars.iter().map(|b| b.timestamp).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(symbol: &str, day: &str, close: f64) -> PriceBar {
    PriceBar {
        symbol: symbol.to_string(),
        timestamp: NaiveDate::parse_from_str(day, "%Y-%m-%d")
            .unwrap()
            .and_time(NaiveTime::MIN),
        close,
    }
}

/// Daily bars starting at `start_date`, one per close in `closes`.
pub fn make_daily_bars(symbol: &str, start_date: &str, closes: &[f64]) -> Vec<PriceBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            symbol: symbol.to_string(),
            timestamp: (start + chrono::Duration::days(i as i64)).and_time(NaiveTime::MIN),
            close,
        })
        .collect()
}

/// An already-aligned series with daily bars from 2024-01-01.
pub fn make_pair_series(prices_a: &[f64], prices_b: &[f64]) -> PairSeries {
    let start = date(2024, 1, 1);
    let bars = prices_a
        .iter()
        .zip(prices_b)
        .enumerate()
        .map(|(i, (&price_a, &price_b))| PairBar {
            timestamp: (start + chrono::Duration::days(i as i64)).and_time(NaiveTime::MIN),
            price_a,
            price_b,
        })
        .collect();
    PairSeries::new(bars)
}

pub fn make_rsi_strategy() -> PairStrategy {
    PairStrategy::RsiThreshold(RsiThresholdParams::new(3, 70.0, 50.0, 0.9, None).unwrap())
}

pub fn make_zscore_strategy() -> PairStrategy {
    PairStrategy::ZScore(ZScoreParams::new(5, 1.5, 0.3, 0.8).unwrap())
}

pub fn sample_run_config() -> BacktestConfig {
    BacktestConfig {
        initial_capital: 100_000.0,
        start_date: None,
        end_date: None,
    }
}
