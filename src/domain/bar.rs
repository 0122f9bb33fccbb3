//! Price bars and synchronized pair series construction.

use chrono::NaiveDateTime;
use std::collections::BTreeMap;

use super::error::PairtraderError;

/// One closing observation of a single instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub symbol: String,
    pub timestamp: NaiveDateTime,
    pub close: f64,
}

/// One synchronized observation of both legs.
///
/// Timestamps are strictly increasing within a run; both prices are positive
/// (alignment drops rows that violate either).
#[derive(Debug, Clone, PartialEq)]
pub struct PairBar {
    pub timestamp: NaiveDateTime,
    pub price_a: f64,
    pub price_b: f64,
}

impl PairBar {
    pub fn ratio(&self) -> f64 {
        self.price_a / self.price_b
    }
}

/// The aligned input set for a run. `implied_vol`, when present, carries one
/// implied-volatility close per bar and is required by the VRP-adaptive
/// strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct PairSeries {
    pub bars: Vec<PairBar>,
    pub implied_vol: Option<Vec<f64>>,
}

impl PairSeries {
    pub fn new(bars: Vec<PairBar>) -> Self {
        PairSeries {
            bars,
            implied_vol: None,
        }
    }

    pub fn with_implied(
        bars: Vec<PairBar>,
        implied_vol: Vec<f64>,
    ) -> Result<Self, PairtraderError> {
        if implied_vol.len() != bars.len() {
            return Err(PairtraderError::InvalidParameter {
                name: "implied_vol".into(),
                reason: format!(
                    "length {} does not match {} bars",
                    implied_vol.len(),
                    bars.len()
                ),
            });
        }
        Ok(PairSeries {
            bars,
            implied_vol: Some(implied_vol),
        })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// Merge multiple downloaded ranges of one instrument into a single sorted
/// history. Duplicate timestamps keep the earliest-seen row.
pub fn merge_chunks(chunks: Vec<Vec<PriceBar>>) -> Vec<PriceBar> {
    let mut merged: Vec<PriceBar> = chunks.into_iter().flatten().collect();
    merged.sort_by_key(|b| b.timestamp);
    merged.dedup_by_key(|b| b.timestamp);
    merged
}

fn closes_by_timestamp(bars: &[PriceBar]) -> BTreeMap<NaiveDateTime, f64> {
    let mut map = BTreeMap::new();
    for bar in bars {
        if bar.close.is_finite() && bar.close > 0.0 {
            map.entry(bar.timestamp).or_insert(bar.close);
        }
    }
    map
}

/// Align two histories on their exact timestamp intersection. Rows present in
/// only one series, and rows with non-positive or non-finite closes, are
/// dropped.
pub fn align_pair(a: &[PriceBar], b: &[PriceBar]) -> Vec<PairBar> {
    let a_map = closes_by_timestamp(a);
    let b_map = closes_by_timestamp(b);

    a_map
        .iter()
        .filter_map(|(&timestamp, &price_a)| {
            b_map.get(&timestamp).map(|&price_b| PairBar {
                timestamp,
                price_a,
                price_b,
            })
        })
        .collect()
}

/// Align both legs and an implied-volatility history on their common
/// timestamps, producing a series ready for the VRP-adaptive strategy.
pub fn align_pair_with_implied(
    a: &[PriceBar],
    b: &[PriceBar],
    implied: &[PriceBar],
) -> PairSeries {
    let a_map = closes_by_timestamp(a);
    let b_map = closes_by_timestamp(b);
    let implied_map = closes_by_timestamp(implied);

    let mut bars = Vec::new();
    let mut implied_vol = Vec::new();
    for (&timestamp, &price_a) in &a_map {
        if let (Some(&price_b), Some(&iv)) = (b_map.get(&timestamp), implied_map.get(&timestamp)) {
            bars.push(PairBar {
                timestamp,
                price_a,
                price_b,
            });
            implied_vol.push(iv);
        }
    }

    PairSeries {
        bars,
        implied_vol: Some(implied_vol),
    }
}
