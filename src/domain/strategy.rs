//! Pair-trading strategies.
//!
//! Each strategy is a pure function of history: it computes its indicator
//! columns once over the whole aligned series, then answers per-bar position
//! questions from those columns. Backtest and live replay therefore see
//! identical decisions for identical history.

use super::bar::{PairBar, PairSeries};
use super::error::PairtraderError;
use super::indicator::{rsi, vrp_zscore, zscore};
use super::state_machine::SpreadPosition;

/// What a strategy wants at one bar. `target: None` means hold whatever is
/// on. `indicator` is the value that drove the decision, carried through to
/// trade records and status lines.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub target: Option<SpreadPosition>,
    pub size: f64,
    pub indicator: f64,
    pub regime_safe: bool,
}

/// Indicator columns for one series, one entry per bar, `None` until the
/// window behind it is full. Variants fill only the columns they read.
#[derive(Debug, Clone, Default)]
pub struct IndicatorFrame {
    /// Ratio RSI or ratio z-score, depending on the strategy.
    pub primary: Vec<Option<f64>>,
    pub rsi_a: Vec<Option<f64>>,
    pub rsi_b: Vec<Option<f64>>,
    pub vrp_z: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RsiThresholdParams {
    pub rsi_period: usize,
    pub entry_high: f64,
    pub exit_level: f64,
    pub position_size: f64,
    pub stop_loss_pct: Option<f64>,
}

impl RsiThresholdParams {
    pub fn new(
        rsi_period: usize,
        entry_high: f64,
        exit_level: f64,
        position_size: f64,
        stop_loss_pct: Option<f64>,
    ) -> Result<Self, PairtraderError> {
        if rsi_period < 1 {
            return Err(invalid("rsi_period", "must be at least 1"));
        }
        if !(entry_high > 50.0 && entry_high < 100.0) {
            return Err(invalid("entry_high", "must be between 50 and 100 exclusive"));
        }
        if !(exit_level > 0.0 && exit_level < entry_high) {
            return Err(invalid("exit_level", "must be between 0 and entry_high"));
        }
        check_position_size(position_size)?;
        if let Some(stop) = stop_loss_pct {
            if !(stop > 0.0 && stop.is_finite()) {
                return Err(invalid("stop_loss_pct", "must be positive"));
            }
        }
        Ok(RsiThresholdParams {
            rsi_period,
            entry_high,
            exit_level,
            position_size,
            stop_loss_pct,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZScoreParams {
    pub lookback: usize,
    pub entry_z: f64,
    pub exit_z: f64,
    pub position_size: f64,
}

impl ZScoreParams {
    pub fn new(
        lookback: usize,
        entry_z: f64,
        exit_z: f64,
        position_size: f64,
    ) -> Result<Self, PairtraderError> {
        if lookback < 2 {
            return Err(invalid("lookback", "must be at least 2"));
        }
        if !(entry_z > 0.0 && entry_z.is_finite()) {
            return Err(invalid("entry_z", "must be positive"));
        }
        if !(exit_z >= 0.0 && exit_z < entry_z) {
            return Err(invalid("exit_z", "must be non-negative and below entry_z"));
        }
        check_position_size(position_size)?;
        Ok(ZScoreParams {
            lookback,
            entry_z,
            exit_z,
            position_size,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VrpAdaptiveParams {
    pub rsi_period: usize,
    pub entry_threshold: f64,
    pub exit_threshold: f64,
    pub position_size: f64,
    /// Lower bound on the VRP z-score; below it every open position is
    /// flattened and entries are blocked.
    pub panic_threshold: f64,
    pub vol_window: usize,
    pub zscore_window: usize,
}

impl VrpAdaptiveParams {
    pub fn new(
        rsi_period: usize,
        entry_threshold: f64,
        exit_threshold: f64,
        position_size: f64,
        panic_threshold: f64,
        vol_window: usize,
        zscore_window: usize,
    ) -> Result<Self, PairtraderError> {
        if rsi_period < 1 {
            return Err(invalid("rsi_period", "must be at least 1"));
        }
        if !(entry_threshold > 50.0 && entry_threshold < 100.0) {
            return Err(invalid(
                "entry_threshold",
                "must be between 50 and 100 exclusive",
            ));
        }
        if !(exit_threshold > 0.0 && exit_threshold < entry_threshold) {
            return Err(invalid(
                "exit_threshold",
                "must be between 0 and entry_threshold",
            ));
        }
        check_position_size(position_size)?;
        if !(panic_threshold < 0.0) {
            return Err(invalid("panic_threshold", "must be negative"));
        }
        if vol_window < 2 {
            return Err(invalid("vol_window", "must be at least 2"));
        }
        if zscore_window < 2 {
            return Err(invalid("zscore_window", "must be at least 2"));
        }
        Ok(VrpAdaptiveParams {
            rsi_period,
            entry_threshold,
            exit_threshold,
            position_size,
            panic_threshold,
            vol_window,
            zscore_window,
        })
    }
}

fn invalid(name: &str, reason: &str) -> PairtraderError {
    PairtraderError::InvalidParameter {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

fn check_position_size(position_size: f64) -> Result<(), PairtraderError> {
    if position_size > 0.0 && position_size <= 1.0 {
        Ok(())
    } else {
        Err(invalid("position_size", "must be in (0, 1]"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PairStrategy {
    /// Mean reversion on the RSI of the A/B price ratio, symmetric entry
    /// band around 50.
    RsiThreshold(RsiThresholdParams),
    /// Mean reversion on the rolling z-score of the A/B price ratio.
    ZScore(ZScoreParams),
    /// Per-leg RSI entries, sized and vetoed by the volatility risk premium
    /// regime of leg A.
    VrpAdaptive(VrpAdaptiveParams),
}

impl PairStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            PairStrategy::RsiThreshold(_) => "rsi_threshold",
            PairStrategy::ZScore(_) => "zscore",
            PairStrategy::VrpAdaptive(_) => "vrp_adaptive",
        }
    }

    pub fn stop_loss_pct(&self) -> Option<f64> {
        match self {
            PairStrategy::RsiThreshold(p) => p.stop_loss_pct,
            PairStrategy::ZScore(_) | PairStrategy::VrpAdaptive(_) => None,
        }
    }

    /// Bars of history after which every indicator column this strategy
    /// reads is ready. Live drivers use it to size their lookback fetch.
    pub fn min_history(&self) -> usize {
        match self {
            PairStrategy::RsiThreshold(p) => p.rsi_period + 1,
            PairStrategy::ZScore(p) => p.lookback,
            PairStrategy::VrpAdaptive(p) => {
                (p.rsi_period + 1).max(p.vol_window + p.zscore_window)
            }
        }
    }

    /// Compute every indicator column this strategy reads, over the full
    /// series. The VRP variant requires an implied volatility column.
    pub fn compute_indicators(
        &self,
        series: &PairSeries,
    ) -> Result<IndicatorFrame, PairtraderError> {
        let mut frame = IndicatorFrame::default();
        match self {
            PairStrategy::RsiThreshold(p) => {
                let ratio: Vec<f64> = series.bars.iter().map(PairBar::ratio).collect();
                frame.primary = rsi(&ratio, p.rsi_period);
            }
            PairStrategy::ZScore(p) => {
                let ratio: Vec<f64> = series.bars.iter().map(PairBar::ratio).collect();
                frame.primary = zscore(&ratio, p.lookback);
            }
            PairStrategy::VrpAdaptive(p) => {
                let implied = series.implied_vol.as_ref().ok_or_else(|| {
                    PairtraderError::NoData {
                        symbol: "implied volatility series".to_string(),
                    }
                })?;
                let closes_a: Vec<f64> = series.bars.iter().map(|b| b.price_a).collect();
                let closes_b: Vec<f64> = series.bars.iter().map(|b| b.price_b).collect();
                frame.rsi_a = rsi(&closes_a, p.rsi_period);
                frame.rsi_b = rsi(&closes_b, p.rsi_period);
                frame.vrp_z = vrp_zscore(implied, &closes_a, p.vol_window, p.zscore_window);
            }
        }
        Ok(frame)
    }

    /// Decide what position the bar at `index` calls for, given the current
    /// position. Errors with `InsufficientData` while the driving indicator
    /// is still warming up; callers treat that as a hold.
    pub fn decide(
        &self,
        frame: &IndicatorFrame,
        index: usize,
        position: SpreadPosition,
    ) -> Result<Signal, PairtraderError> {
        match self {
            PairStrategy::RsiThreshold(p) => decide_rsi_threshold(p, frame, index, position),
            PairStrategy::ZScore(p) => decide_zscore(p, frame, index, position),
            PairStrategy::VrpAdaptive(p) => decide_vrp_adaptive(p, frame, index, position),
        }
    }
}

fn column_at(
    column: &[Option<f64>],
    index: usize,
    what: &str,
    need: usize,
) -> Result<f64, PairtraderError> {
    column
        .get(index)
        .copied()
        .flatten()
        .ok_or_else(|| PairtraderError::InsufficientData {
            what: what.to_string(),
            have: index + 1,
            need,
        })
}

fn decide_rsi_threshold(
    p: &RsiThresholdParams,
    frame: &IndicatorFrame,
    index: usize,
    position: SpreadPosition,
) -> Result<Signal, PairtraderError> {
    let value = column_at(
        &frame.primary,
        index,
        &format!("rsi({}) of price ratio", p.rsi_period),
        p.rsi_period + 1,
    )?;
    let entry_low = 100.0 - p.entry_high;
    let exit_low = 100.0 - p.exit_level;

    let target = match position {
        SpreadPosition::Flat => {
            if value > p.entry_high {
                // Ratio rich: short A, long B.
                Some(SpreadPosition::ShortALongB)
            } else if value < entry_low {
                Some(SpreadPosition::LongAShortB)
            } else {
                None
            }
        }
        SpreadPosition::ShortALongB => {
            (value < p.exit_level).then_some(SpreadPosition::Flat)
        }
        SpreadPosition::LongAShortB => (value > exit_low).then_some(SpreadPosition::Flat),
    };

    Ok(Signal {
        target,
        size: p.position_size,
        indicator: value,
        regime_safe: true,
    })
}

fn decide_zscore(
    p: &ZScoreParams,
    frame: &IndicatorFrame,
    index: usize,
    position: SpreadPosition,
) -> Result<Signal, PairtraderError> {
    let value = column_at(
        &frame.primary,
        index,
        &format!("zscore({}) of price ratio", p.lookback),
        p.lookback,
    )?;

    let target = if value.abs() < p.exit_z {
        // Inside the neutral band: flatten whatever is on.
        position.is_open().then_some(SpreadPosition::Flat)
    } else if value > p.entry_z {
        Some(SpreadPosition::ShortALongB)
    } else if value < -p.entry_z {
        Some(SpreadPosition::LongAShortB)
    } else {
        None
    };

    Ok(Signal {
        target,
        size: p.position_size,
        indicator: value,
        regime_safe: true,
    })
}

fn decide_vrp_adaptive(
    p: &VrpAdaptiveParams,
    frame: &IndicatorFrame,
    index: usize,
    position: SpreadPosition,
) -> Result<Signal, PairtraderError> {
    // Unready VRP reads as neutral, not unsafe; the kill-switch only fires
    // on an actual negative reading.
    let vrp_z = frame.vrp_z.get(index).copied().flatten().unwrap_or(0.0);
    if vrp_z <= p.panic_threshold {
        return Ok(Signal {
            target: Some(SpreadPosition::Flat),
            size: 0.0,
            indicator: vrp_z,
            regime_safe: false,
        });
    }

    let what = format!("rsi({}) of pair legs", p.rsi_period);
    let rsi_a = column_at(&frame.rsi_a, index, &what, p.rsi_period + 1)?;
    let rsi_b = column_at(&frame.rsi_b, index, &what, p.rsi_period + 1)?;

    // Compressed premium: halve the commitment.
    let size = if vrp_z <= 0.0 {
        p.position_size * 0.5
    } else {
        p.position_size
    };

    let (target, indicator) = match position {
        SpreadPosition::Flat => {
            // Leg A is checked first; ties go to shorting A.
            if rsi_a > p.entry_threshold {
                (Some(SpreadPosition::ShortALongB), rsi_a)
            } else if rsi_b > p.entry_threshold {
                (Some(SpreadPosition::LongAShortB), rsi_b)
            } else {
                (None, rsi_a.max(rsi_b))
            }
        }
        // The shorted leg's RSI drives the exit.
        SpreadPosition::ShortALongB => {
            ((rsi_a < p.exit_threshold).then_some(SpreadPosition::Flat), rsi_a)
        }
        SpreadPosition::LongAShortB => {
            ((rsi_b < p.exit_threshold).then_some(SpreadPosition::Flat), rsi_b)
        }
    };

    Ok(Signal {
        target,
        size,
        indicator,
        regime_safe: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::PairBar;
    use chrono::NaiveDate;

    fn make_series(prices_a: &[f64], prices_b: &[f64]) -> PairSeries {
        let bars = prices_a
            .iter()
            .zip(prices_b)
            .enumerate()
            .map(|(i, (&pa, &pb))| PairBar {
                timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .and_hms_opt(16, 0, 0)
                    .unwrap()
                    + chrono::Duration::days(i as i64),
                price_a: pa,
                price_b: pb,
            })
            .collect();
        PairSeries::new(bars)
    }

    fn rsi_params() -> RsiThresholdParams {
        RsiThresholdParams::new(14, 65.0, 50.0, 0.9, Some(0.05)).unwrap()
    }

    fn vrp_params() -> VrpAdaptiveParams {
        VrpAdaptiveParams::new(14, 70.0, 50.0, 0.9, -1.5, 21, 63).unwrap()
    }

    fn frame_with_primary(values: Vec<Option<f64>>) -> IndicatorFrame {
        IndicatorFrame {
            primary: values,
            ..IndicatorFrame::default()
        }
    }

    fn vrp_frame(rsi_a: f64, rsi_b: f64, vrp_z: Option<f64>) -> IndicatorFrame {
        IndicatorFrame {
            primary: Vec::new(),
            rsi_a: vec![Some(rsi_a)],
            rsi_b: vec![Some(rsi_b)],
            vrp_z: vec![vrp_z],
        }
    }

    #[test]
    fn rsi_params_reject_bad_entry_band() {
        assert!(RsiThresholdParams::new(14, 50.0, 40.0, 0.9, None).is_err());
        assert!(RsiThresholdParams::new(14, 100.0, 50.0, 0.9, None).is_err());
        assert!(RsiThresholdParams::new(14, 65.0, 65.0, 0.9, None).is_err());
        assert!(RsiThresholdParams::new(0, 65.0, 50.0, 0.9, None).is_err());
        assert!(RsiThresholdParams::new(14, 65.0, 50.0, 0.0, None).is_err());
        assert!(RsiThresholdParams::new(14, 65.0, 50.0, 1.5, None).is_err());
        assert!(RsiThresholdParams::new(14, 65.0, 50.0, 0.9, Some(0.0)).is_err());
        assert!(RsiThresholdParams::new(14, 65.0, 50.0, 0.9, Some(0.05)).is_ok());
    }

    #[test]
    fn zscore_params_reject_exit_at_entry() {
        let err = ZScoreParams::new(60, 2.0, 2.0, 0.9).unwrap_err();
        assert!(matches!(
            err,
            PairtraderError::InvalidParameter { ref name, .. } if name == "exit_z"
        ));
    }

    #[test]
    fn zscore_params_bounds() {
        assert!(ZScoreParams::new(1, 2.0, 0.5, 0.9).is_err());
        assert!(ZScoreParams::new(60, 0.0, 0.0, 0.9).is_err());
        assert!(ZScoreParams::new(60, 2.0, -0.1, 0.9).is_err());
        assert!(ZScoreParams::new(60, 2.0, 0.0, 0.9).is_ok());
        assert!(ZScoreParams::new(2, 1.0, 0.5, 1.0).is_ok());
    }

    #[test]
    fn vrp_params_bounds() {
        assert!(VrpAdaptiveParams::new(14, 70.0, 50.0, 0.9, -1.5, 21, 63).is_ok());
        assert!(VrpAdaptiveParams::new(14, 70.0, 50.0, 0.9, 0.0, 21, 63).is_err());
        assert!(VrpAdaptiveParams::new(14, 70.0, 50.0, 0.9, 1.5, 21, 63).is_err());
        assert!(VrpAdaptiveParams::new(14, 70.0, 80.0, 0.9, -1.5, 21, 63).is_err());
        assert!(VrpAdaptiveParams::new(14, 70.0, 50.0, 0.9, -1.5, 1, 63).is_err());
        assert!(VrpAdaptiveParams::new(14, 70.0, 50.0, 0.9, -1.5, 21, 1).is_err());
    }

    #[test]
    fn rsi_threshold_enters_short_above_band() {
        let strategy = PairStrategy::RsiThreshold(rsi_params());
        let frame = frame_with_primary(vec![Some(70.0)]);

        let sig = strategy.decide(&frame, 0, SpreadPosition::Flat).unwrap();
        assert_eq!(sig.target, Some(SpreadPosition::ShortALongB));
        assert_eq!(sig.size, 0.9);
        assert_eq!(sig.indicator, 70.0);
        assert!(sig.regime_safe);
    }

    #[test]
    fn rsi_threshold_enters_long_below_band() {
        let strategy = PairStrategy::RsiThreshold(rsi_params());
        let frame = frame_with_primary(vec![Some(30.0)]);

        let sig = strategy.decide(&frame, 0, SpreadPosition::Flat).unwrap();
        assert_eq!(sig.target, Some(SpreadPosition::LongAShortB));
    }

    #[test]
    fn rsi_threshold_holds_inside_band() {
        let strategy = PairStrategy::RsiThreshold(rsi_params());

        // Band edges are exclusive.
        for value in [35.0, 50.0, 65.0] {
            let frame = frame_with_primary(vec![Some(value)]);
            let sig = strategy.decide(&frame, 0, SpreadPosition::Flat).unwrap();
            assert_eq!(sig.target, None, "rsi {} should hold", value);
        }
    }

    #[test]
    fn rsi_threshold_exit_crosses_midline() {
        let strategy = PairStrategy::RsiThreshold(rsi_params());

        let frame = frame_with_primary(vec![Some(49.0)]);
        let sig = strategy
            .decide(&frame, 0, SpreadPosition::ShortALongB)
            .unwrap();
        assert_eq!(sig.target, Some(SpreadPosition::Flat));

        // Long side exits above 100 - exit_level.
        let frame = frame_with_primary(vec![Some(51.0)]);
        let sig = strategy
            .decide(&frame, 0, SpreadPosition::LongAShortB)
            .unwrap();
        assert_eq!(sig.target, Some(SpreadPosition::Flat));

        // Still stretched: hold.
        let frame = frame_with_primary(vec![Some(60.0)]);
        let sig = strategy
            .decide(&frame, 0, SpreadPosition::ShortALongB)
            .unwrap();
        assert_eq!(sig.target, None);
    }

    #[test]
    fn warming_up_is_insufficient_data() {
        let strategy = PairStrategy::RsiThreshold(rsi_params());
        let frame = frame_with_primary(vec![None, None]);

        let err = strategy.decide(&frame, 1, SpreadPosition::Flat).unwrap_err();
        assert!(matches!(err, PairtraderError::InsufficientData { have: 2, need: 15, .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn zscore_decision_bands() {
        let params = ZScoreParams::new(60, 2.0, 0.5, 0.9).unwrap();
        let strategy = PairStrategy::ZScore(params);

        let cases = [
            (2.5, SpreadPosition::Flat, Some(SpreadPosition::ShortALongB)),
            (-2.5, SpreadPosition::Flat, Some(SpreadPosition::LongAShortB)),
            (1.0, SpreadPosition::Flat, None),
            (0.2, SpreadPosition::Flat, None),
            (0.2, SpreadPosition::ShortALongB, Some(SpreadPosition::Flat)),
            (-0.4, SpreadPosition::LongAShortB, Some(SpreadPosition::Flat)),
            (1.0, SpreadPosition::ShortALongB, None),
            (2.5, SpreadPosition::ShortALongB, Some(SpreadPosition::ShortALongB)),
        ];
        for (z, position, expected) in cases {
            let frame = frame_with_primary(vec![Some(z)]);
            let sig = strategy.decide(&frame, 0, position).unwrap();
            assert_eq!(sig.target, expected, "z {} from {:?}", z, position);
        }
    }

    #[test]
    fn vrp_enters_on_leg_a_first() {
        let strategy = PairStrategy::VrpAdaptive(vrp_params());

        // Both legs overbought: A wins the tie.
        let frame = vrp_frame(75.0, 80.0, Some(1.0));
        let sig = strategy.decide(&frame, 0, SpreadPosition::Flat).unwrap();
        assert_eq!(sig.target, Some(SpreadPosition::ShortALongB));
        assert_eq!(sig.indicator, 75.0);
        assert_eq!(sig.size, 0.9);

        let frame = vrp_frame(40.0, 80.0, Some(1.0));
        let sig = strategy.decide(&frame, 0, SpreadPosition::Flat).unwrap();
        assert_eq!(sig.target, Some(SpreadPosition::LongAShortB));
        assert_eq!(sig.indicator, 80.0);
    }

    #[test]
    fn vrp_halves_size_when_premium_compressed() {
        let strategy = PairStrategy::VrpAdaptive(vrp_params());

        let frame = vrp_frame(75.0, 40.0, Some(-0.5));
        let sig = strategy.decide(&frame, 0, SpreadPosition::Flat).unwrap();
        assert_eq!(sig.target, Some(SpreadPosition::ShortALongB));
        assert!((sig.size - 0.45).abs() < 1e-12);

        // Exactly zero also counts as compressed.
        let frame = vrp_frame(75.0, 40.0, Some(0.0));
        let sig = strategy.decide(&frame, 0, SpreadPosition::Flat).unwrap();
        assert!((sig.size - 0.45).abs() < 1e-12);
    }

    #[test]
    fn vrp_panic_overrides_everything() {
        let strategy = PairStrategy::VrpAdaptive(vrp_params());

        let frame = vrp_frame(75.0, 40.0, Some(-2.0));
        let sig = strategy
            .decide(&frame, 0, SpreadPosition::ShortALongB)
            .unwrap();
        assert_eq!(sig.target, Some(SpreadPosition::Flat));
        assert_eq!(sig.size, 0.0);
        assert!(!sig.regime_safe);
        assert_eq!(sig.indicator, -2.0);

        // Even with legs still unreadable the kill-switch answers.
        let empty_legs = IndicatorFrame {
            vrp_z: vec![Some(-2.0)],
            rsi_a: vec![None],
            rsi_b: vec![None],
            ..IndicatorFrame::default()
        };
        let sig = strategy
            .decide(&empty_legs, 0, SpreadPosition::ShortALongB)
            .unwrap();
        assert!(!sig.regime_safe);
    }

    #[test]
    fn vrp_unready_regime_is_neutral() {
        let strategy = PairStrategy::VrpAdaptive(vrp_params());

        let frame = vrp_frame(75.0, 40.0, None);
        let sig = strategy.decide(&frame, 0, SpreadPosition::Flat).unwrap();
        assert!(sig.regime_safe);
        assert_eq!(sig.target, Some(SpreadPosition::ShortALongB));
        // Neutral counts as compressed for sizing.
        assert!((sig.size - 0.45).abs() < 1e-12);
    }

    #[test]
    fn vrp_exit_reads_shorted_leg() {
        let strategy = PairStrategy::VrpAdaptive(vrp_params());

        // Short A open: exit when A's RSI drops under the exit threshold.
        let frame = vrp_frame(45.0, 80.0, Some(1.0));
        let sig = strategy
            .decide(&frame, 0, SpreadPosition::ShortALongB)
            .unwrap();
        assert_eq!(sig.target, Some(SpreadPosition::Flat));
        assert_eq!(sig.indicator, 45.0);

        // Short B open (long A): B's RSI drives it.
        let frame = vrp_frame(45.0, 55.0, Some(1.0));
        let sig = strategy
            .decide(&frame, 0, SpreadPosition::LongAShortB)
            .unwrap();
        assert_eq!(sig.target, None);
        assert_eq!(sig.indicator, 55.0);
    }

    #[test]
    fn vrp_requires_implied_series() {
        let strategy = PairStrategy::VrpAdaptive(vrp_params());
        let series = make_series(&[100.0, 101.0], &[50.0, 50.5]);

        let err = strategy.compute_indicators(&series).unwrap_err();
        assert!(matches!(err, PairtraderError::NoData { .. }));
    }

    #[test]
    fn compute_indicators_fills_expected_columns() {
        let n = 40;
        let prices_a: Vec<f64> = (0..n).map(|i| 100.0 + (i % 7) as f64).collect();
        let prices_b: Vec<f64> = (0..n).map(|i| 50.0 + (i % 5) as f64).collect();
        let series = make_series(&prices_a, &prices_b);

        let strategy = PairStrategy::RsiThreshold(rsi_params());
        let frame = strategy.compute_indicators(&series).unwrap();
        assert_eq!(frame.primary.len(), n);
        assert!(frame.rsi_a.is_empty());
        assert!(frame.primary[14].is_some());

        let strategy = PairStrategy::ZScore(ZScoreParams::new(20, 2.0, 0.5, 0.9).unwrap());
        let frame = strategy.compute_indicators(&series).unwrap();
        assert_eq!(frame.primary.len(), n);
        assert!(frame.primary[19].is_some());

        let mut series = make_series(&prices_a, &prices_b);
        series.implied_vol = Some(vec![18.0; n]);
        let strategy = PairStrategy::VrpAdaptive(
            VrpAdaptiveParams::new(14, 70.0, 50.0, 0.9, -1.5, 5, 10).unwrap(),
        );
        let frame = strategy.compute_indicators(&series).unwrap();
        assert!(frame.primary.is_empty());
        assert_eq!(frame.rsi_a.len(), n);
        assert_eq!(frame.rsi_b.len(), n);
        assert_eq!(frame.vrp_z.len(), n);
        assert!(frame.vrp_z[14].is_some());
    }

    #[test]
    fn min_history_covers_slowest_column() {
        let strategy = PairStrategy::RsiThreshold(rsi_params());
        assert_eq!(strategy.min_history(), 15);

        let strategy = PairStrategy::ZScore(ZScoreParams::new(60, 2.0, 0.5, 0.9).unwrap());
        assert_eq!(strategy.min_history(), 60);

        let strategy = PairStrategy::VrpAdaptive(vrp_params());
        assert_eq!(strategy.min_history(), 84);
    }

    #[test]
    fn strategy_names() {
        assert_eq!(PairStrategy::RsiThreshold(rsi_params()).name(), "rsi_threshold");
        assert_eq!(PairStrategy::VrpAdaptive(vrp_params()).name(), "vrp_adaptive");
    }
}
