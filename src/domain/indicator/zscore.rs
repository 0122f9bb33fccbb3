//! Rolling z-score of a series against its own trailing window.
//!
//! z = (value - rolling_mean) / rolling_population_std. A zero-variance
//! window yields a neutral 0.0 rather than a division blowup, so flat
//! markets produce no spurious signals.
//!
//! Warmup: the first `lookback - 1` values are not ready.

pub fn zscore(series: &[f64], lookback: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; series.len()];
    if lookback == 0 {
        return out;
    }

    for i in (lookback - 1)..series.len() {
        out[i] = Some(window_zscore(&series[i + 1 - lookback..=i]));
    }

    out
}

/// Scores the window's last element against the window's own mean and
/// population standard deviation. The window must be non-empty.
pub(super) fn window_zscore(window: &[f64]) -> f64 {
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let variance = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();

    let current = window[window.len() - 1];
    if std > 0.0 { (current - mean) / std } else { 0.0 }
}
