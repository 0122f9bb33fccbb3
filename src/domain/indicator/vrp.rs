//! Volatility risk premium pipeline.
//!
//! VRP = implied volatility minus realized volatility, then scored against
//! its own rolling window. Deeply negative scores mark a stressed regime
//! where realized volatility has blown out past what the market priced in.

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Annualized close-to-close realized volatility: rolling sample standard
/// deviation (n-1 denominator) of simple per-bar returns over `window`,
/// scaled by sqrt(252) and by 100 to the percentage-point units of implied
/// volatility indices.
///
/// Warmup: the first `window` bars are not ready (one bar is consumed by the
/// return differencing).
pub fn realized_volatility(prices: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; prices.len()];
    if window < 2 || prices.len() <= window {
        return out;
    }

    let mut returns = Vec::with_capacity(prices.len() - 1);
    for i in 1..prices.len() {
        returns.push(if prices[i - 1] != 0.0 {
            prices[i] / prices[i - 1] - 1.0
        } else {
            f64::NAN
        });
    }

    for i in window..prices.len() {
        let slice = &returns[i - window..i];
        let n = window as f64;
        let mean = slice.iter().sum::<f64>() / n;
        let variance = slice.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
        let value = variance.sqrt() * TRADING_DAYS_PER_YEAR.sqrt() * 100.0;
        out[i] = value.is_finite().then_some(value);
    }

    out
}

/// Z-score of the volatility risk premium: `implied - realized` per bar,
/// scored against its trailing `zscore_window` with population standard
/// deviation. Not ready wherever either input pipeline is.
pub fn vrp_zscore(
    implied: &[f64],
    underlying: &[f64],
    vol_window: usize,
    zscore_window: usize,
) -> Vec<Option<f64>> {
    let len = implied.len().min(underlying.len());
    let realized = realized_volatility(&underlying[..len], vol_window);

    let vrp: Vec<Option<f64>> = (0..len)
        .map(|i| realized[i].map(|rv| implied[i] - rv))
        .collect();

    rolling_zscore(&vrp, zscore_window)
}

fn rolling_zscore(series: &[Option<f64>], lookback: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; series.len()];
    if lookback == 0 {
        return out;
    }

    for i in (lookback - 1)..series.len() {
        let window: Vec<f64> = series[i + 1 - lookback..=i].iter().flatten().copied().collect();
        if window.len() < lookback {
            continue;
        }
        out[i] = Some(super::zscore::window_zscore(&window));
    }

    out
}
