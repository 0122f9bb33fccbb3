//! RSI (Relative Strength Index) over a price series.
//!
//! Gains and losses are smoothed with a simple trailing mean of length
//! `period` (no Wilder recursion): RSI = 100 - 100 / (1 + avg_gain/avg_loss),
//! evaluated in plain f64 arithmetic. A window of pure gains divides by zero
//! to +inf and lands on exactly 100; an unchanged window divides 0/0 to NaN
//! and reports not-ready.
//!
//! Warmup: the first `period` bars are not ready (a full window of `period`
//! price changes is required).

pub fn rsi(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; prices.len()];
    if period == 0 || prices.len() <= period {
        return out;
    }

    let mut gains = Vec::with_capacity(prices.len() - 1);
    let mut losses = Vec::with_capacity(prices.len() - 1);
    for i in 1..prices.len() {
        let change = prices[i] - prices[i - 1];
        gains.push(if change > 0.0 { change } else { 0.0 });
        losses.push(if change < 0.0 { -change } else { 0.0 });
    }

    for i in period..prices.len() {
        // The change at bar k sits at index k-1, so bar i's trailing window
        // of `period` changes is gains[i-period..i].
        let start = i - period;
        let avg_gain = gains[start..i].iter().sum::<f64>() / period as f64;
        let avg_loss = losses[start..i].iter().sum::<f64>() / period as f64;

        let value = 100.0 - 100.0 / (1.0 + avg_gain / avg_loss);
        out[i] = if value.is_nan() { None } else { Some(value) };
    }

    out
}
