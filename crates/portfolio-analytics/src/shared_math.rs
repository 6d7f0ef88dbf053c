//! Pure numeric helpers for the portfolio analytics.
//! Stateless functions, no I/O.

use rust_decimal::prelude::*;
use rust_decimal::RoundingStrategy;
use statrs::statistics::Statistics;

/// Trading days used to annualize daily dispersion.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Standard deviations below this are treated as zero.
const MIN_STD_DEV: f64 = 1e-12;

/// Fractional change from `prev` to `next`; `None` when `prev` is zero.
pub fn pct_change(prev: f64, next: f64) -> Option<f64> {
    if prev != 0.0 {
        Some((next - prev) / prev)
    } else {
        None
    }
}

/// Simple percent return between two values; `None` when `start` is zero.
pub fn percent_return(start: f64, end: f64) -> Option<f64> {
    pct_change(start, end).map(|r| r * 100.0)
}

/// Sample standard deviation, or 0.0 with fewer than two observations.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let sd = values.std_dev();
    if sd.is_finite() && sd > MIN_STD_DEV {
        sd
    } else {
        0.0
    }
}

/// Annualized volatility in percent from fractional daily returns.
pub fn annualized_volatility_pct(daily_returns: &[f64]) -> f64 {
    sample_std_dev(daily_returns) * TRADING_DAYS_PER_YEAR.sqrt() * 100.0
}

/// Excess return over volatility, both in percent.
///
/// Exactly 0.0 when volatility is zero.
pub fn sharpe_ratio(return_pct: f64, risk_free_rate_pct: f64, volatility_pct: f64) -> f64 {
    if volatility_pct > 0.0 {
        (return_pct - risk_free_rate_pct) / volatility_pct
    } else {
        0.0
    }
}

/// Round half away from zero to `dp` decimal places in decimal arithmetic.
/// Values that cannot be represented as a `Decimal` are returned unchanged.
pub fn round_dp(value: f64, dp: u32) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}
