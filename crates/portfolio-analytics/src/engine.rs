use crate::allocation::{Allocation, Position};
use crate::metrics::MetricsAggregator;
use crate::models::{PerformancePoint, PortfolioMetrics};
use crate::normalizer::{normalize, NormalizedSeries};
use crate::shared_math;
use crate::timeline::TimelineReconstructor;
use portfolio_core::{AnalyticsError, PriceSeries};
use std::collections::{HashMap, HashSet};

/// Risk-free rate, in percent, used when the caller has no better figure.
pub const DEFAULT_RISK_FREE_RATE_PCT: f64 = 4.0;

/// Point-in-time metrics for an equal-weight portfolio of `assets`.
///
/// `total_capital` is split evenly over every requested asset; assets without
/// a positive first close are excluded and their share of capital is left
/// undeployed. Fails when no asset is usable.
pub fn compute_metrics(
    series_by_asset: &HashMap<String, PriceSeries>,
    assets: &[String],
    total_capital: f64,
    risk_free_rate_pct: f64,
) -> Result<PortfolioMetrics, AnalyticsError> {
    if !risk_free_rate_pct.is_finite() {
        return Err(AnalyticsError::InvalidInput(format!(
            "risk-free rate must be finite, got {}",
            risk_free_rate_pct
        )));
    }

    let normalized = prepare(series_by_asset, assets)?;
    let positions = open_positions(&normalized, total_capital)?;
    let breakdown = MetricsAggregator::aggregate(&positions, risk_free_rate_pct)?;

    tracing::debug!(
        "Portfolio metrics over {}/{} assets: value {:.2}, return {:.2}%, volatility {:.2}%",
        breakdown.assets.len(),
        assets.len(),
        breakdown.total_value,
        breakdown.total_return_pct,
        breakdown.volatility_pct
    );

    Ok(breakdown.rounded())
}

/// Daily portfolio value across the union of the usable assets' dates,
/// using the same allocation as [`compute_metrics`].
pub fn compute_performance_timeline(
    series_by_asset: &HashMap<String, PriceSeries>,
    assets: &[String],
    total_capital: f64,
) -> Result<Vec<PerformancePoint>, AnalyticsError> {
    let normalized = prepare(series_by_asset, assets)?;
    let positions = open_positions(&normalized, total_capital)?;

    let curve: Vec<PerformancePoint> = TimelineReconstructor::reconstruct(&positions)
        .into_iter()
        .map(|p| PerformancePoint {
            date: p.date,
            value: shared_math::round_dp(p.value, 2),
        })
        .collect();

    tracing::debug!(
        "Performance timeline: {} points over {}/{} assets",
        curve.len(),
        positions.len(),
        assets.len()
    );

    Ok(curve)
}

fn prepare(
    series_by_asset: &HashMap<String, PriceSeries>,
    assets: &[String],
) -> Result<Vec<(String, NormalizedSeries)>, AnalyticsError> {
    let mut seen = HashSet::new();
    if let Some(dup) = assets.iter().find(|a| !seen.insert(a.as_str())) {
        return Err(AnalyticsError::InvalidInput(format!(
            "asset {} is listed more than once",
            dup
        )));
    }
    Ok(normalize(series_by_asset, assets))
}

fn open_positions(
    normalized: &[(String, NormalizedSeries)],
    total_capital: f64,
) -> Result<Vec<Position<'_>>, AnalyticsError> {
    let allocation = Allocation::equal_weight(total_capital, normalized.len())?;
    let positions = allocation.positions(normalized);
    if positions.is_empty() {
        return Err(AnalyticsError::NoUsableAssets {
            requested: normalized.len(),
        });
    }

    if positions.len() < normalized.len() {
        tracing::debug!(
            "{} of {} assets unusable, deploying {:.2} of {:.2}",
            normalized.len() - positions.len(),
            normalized.len(),
            allocation.deployed(&positions),
            allocation.capital
        );
    }

    Ok(positions)
}
