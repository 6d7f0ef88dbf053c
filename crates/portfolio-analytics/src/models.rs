use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Shares bought for one asset at its first valid close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub initial_price: f64,
    pub shares: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetAllocation {
    pub value: f64,
    pub weight_pct: f64,
    pub shares: f64,
    pub current_price: f64,
    pub initial_price: f64,
}

/// Point-in-time analytics for the equal-weight portfolio, rounded for display
/// (2 dp for money, percentages and the ratio, 4 dp for share counts).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioMetrics {
    pub total_value: f64,
    pub initial_value: f64,
    pub total_return_pct: f64,
    pub volatility_pct: f64,
    /// Exactly 0.0 whenever `volatility_pct` is zero, whatever the return.
    pub sharpe_ratio: f64,
    pub asset_returns: BTreeMap<String, f64>,
    pub allocations: BTreeMap<String, AssetAllocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformancePoint {
    pub date: NaiveDate,
    pub value: f64,
}
