use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily OHLCV observation for a single asset.
///
/// Only `close` feeds the analytics; the remaining fields are carried through
/// untouched for display. A provider that has no usable close for the day
/// leaves it as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    #[serde(default)]
    pub close: Option<f64>,
    pub volume: f64,
}

impl PricePoint {
    /// The close price, or `None` when it is missing or not a finite number.
    pub fn close_value(&self) -> Option<f64> {
        self.close.filter(|c| c.is_finite())
    }
}

/// Daily history for one asset, in whatever order the provider returned it.
pub type PriceSeries = Vec<PricePoint>;

/// Descriptive reference data for a ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerInfo {
    pub name: String,
    pub sector: String,
    pub industry: String,
}

impl TickerInfo {
    /// Placeholder used when the provider has no reference data for `symbol`.
    pub fn fallback(symbol: &str) -> Self {
        Self {
            name: symbol.to_string(),
            sector: "N/A".to_string(),
            industry: "N/A".to_string(),
        }
    }
}
