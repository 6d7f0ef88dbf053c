//! Equal-dollar allocation and share derivation.
//!
//! Capital is split by the number of *requested* assets. An asset that turns
//! out to be unusable keeps its slice of capital undeployed; the slice is never
//! handed to the remaining assets. Deployed capital therefore shrinks with
//! every excluded asset.

use crate::models::Holding;
use crate::normalizer::NormalizedSeries;
use portfolio_core::AnalyticsError;

/// A usable asset paired with its normalized closes.
#[derive(Debug, Clone)]
pub struct Position<'a> {
    pub holding: Holding,
    pub series: &'a NormalizedSeries,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Allocation {
    pub capital: f64,
    pub requested_assets: usize,
    pub per_asset: f64,
}

impl Allocation {
    pub fn equal_weight(capital: f64, requested_assets: usize) -> Result<Self, AnalyticsError> {
        if !capital.is_finite() || capital <= 0.0 {
            return Err(AnalyticsError::InvalidInput(format!(
                "total capital must be a positive amount, got {}",
                capital
            )));
        }
        if requested_assets == 0 {
            return Err(AnalyticsError::InvalidInput(
                "asset list is empty".to_string(),
            ));
        }

        Ok(Self {
            capital,
            requested_assets,
            per_asset: capital / requested_assets as f64,
        })
    }

    /// Shares bought with one allocation slice, or `None` when the series
    /// has no positive initial price.
    pub fn holding_for(&self, symbol: &str, series: &NormalizedSeries) -> Option<Holding> {
        let initial_price = series.initial_price().filter(|p| *p > 0.0)?;
        Some(Holding {
            symbol: symbol.to_string(),
            initial_price,
            shares: self.per_asset / initial_price,
        })
    }

    /// Positions for every usable asset, in request order.
    pub fn positions<'a>(&self, normalized: &'a [(String, NormalizedSeries)]) -> Vec<Position<'a>> {
        normalized
            .iter()
            .filter_map(|(symbol, series)| {
                self.holding_for(symbol, series)
                    .map(|holding| Position { holding, series })
            })
            .collect()
    }

    /// Capital actually put to work across `positions`.
    pub fn deployed(&self, positions: &[Position<'_>]) -> f64 {
        self.per_asset * positions.len() as f64
    }
}
