use crate::allocation::Position;
use crate::models::*;
use crate::shared_math;
use chrono::NaiveDate;
use portfolio_core::AnalyticsError;
use std::collections::BTreeMap;

/// Full-precision figures for one usable asset.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetBreakdown {
    pub holding: Holding,
    pub current_price: f64,
    pub value: f64,
    pub initial_value: f64,
    pub weight_pct: f64,
    pub return_pct: f64,
}

/// Full-precision portfolio figures. Round with [`MetricsBreakdown::rounded`]
/// only when handing results out.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsBreakdown {
    pub total_value: f64,
    pub initial_value: f64,
    pub total_return_pct: f64,
    pub volatility_pct: f64,
    pub sharpe_ratio: f64,
    pub daily_returns: Vec<(NaiveDate, f64)>,
    pub assets: Vec<AssetBreakdown>,
}

impl MetricsBreakdown {
    pub fn rounded(&self) -> PortfolioMetrics {
        let asset_returns = self
            .assets
            .iter()
            .map(|a| {
                (
                    a.holding.symbol.clone(),
                    shared_math::round_dp(a.return_pct, 2),
                )
            })
            .collect();

        let allocations = self
            .assets
            .iter()
            .map(|a| {
                (
                    a.holding.symbol.clone(),
                    AssetAllocation {
                        value: shared_math::round_dp(a.value, 2),
                        weight_pct: shared_math::round_dp(a.weight_pct, 2),
                        shares: shared_math::round_dp(a.holding.shares, 4),
                        current_price: shared_math::round_dp(a.current_price, 2),
                        initial_price: shared_math::round_dp(a.holding.initial_price, 2),
                    },
                )
            })
            .collect();

        PortfolioMetrics {
            total_value: shared_math::round_dp(self.total_value, 2),
            initial_value: shared_math::round_dp(self.initial_value, 2),
            total_return_pct: shared_math::round_dp(self.total_return_pct, 2),
            volatility_pct: shared_math::round_dp(self.volatility_pct, 2),
            sharpe_ratio: shared_math::round_dp(self.sharpe_ratio, 2),
            asset_returns,
            allocations,
        }
    }
}

pub struct MetricsAggregator;

impl MetricsAggregator {
    /// Value, return, volatility and Sharpe figures for the usable positions.
    pub fn aggregate(
        positions: &[Position<'_>],
        risk_free_rate_pct: f64,
    ) -> Result<MetricsBreakdown, AnalyticsError> {
        if positions.is_empty() {
            return Err(AnalyticsError::NoUsableAssets { requested: 0 });
        }

        let mut assets: Vec<AssetBreakdown> = positions
            .iter()
            .map(|p| {
                let holding = p.holding.clone();
                // Usable series always carry at least the initial close.
                let current_price = p.series.latest_close().unwrap_or(holding.initial_price);
                AssetBreakdown {
                    current_price,
                    value: holding.shares * current_price,
                    initial_value: holding.shares * holding.initial_price,
                    weight_pct: 0.0,
                    return_pct: shared_math::percent_return(holding.initial_price, current_price)
                        .unwrap_or(0.0),
                    holding,
                }
            })
            .collect();

        let total_value: f64 = assets.iter().map(|a| a.value).sum();
        let initial_value: f64 = assets.iter().map(|a| a.initial_value).sum();

        if initial_value == 0.0 {
            return Err(AnalyticsError::DegenerateInitialValue {
                assets: assets.len(),
            });
        }
        let total_return_pct = (total_value - initial_value) / initial_value * 100.0;

        if total_value > 0.0 {
            for a in assets.iter_mut() {
                a.weight_pct = a.value / total_value * 100.0;
            }
        }

        let daily_returns = Self::portfolio_daily_returns(positions);
        let returns: Vec<f64> = daily_returns.iter().map(|(_, r)| *r).collect();
        let volatility_pct = shared_math::annualized_volatility_pct(&returns);
        let sharpe_ratio =
            shared_math::sharpe_ratio(total_return_pct, risk_free_rate_pct, volatility_pct);

        Ok(MetricsBreakdown {
            total_value,
            initial_value,
            total_return_pct,
            volatility_pct,
            sharpe_ratio,
            daily_returns,
            assets,
        })
    }

    /// Day-over-day fractional close changes of one asset's valid window,
    /// keyed by the later date. The first day has no change and is dropped.
    pub fn asset_daily_returns(position: &Position<'_>) -> Vec<(NaiveDate, f64)> {
        let closes: Vec<(NaiveDate, f64)> = position.series.valid_closes().collect();
        closes
            .windows(2)
            .filter_map(|w| shared_math::pct_change(w[0].1, w[1].1).map(|r| (w[1].0, r)))
            .collect()
    }

    /// Cross-sectional mean of the per-asset daily returns for each date.
    ///
    /// Only assets with a return on a given date contribute to it. This is the
    /// equal-weight approximation of the portfolio's daily return; it does not
    /// track share drift between assets.
    pub fn portfolio_daily_returns(positions: &[Position<'_>]) -> Vec<(NaiveDate, f64)> {
        let mut by_date: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
        for position in positions {
            for (date, r) in Self::asset_daily_returns(position) {
                let entry = by_date.entry(date).or_insert((0.0, 0));
                entry.0 += r;
                entry.1 += 1;
            }
        }
        by_date
            .into_iter()
            .map(|(date, (sum, count))| (date, sum / count as f64))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::Allocation;
    use crate::normalizer::NormalizedSeries;
    use portfolio_core::PricePoint;

    fn day(i: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i)
    }

    fn series(closes: &[(u64, f64)]) -> NormalizedSeries {
        let points: Vec<PricePoint> = closes
            .iter()
            .map(|(i, c)| PricePoint {
                date: day(*i),
                open: *c,
                high: *c,
                low: *c,
                close: Some(*c),
                volume: 1000.0,
            })
            .collect();
        NormalizedSeries::from_points(&points)
    }

    fn aggregate(
        normalized: &[(String, NormalizedSeries)],
        capital: f64,
    ) -> Result<MetricsBreakdown, AnalyticsError> {
        let alloc = Allocation::equal_weight(capital, normalized.len())?;
        let positions = alloc.positions(normalized);
        MetricsAggregator::aggregate(&positions, 4.0)
    }

    fn two_asset_book() -> Vec<(String, NormalizedSeries)> {
        vec![
            ("A".to_string(), series(&[(0, 10.0), (1, 10.0), (2, 12.0)])),
            ("B".to_string(), series(&[(0, 20.0), (1, 20.0), (2, 25.0)])),
        ]
    }

    #[test]
    fn test_two_asset_scenario() {
        let m = aggregate(&two_asset_book(), 100.0).unwrap();
        assert!((m.total_value - 122.5).abs() < 1e-9);
        assert!((m.initial_value - 100.0).abs() < 1e-9);
        assert!((m.total_return_pct - 22.5).abs() < 1e-9);
        assert!((m.assets[0].return_pct - 20.0).abs() < 1e-9);
        assert!((m.assets[1].return_pct - 25.0).abs() < 1e-9);
        assert!((m.assets[0].value - 60.0).abs() < 1e-9);
        assert!((m.assets[1].value - 62.5).abs() < 1e-9);

        // Portfolio daily returns: day 1 -> 0.0, day 2 -> mean(0.20, 0.25)
        assert_eq!(m.daily_returns.len(), 2);
        assert!((m.daily_returns[1].1 - 0.225).abs() < 1e-12);
        let expected_vol = 0.1125 * 2.0_f64.sqrt() * 252.0_f64.sqrt() * 100.0;
        assert!((m.volatility_pct - expected_vol).abs() < 1e-9);
        assert!((m.sharpe_ratio - (22.5 - 4.0) / expected_vol).abs() < 1e-12);
    }

    #[test]
    fn test_values_sum_to_total_and_weights_to_hundred() {
        let normalized = vec![
            ("A".to_string(), series(&[(0, 13.7), (1, 14.2), (3, 15.9)])),
            ("B".to_string(), series(&[(0, 251.3), (2, 240.8), (3, 262.0)])),
            ("C".to_string(), series(&[(1, 3.33), (2, 3.1), (3, 2.95)])),
        ];
        let m = aggregate(&normalized, 10_000.0).unwrap();

        let value_sum: f64 = m.assets.iter().map(|a| a.value).sum();
        assert!((value_sum - m.total_value).abs() < 1e-6);

        let weight_sum: f64 = m.assets.iter().map(|a| a.weight_pct).sum();
        assert!((weight_sum - 100.0).abs() < 0.1);

        let rounded = m.rounded();
        let rounded_weights: f64 = rounded.allocations.values().map(|a| a.weight_pct).sum();
        assert!((rounded_weights - 100.0).abs() < 0.1);
    }

    #[test]
    fn test_missing_dates_only_drop_that_assets_contribution() {
        let normalized = vec![
            ("A".to_string(), series(&[(0, 10.0), (1, 11.0), (2, 12.1)])),
            // B has no quote on day 1, so its next return lands on day 2.
            ("B".to_string(), series(&[(0, 10.0), (2, 10.0)])),
        ];
        let alloc = Allocation::equal_weight(100.0, 2).unwrap();
        let positions = alloc.positions(&normalized);
        let daily = MetricsAggregator::portfolio_daily_returns(&positions);

        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].0, day(1));
        assert!((daily[0].1 - 0.1).abs() < 1e-12);
        assert_eq!(daily[1].0, day(2));
        assert!((daily[1].1 - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_single_observation_has_zero_volatility_and_sharpe() {
        let normalized = vec![
            ("A".to_string(), series(&[(0, 10.0)])),
            ("B".to_string(), series(&[(0, 20.0)])),
        ];
        let m = aggregate(&normalized, 100.0).unwrap();
        assert!(m.daily_returns.is_empty());
        assert_eq!(m.volatility_pct, 0.0);
        assert_eq!(m.sharpe_ratio, 0.0);
    }

    #[test]
    fn test_constant_returns_give_zero_sharpe_regardless_of_sign() {
        // Same daily change every day: dispersion is zero.
        let falling = vec![(
            "A".to_string(),
            series(&[(0, 100.0), (1, 50.0), (2, 25.0), (3, 12.5)]),
        )];
        let m = aggregate(&falling, 100.0).unwrap();
        assert!(m.total_return_pct < 0.0);
        assert_eq!(m.volatility_pct, 0.0);
        assert_eq!(m.sharpe_ratio, 0.0);

        let rising = vec![("A".to_string(), series(&[(0, 10.0), (1, 20.0), (2, 40.0)]))];
        let m = aggregate(&rising, 100.0).unwrap();
        assert!(m.total_return_pct > 0.0);
        assert_eq!(m.sharpe_ratio, 0.0);
    }

    #[test]
    fn test_zero_latest_close_leaves_weights_at_zero() {
        let normalized = vec![("A".to_string(), series(&[(0, 10.0), (1, 0.0)]))];
        let m = aggregate(&normalized, 100.0).unwrap();
        assert_eq!(m.total_value, 0.0);
        assert!((m.total_return_pct + 100.0).abs() < 1e-9);
        assert_eq!(m.assets[0].weight_pct, 0.0);
    }

    #[test]
    fn test_rounding_applies_only_at_output() {
        let normalized = vec![
            ("A".to_string(), series(&[(0, 3.0), (1, 3.3)])),
            ("B".to_string(), series(&[(0, 7.0), (1, 7.7)])),
            ("C".to_string(), series(&[(0, 9.0), (1, 9.9)])),
        ];
        let m = aggregate(&normalized, 100.0).unwrap();
        let rounded = m.rounded();

        let a = &rounded.allocations["A"];
        assert_eq!(a.shares, 11.1111);
        assert_eq!(a.initial_price, 3.0);
        assert_eq!(rounded.total_value, 110.0);
        assert_eq!(rounded.asset_returns["B"], 10.0);
        assert_eq!(rounded.allocations.len(), 3);
    }

    #[test]
    fn test_empty_positions_is_an_error() {
        assert!(matches!(
            MetricsAggregator::aggregate(&[], 4.0),
            Err(AnalyticsError::NoUsableAssets { .. })
        ));
    }
}
