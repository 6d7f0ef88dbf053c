use chrono::NaiveDate;
use portfolio_core::{PriceSeries, PricePoint};
use std::collections::{BTreeMap, HashMap};

/// One asset's close prices keyed by calendar date.
///
/// Built from raw provider points: later points for the same date replace
/// earlier ones, and a point without a usable close clears that date.
/// Everything before the first strictly positive close is outside the
/// asset's valid window and is ignored by the valid-window accessors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedSeries {
    closes: BTreeMap<NaiveDate, f64>,
    first_valid: Option<NaiveDate>,
}

impl NormalizedSeries {
    pub fn from_points(points: &[PricePoint]) -> Self {
        let mut closes = BTreeMap::new();
        for point in points {
            match point.close_value() {
                Some(close) => {
                    closes.insert(point.date, close);
                }
                None => {
                    closes.remove(&point.date);
                }
            }
        }

        let first_valid = closes
            .iter()
            .find(|(_, close)| **close > 0.0)
            .map(|(date, _)| *date);

        Self {
            closes,
            first_valid,
        }
    }

    /// Date of the first strictly positive close.
    pub fn first_valid(&self) -> Option<NaiveDate> {
        self.first_valid
    }

    pub fn is_usable(&self) -> bool {
        self.first_valid.is_some()
    }

    /// Close at the first valid date.
    pub fn initial_price(&self) -> Option<f64> {
        self.first_valid
            .and_then(|date| self.closes.get(&date).copied())
    }

    /// Close on the latest quoted date.
    pub fn latest_close(&self) -> Option<f64> {
        self.valid_closes().last().map(|(_, close)| close)
    }

    /// Close on `date` if it lies in the valid window and was quoted.
    pub fn close_on(&self, date: NaiveDate) -> Option<f64> {
        match self.first_valid {
            Some(start) if date >= start => self.closes.get(&date).copied(),
            _ => None,
        }
    }

    /// Dated closes from the first valid date onward, ascending.
    pub fn valid_closes(&self) -> impl DoubleEndedIterator<Item = (NaiveDate, f64)> + '_ {
        self.first_valid.into_iter().flat_map(move |start| {
            self.closes
                .range(start..)
                .map(|(date, close)| (*date, *close))
        })
    }

    /// Number of quoted dates, including any before the valid window.
    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }
}

/// Normalize the series of every requested asset, in request order.
///
/// Assets absent from `series_by_asset` get an empty (unusable) series;
/// entries for assets that were not requested are ignored.
pub fn normalize(
    series_by_asset: &HashMap<String, PriceSeries>,
    assets: &[String],
) -> Vec<(String, NormalizedSeries)> {
    assets
        .iter()
        .map(|symbol| {
            let normalized = series_by_asset
                .get(symbol)
                .map(|points| NormalizedSeries::from_points(points))
                .unwrap_or_default();
            if !normalized.is_usable() {
                tracing::debug!(
                    "{} has no positive close in {} quoted days, excluding it",
                    symbol,
                    normalized.len()
                );
            }
            (symbol.clone(), normalized)
        })
        .collect()
}
