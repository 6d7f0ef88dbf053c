//! Concurrent fan-out over a [`PriceHistorySource`] for a list of symbols.
//!
//! A failed fetch never aborts the batch: the symbol gets an empty series
//! (or fallback reference data) and the analytics drop it as unusable.

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use portfolio_core::{PriceHistorySource, PriceSeries, TickerInfo};
use std::collections::HashMap;

/// Daily history for every symbol, fetched concurrently.
pub async fn fetch_histories<S: PriceHistorySource + ?Sized>(
    source: &S,
    symbols: &[String],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> HashMap<String, PriceSeries> {
    let futures: Vec<_> = symbols
        .iter()
        .map(|symbol| async move {
            match source.daily_history(symbol, from, to).await {
                Ok(series) => {
                    if series.is_empty() {
                        tracing::warn!("No price history returned for {}", symbol);
                    }
                    (symbol.clone(), series)
                }
                Err(e) => {
                    tracing::warn!("Failed to fetch price history for {}: {}", symbol, e);
                    (symbol.clone(), Vec::new())
                }
            }
        })
        .collect();

    let histories: HashMap<String, PriceSeries> = join_all(futures).await.into_iter().collect();
    tracing::info!(
        "Fetched price history for {}/{} symbols",
        histories.values().filter(|s| !s.is_empty()).count(),
        symbols.len()
    );
    histories
}

/// Reference data for every symbol, falling back to placeholders on failure.
pub async fn fetch_ticker_infos<S: PriceHistorySource + ?Sized>(
    source: &S,
    symbols: &[String],
) -> HashMap<String, TickerInfo> {
    let futures: Vec<_> = symbols
        .iter()
        .map(|symbol| async move {
            let info = match source.ticker_info(symbol).await {
                Ok(info) => info,
                Err(e) => {
                    tracing::warn!("Failed to fetch ticker info for {}: {}", symbol, e);
                    TickerInfo::fallback(symbol)
                }
            };
            (symbol.clone(), info)
        })
        .collect();

    join_all(futures).await.into_iter().collect()
}
