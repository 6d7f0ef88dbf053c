use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{MarketDataError, PriceSeries, TickerInfo};

/// A provider of daily price history and ticker reference data.
#[async_trait]
pub trait PriceHistorySource: Send + Sync {
    async fn daily_history(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<PriceSeries, MarketDataError>;

    async fn ticker_info(&self, symbol: &str) -> Result<TickerInfo, MarketDataError>;
}
