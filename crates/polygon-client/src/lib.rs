use async_trait::async_trait;
use chrono::{DateTime, Utc};
use portfolio_core::{MarketDataError, PricePoint, PriceHistorySource, PriceSeries, TickerInfo};
use reqwest::Client;
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub mod history;

pub use history::{fetch_histories, fetch_ticker_infos};

const BASE_URL: &str = "https://api.polygon.io";
const MAX_RETRIES: u32 = 3;

/// Sliding-window rate limiter: at most `max_requests` per `window` duration.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests: max_requests.max(1),
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            // Remove timestamps outside the window
            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }

            // Wait until the oldest request falls out of the window
            let sleep_dur = match ts.front() {
                Some(&oldest) => (oldest + self.window).saturating_duration_since(now),
                None => Duration::ZERO,
            } + Duration::from_millis(50);
            drop(ts);
            tracing::debug!(
                "Rate limiter: waiting {:.1}s for Polygon API slot",
                sleep_dur.as_secs_f64()
            );
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

/// Polygon.io REST client for daily aggregates and ticker reference data.
#[derive(Clone)]
pub struct PolygonClient {
    api_key: String,
    client: Client,
    rate_limiter: RateLimiter,
}

impl PolygonClient {
    /// `rate_limit` is requests per minute. Free tier keys should use 5.
    pub fn new(api_key: String, rate_limit: usize) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(90))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key,
            client,
            rate_limiter: RateLimiter::new(rate_limit, Duration::from_secs(60)),
        }
    }

    /// Send a request with rate limiting and automatic 429 retry.
    async fn send_request(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, MarketDataError> {
        let request = builder
            .build()
            .map_err(|e| MarketDataError::ApiError(e.to_string()))?;

        for attempt in 0..MAX_RETRIES {
            self.rate_limiter.acquire().await;
            let req_clone = request
                .try_clone()
                .ok_or_else(|| MarketDataError::ApiError("Cannot clone request".to_string()))?;
            let response = self
                .client
                .execute(req_clone)
                .await
                .map_err(|e| MarketDataError::ApiError(e.to_string()))?;

            if response.status().as_u16() != 429 {
                return Ok(response);
            }

            let wait_secs = 15u64;
            tracing::warn!(
                "Polygon 429 rate limited, waiting {}s before retry {}/{}",
                wait_secs,
                attempt + 1,
                MAX_RETRIES
            );
            tokio::time::sleep(Duration::from_secs(wait_secs)).await;
        }

        Err(MarketDataError::RateLimited(MAX_RETRIES))
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, MarketDataError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        Err(MarketDataError::HttpStatus {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        })
    }

    /// Split-adjusted daily bars for `symbol` between `from` and `to`, oldest first.
    pub async fn get_daily_history(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<PriceSeries, MarketDataError> {
        let url = format!(
            "{}/v2/aggs/ticker/{}/range/1/day/{}/{}",
            BASE_URL,
            symbol,
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d")
        );

        let response = self
            .send_request(self.client.get(&url).query(&[
                ("apiKey", self.api_key.as_str()),
                ("adjusted", "true"),
                ("sort", "asc"),
                ("limit", "50000"),
            ]))
            .await?;
        let response = Self::check_status(response).await?;

        let agg_response: AggregateResponse = response
            .json()
            .await
            .map_err(|e| MarketDataError::InvalidResponse(e.to_string()))?;

        let series = aggregates_to_series(agg_response.results);
        tracing::debug!("Fetched {} daily bars for {}", series.len(), symbol);
        Ok(series)
    }

    /// Name and industry for `symbol`. Polygon has no sector field, so it is reported as `N/A`.
    pub async fn get_ticker_info(&self, symbol: &str) -> Result<TickerInfo, MarketDataError> {
        let url = format!("{}/v3/reference/tickers/{}", BASE_URL, symbol);

        let response = self
            .send_request(self.client.get(&url).query(&[("apiKey", &self.api_key)]))
            .await?;
        let response = Self::check_status(response).await?;

        let details_response: TickerDetailsResponse = response
            .json()
            .await
            .map_err(|e| MarketDataError::InvalidResponse(e.to_string()))?;

        Ok(details_response.results.into_info(symbol))
    }
}

#[async_trait]
impl PriceHistorySource for PolygonClient {
    async fn daily_history(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<PriceSeries, MarketDataError> {
        self.get_daily_history(symbol, from, to).await
    }

    async fn ticker_info(&self, symbol: &str) -> Result<TickerInfo, MarketDataError> {
        self.get_ticker_info(symbol).await
    }
}

/// Convert raw aggregate bars to price points keyed by UTC calendar date.
///
/// Bars with an unparseable timestamp are dropped. A bar without a close keeps
/// its date with `close: None`.
fn aggregates_to_series(results: Vec<AggregateResult>) -> PriceSeries {
    results
        .into_iter()
        .filter_map(|r| {
            let timestamp = DateTime::from_timestamp_millis(r.t)?;
            Some(PricePoint {
                date: timestamp.date_naive(),
                open: r.o.unwrap_or_default(),
                high: r.h.unwrap_or_default(),
                low: r.l.unwrap_or_default(),
                close: r.c,
                volume: r.v.unwrap_or_default(),
            })
        })
        .collect()
}

// Response structures
#[derive(Debug, Deserialize)]
struct AggregateResponse {
    #[serde(default)]
    results: Vec<AggregateResult>,
}

#[derive(Debug, Deserialize)]
struct AggregateResult {
    t: i64,         // timestamp (ms)
    o: Option<f64>, // open
    h: Option<f64>, // high
    l: Option<f64>, // low
    c: Option<f64>, // close
    v: Option<f64>, // volume
}

#[derive(Debug, Deserialize)]
struct TickerDetailsResponse {
    results: TickerDetails,
}

#[derive(Debug, Deserialize)]
struct TickerDetails {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    sic_description: Option<String>,
}

impl TickerDetails {
    fn into_info(self, symbol: &str) -> TickerInfo {
        let fallback = TickerInfo::fallback(symbol);
        TickerInfo {
            name: self.name.filter(|n| !n.is_empty()).unwrap_or(fallback.name),
            sector: fallback.sector,
            industry: self
                .sic_description
                .filter(|s| !s.is_empty())
                .unwrap_or(fallback.industry),
        }
    }
}
