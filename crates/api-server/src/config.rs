use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::env;

/// Equal-weight universe used when `PORTFOLIO_TICKERS` is not set.
pub const DEFAULT_TICKERS: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "NVDA", "TSLA", "PLTR", "AMD", "INTC", "IBM", "ORCL", "CSCO", "ADBE",
    "CRM", "QCOM", "TXN", "AVGO", "MU", "LRCX", "SNPS", "NOW", "UBER", "LYFT", "TWTR", "SNAP",
    "PINS", "SPOT", "NFLX", "DIS", "AMZN", "SHOP", "SQ", "PYPL", "V", "MA", "AXP", "BAC", "JPM",
    "C", "WFC", "GS", "MS", "BLK", "TROW", "SCHW", "VTI", "VOO", "IVV", "QQQ", "DIA", "SPY", "EEM",
    "IWM",
];

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioConfig {
    pub tickers: Vec<String>,
    pub portfolio_value: f64,     // 100000
    pub lookback_days: i64,       // 1825 (5 years)
    pub risk_free_rate_pct: f64,  // 4.0
    #[serde(skip)]
    pub polygon_api_key: String,
    pub polygon_rate_limit: usize, // 500 req/min, free tier should use 5
    pub port: u16,                 // 5000
}

impl PortfolioConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let tickers = match get("PORTFOLIO_TICKERS") {
            Some(raw) => parse_tickers(&raw),
            None => DEFAULT_TICKERS.iter().map(|t| t.to_string()).collect(),
        };

        let config = Self {
            tickers,
            portfolio_value: get("PORTFOLIO_VALUE")
                .unwrap_or_else(|| "100000".to_string())
                .parse()
                .context("PORTFOLIO_VALUE must be a number")?,
            lookback_days: get("LOOKBACK_DAYS")
                .unwrap_or_else(|| "1825".to_string())
                .parse()
                .context("LOOKBACK_DAYS must be an integer")?,
            risk_free_rate_pct: get("RISK_FREE_RATE")
                .unwrap_or_else(|| "4.0".to_string())
                .parse()
                .context("RISK_FREE_RATE must be a number")?,
            polygon_api_key: get("POLYGON_API_KEY")
                .filter(|k| !k.trim().is_empty())
                .context("POLYGON_API_KEY not set")?,
            polygon_rate_limit: get("POLYGON_RATE_LIMIT")
                .unwrap_or_else(|| "500".to_string())
                .parse()
                .context("POLYGON_RATE_LIMIT must be a positive integer")?,
            port: get("API_PORT")
                .unwrap_or_else(|| "5000".to_string())
                .parse()
                .context("API_PORT must be a valid port")?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.portfolio_value.is_finite() || self.portfolio_value <= 0.0 {
            bail!("PORTFOLIO_VALUE must be positive, got {}", self.portfolio_value);
        }
        if self.lookback_days <= 0 {
            bail!("LOOKBACK_DAYS must be positive, got {}", self.lookback_days);
        }
        if !self.risk_free_rate_pct.is_finite() {
            bail!("RISK_FREE_RATE must be finite");
        }
        if self.polygon_rate_limit == 0 {
            bail!("POLYGON_RATE_LIMIT must be at least 1");
        }
        if self.tickers.is_empty() {
            bail!("PORTFOLIO_TICKERS must list at least one ticker");
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.tickers.iter().find(|t| !seen.insert(t.as_str())) {
            bail!("PORTFOLIO_TICKERS lists {} more than once", dup);
        }
        Ok(())
    }

    /// `(from, to)` for the configured lookback, ending now.
    pub fn lookback_window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let to = Utc::now();
        (to - Duration::days(self.lookback_days), to)
    }
}

fn parse_tickers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}
