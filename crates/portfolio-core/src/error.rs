use thiserror::Error;

/// Whole-run failures of the portfolio analytics.
///
/// Per-asset problems (empty series, non-positive first price) are never
/// reported here: those assets are dropped from the run instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No usable price data for any of the {requested} requested assets")]
    NoUsableAssets { requested: usize },

    #[error("Calculation error: initial portfolio value is zero across {assets} assets")]
    DegenerateInitialValue { assets: usize },
}

/// Failures of a market-data provider for a single request.
#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Rate limited after {0} retries")]
    RateLimited(u32),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
