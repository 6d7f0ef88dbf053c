use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::NaiveDate;
use polygon_client::{fetch_histories, fetch_ticker_infos};
use portfolio_analytics::{
    compute_metrics, compute_performance_timeline, shared_math::round_dp, PerformancePoint,
    PortfolioMetrics,
};
use portfolio_core::{AnalyticsError, PricePoint, PriceSeries, TickerInfo};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::{ApiResponse, AppError, AppState};

/// One daily bar as shown to the dashboard, prices rounded to cents.
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: Option<f64>,
    pub volume: u64,
}

impl From<&PricePoint> for HistoryBar {
    fn from(p: &PricePoint) -> Self {
        Self {
            date: p.date,
            open: round_dp(p.open, 2),
            high: round_dp(p.high, 2),
            low: round_dp(p.low, 2),
            close: p.close_value().map(|c| round_dp(c, 2)),
            volume: p.volume.max(0.0).round() as u64,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssetData {
    pub history: Vec<HistoryBar>,
    pub info: TickerInfo,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PortfolioData {
    pub assets: BTreeMap<String, AssetData>,
    pub metrics: PortfolioMetrics,
    pub tickers: Vec<String>,
    pub portfolio_value: f64,
}

pub fn portfolio_routes() -> Router<AppState> {
    Router::new()
        .route("/api/portfolio-data", get(get_portfolio_data))
        .route("/api/portfolio-performance", get(get_portfolio_performance))
}

fn analytics_err(e: AnalyticsError, no_data_status: StatusCode) -> AppError {
    match e {
        AnalyticsError::NoUsableAssets { .. } => AppError::with_status(no_data_status, e.into()),
        other => AppError::with_status(StatusCode::INTERNAL_SERVER_ERROR, other.into()),
    }
}

async fn load_histories(state: &AppState) -> HashMap<String, PriceSeries> {
    let (from, to) = state.config.lookback_window();
    tracing::info!(
        "Fetching {} tickers from {} to {}",
        state.config.tickers.len(),
        from.format("%Y-%m-%d"),
        to.format("%Y-%m-%d")
    );
    fetch_histories(state.source.as_ref(), &state.config.tickers, from, to).await
}

/// Configured tickers that came back with at least one bar, in configured order.
fn tickers_with_data(state: &AppState, histories: &HashMap<String, PriceSeries>) -> Vec<String> {
    state
        .config
        .tickers
        .iter()
        .filter(|t| histories.get(*t).is_some_and(|s| !s.is_empty()))
        .cloned()
        .collect()
}

async fn get_portfolio_data(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PortfolioData>>, AppError> {
    let config = state.config.clone();
    let histories = load_histories(&state).await;

    let tickers = tickers_with_data(&state, &histories);
    if tickers.is_empty() {
        return Err(AppError::with_status(
            StatusCode::INTERNAL_SERVER_ERROR,
            anyhow::anyhow!("No price data could be fetched for any configured ticker"),
        ));
    }

    let metrics = compute_metrics(
        &histories,
        &config.tickers,
        config.portfolio_value,
        config.risk_free_rate_pct,
    )
    .map_err(|e| analytics_err(e, StatusCode::INTERNAL_SERVER_ERROR))?;

    let mut infos = fetch_ticker_infos(state.source.as_ref(), &tickers).await;
    let assets = tickers
        .iter()
        .map(|ticker| {
            let history = histories
                .get(ticker)
                .map(|s| s.iter().map(HistoryBar::from).collect())
                .unwrap_or_default();
            let info = infos
                .remove(ticker)
                .unwrap_or_else(|| TickerInfo::fallback(ticker));
            (ticker.clone(), AssetData { history, info })
        })
        .collect();

    tracing::info!(
        "Returning data for {}/{} tickers",
        tickers.len(),
        config.tickers.len()
    );

    Ok(Json(ApiResponse::success(PortfolioData {
        assets,
        metrics,
        tickers,
        portfolio_value: config.portfolio_value,
    })))
}

async fn get_portfolio_performance(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<PerformancePoint>>>, AppError> {
    let histories = load_histories(&state).await;
    if tickers_with_data(&state, &histories).is_empty() {
        return Err(AppError::not_found("No data available"));
    }

    let curve = compute_performance_timeline(
        &histories,
        &state.config.tickers,
        state.config.portfolio_value,
    )
    .map_err(|e| analytics_err(e, StatusCode::NOT_FOUND))?;

    tracing::info!("Portfolio performance calculated: {} data points", curve.len());
    Ok(Json(ApiResponse::success(curve)))
}
