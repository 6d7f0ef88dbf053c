use super::*;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use chrono::{DateTime, NaiveDate, Utc};
use portfolio_core::{MarketDataError, PricePoint, PriceSeries, TickerInfo};
use serde_json::Value;
use std::collections::HashMap;
use tower::ServiceExt;

/// In-memory provider: known symbols return their fixed series, anything else 404s.
struct StaticSource {
    series: HashMap<String, PriceSeries>,
}

#[async_trait]
impl PriceHistorySource for StaticSource {
    async fn daily_history(
        &self,
        symbol: &str,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
    ) -> Result<PriceSeries, MarketDataError> {
        self.series
            .get(symbol)
            .cloned()
            .ok_or_else(|| MarketDataError::HttpStatus {
                status: 404,
                body: format!("unknown ticker {}", symbol),
            })
    }

    async fn ticker_info(&self, symbol: &str) -> Result<TickerInfo, MarketDataError> {
        match symbol {
            "A" => Ok(TickerInfo {
                name: "Alpha Corp".to_string(),
                sector: "N/A".to_string(),
                industry: "SEMICONDUCTORS".to_string(),
            }),
            _ => Err(MarketDataError::InvalidResponse("no details".to_string())),
        }
    }
}

fn series(closes: &[f64]) -> PriceSeries {
    closes
        .iter()
        .enumerate()
        .map(|(i, c)| PricePoint {
            date: NaiveDate::from_ymd_opt(2024, 2, 5).unwrap() + chrono::Days::new(i as u64),
            open: c - 0.004,
            high: c + 0.126,
            low: c - 0.5,
            close: Some(*c),
            volume: 1_234_567.0,
        })
        .collect()
}

fn app(tickers: &[&str], data: &[(&str, Vec<f64>)], capital: f64) -> Router {
    let config = PortfolioConfig {
        tickers: tickers.iter().map(|t| t.to_string()).collect(),
        portfolio_value: capital,
        lookback_days: 30,
        risk_free_rate_pct: 4.0,
        polygon_api_key: "pk_test".to_string(),
        polygon_rate_limit: 5,
        port: 0,
    };
    let source = StaticSource {
        series: data
            .iter()
            .map(|(s, closes)| (s.to_string(), series(closes)))
            .collect(),
    };
    build_router(AppState {
        config: Arc::new(config),
        source: Arc::new(source),
    })
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health_check() {
    let (status, body) = get_json(app(&["A"], &[], 100.0), "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_portfolio_data_omits_tickers_without_data() {
    let router = app(
        &["A", "B", "C"],
        &[("A", vec![10.0, 10.0, 12.0]), ("B", vec![20.0, 20.0, 25.0])],
        150.0,
    );
    let (status, body) = get_json(router, "/api/portfolio-data").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["error"].is_null());

    let data = &body["data"];
    assert_eq!(data["tickers"], serde_json::json!(["A", "B"]));
    assert_eq!(data["portfolio_value"], 150.0);
    assert!(data["assets"].get("C").is_none());

    // C is requested but unusable, so a third of the capital stays undeployed.
    let metrics = &data["metrics"];
    assert_eq!(metrics["initial_value"], 100.0);
    assert_eq!(metrics["total_value"], 122.5);
    assert_eq!(metrics["total_return_pct"], 22.5);
    assert_eq!(metrics["allocations"]["A"]["shares"], 5.0);
    assert_eq!(metrics["asset_returns"]["B"], 25.0);
}

#[tokio::test]
async fn test_portfolio_data_rounds_history_and_falls_back_on_info() {
    let router = app(&["A", "B"], &[("A", vec![10.0, 11.0]), ("B", vec![20.0, 21.0])], 100.0);
    let (status, body) = get_json(router, "/api/portfolio-data").await;
    assert_eq!(status, StatusCode::OK);

    let a = &body["data"]["assets"]["A"];
    assert_eq!(a["info"]["name"], "Alpha Corp");
    assert_eq!(a["history"][0]["date"], "2024-02-05");
    assert_eq!(a["history"][0]["open"], 10.0);
    assert_eq!(a["history"][0]["high"], 10.13);
    assert_eq!(a["history"][0]["volume"], 1_234_567);

    let b = &body["data"]["assets"]["B"];
    assert_eq!(b["info"]["name"], "B");
    assert_eq!(b["info"]["sector"], "N/A");
    assert_eq!(b["info"]["industry"], "N/A");
}

#[tokio::test]
async fn test_portfolio_data_without_any_data_is_server_error() {
    let (status, body) = get_json(app(&["X", "Y"], &[], 100.0), "/api/portfolio-data").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(body["data"].is_null());
    assert!(body["error"].as_str().unwrap().contains("No price data"));
}

#[tokio::test]
async fn test_performance_timeline() {
    let router = app(
        &["A", "B", "C"],
        &[("A", vec![10.0, 10.0, 12.0]), ("B", vec![20.0, 20.0, 25.0])],
        150.0,
    );
    let (status, body) = get_json(router, "/api/portfolio-performance").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let points = body["data"].as_array().unwrap();
    assert_eq!(points.len(), 3);
    assert_eq!(points[0]["date"], "2024-02-05");
    assert_eq!(points[0]["value"], 100.0);
    assert_eq!(points[2]["value"], 122.5);
}

#[tokio::test]
async fn test_performance_without_data_is_not_found() {
    let (status, body) = get_json(app(&["X"], &[], 100.0), "/api/portfolio-performance").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "No data available");
}

#[tokio::test]
async fn test_performance_with_only_non_positive_prices_is_not_found() {
    let router = app(&["A"], &[("A", vec![0.0, 0.0])], 100.0);
    let (status, body) = get_json(router, "/api/portfolio-performance").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}
