//! Dashboard API over the mock market.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use rust_decimal_macros::dec;
use std::sync::Arc;
use tower::ServiceExt;

use quantamental::dashboard::{build_router, AppState, DashboardState};
use quantamental::data::FetchError;
use quantamental::engine::ScreeningEngine;
use quantamental::types::Thresholds;

use crate::mock_source::{downtrend, uptrend, MockMarket};

fn state() -> AppState {
    let market = MockMarket::new()
        .with_ticker("WEGE3.SA", &uptrend(), Some(dec!(0.31)), Some(dec!(24.5)))
        .with_ticker("VALE3.SA", &downtrend(), Some(dec!(0.18)), Some(dec!(6.2)))
        .with_failure("HAPV3.SA", FetchError::Http("timeout".into()));

    Arc::new(DashboardState::new(
        Arc::new(market),
        ScreeningEngine::default(),
        vec!["HAPV3.SA".into(), "VALE3.SA".into(), "WEGE3.SA".into()],
        Thresholds::default(),
    ))
}

async fn get(state: AppState, uri: &str) -> (StatusCode, serde_json::Value) {
    let resp = build_router(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), 1_000_000).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_screen_then_latest() {
    let state = state();

    let (status, screened) = get(state.clone(), "/api/screen").await;
    assert_eq!(status, StatusCode::OK);
    let tickers: Vec<&str> = screened["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["ticker"].as_str().unwrap())
        .collect();
    assert_eq!(tickers, vec!["WEGE3.SA", "VALE3.SA", "HAPV3.SA"]);
    assert_eq!(screened["results"][2]["error"], "HTTP request failed: timeout");

    let (status, latest) = get(state, "/api/latest").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(latest["run_id"], screened["run_id"]);
}

#[tokio::test]
async fn test_ideal_with_override() {
    // Tightening P/E below WEGE3's 24.5 leaves nothing ideal.
    let (status, json) = get(state(), "/api/screen/ideal?max_pe=20").await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["ideal"].as_array().unwrap().is_empty());

    let (_, json) = get(state(), "/api/screen/ideal").await;
    assert_eq!(json["ideal"][0]["ticker"], "WEGE3.SA");
}

#[tokio::test]
async fn test_bad_request_body() {
    let (status, json) = get(state(), "/api/screen?min_roe=lots").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("min_roe"));
}
