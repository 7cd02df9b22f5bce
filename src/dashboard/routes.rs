//! Dashboard API route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<DashboardState>`.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::data::DataSource;
use crate::engine::ScreeningEngine;
use crate::types::{EvaluationResult, RankedResultSet, ScreenerError, Thresholds};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct DashboardState {
    pub source: Arc<dyn DataSource>,
    pub engine: ScreeningEngine,
    pub tickers: Vec<String>,
    /// Thresholds used when a request overrides nothing.
    pub default_thresholds: Thresholds,
    /// Most recent completed run, from startup or any screen request.
    pub last_run: RwLock<Option<RankedResultSet>>,
}

impl DashboardState {
    pub fn new(
        source: Arc<dyn DataSource>,
        engine: ScreeningEngine,
        tickers: Vec<String>,
        default_thresholds: Thresholds,
    ) -> Self {
        Self {
            source,
            engine,
            tickers,
            default_thresholds,
            last_run: RwLock::new(None),
        }
    }

    /// Seed the latest run, e.g. with the startup screen.
    pub async fn record_run(&self, run: RankedResultSet) {
        *self.last_run.write().await = Some(run);
    }
}

pub type AppState = Arc<DashboardState>;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Threshold overrides; every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScreenQuery {
    pub min_roe: Option<String>,
    pub max_pe: Option<String>,
    pub ma_period: Option<String>,
}

impl ScreenQuery {
    /// Merge the overrides onto `defaults` and validate the result.
    pub fn merge(&self, defaults: &Thresholds) -> Result<Thresholds, ApiError> {
        let mut merged = *defaults;
        if let Some(raw) = &self.min_roe {
            merged.min_roe = parse_decimal("min_roe", raw)?;
        }
        if let Some(raw) = &self.max_pe {
            merged.max_pe = parse_decimal("max_pe", raw)?;
        }
        if let Some(raw) = &self.ma_period {
            merged.ma_period = raw
                .trim()
                .parse()
                .map_err(|_| ApiError::bad_request(format!("ma_period is not an integer: {raw}")))?;
        }
        merged.validate()?;
        Ok(merged)
    }
}

fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, ApiError> {
    Decimal::from_str(raw.trim())
        .map_err(|_| ApiError::bad_request(format!("{field} is not a number: {raw}")))
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct UniverseResponse {
    pub tickers: Vec<String>,
    pub thresholds: Thresholds,
}

#[derive(Debug, Clone, Serialize)]
pub struct IdealResponse {
    pub thresholds: Thresholds,
    pub ideal: Vec<EvaluationResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Handler error rendered as a JSON body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<ScreenerError> for ApiError {
    fn from(e: ScreenerError) -> Self {
        Self::bad_request(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// GET /api/universe
pub async fn get_universe(State(state): State<AppState>) -> Json<UniverseResponse> {
    Json(UniverseResponse {
        tickers: state.tickers.clone(),
        thresholds: state.default_thresholds,
    })
}

/// GET /api/screen
pub async fn get_screen(
    State(state): State<AppState>,
    Query(query): Query<ScreenQuery>,
) -> Result<Json<RankedResultSet>, ApiError> {
    let run = screen(&state, &query).await?;
    Ok(Json(run))
}

/// GET /api/screen/ideal
pub async fn get_screen_ideal(
    State(state): State<AppState>,
    Query(query): Query<ScreenQuery>,
) -> Result<Json<IdealResponse>, ApiError> {
    let run = screen(&state, &query).await?;
    Ok(Json(IdealResponse {
        thresholds: run.thresholds,
        ideal: run.ideal().into_iter().cloned().collect(),
    }))
}

/// GET /api/latest
pub async fn get_latest(State(state): State<AppState>) -> Result<Json<RankedResultSet>, ApiError> {
    state
        .last_run
        .read()
        .await
        .clone()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("no screening run has completed yet"))
}

async fn screen(state: &DashboardState, query: &ScreenQuery) -> Result<RankedResultSet, ApiError> {
    let thresholds = query.merge(&state.default_thresholds).map_err(|e| {
        warn!(error = %e.message, "Rejected screen request");
        e
    })?;

    let run = state
        .engine
        .run(&state.tickers, &thresholds, state.source.as_ref())
        .await?;
    info!(run_id = %run.run_id, "{}", run.summary());

    state.record_run(run.clone()).await;
    Ok(run)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
