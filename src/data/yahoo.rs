//! Yahoo Finance data source.
//!
//! Daily closes come from the v8 chart endpoint; return on equity and
//! trailing P/E come from the v10 quoteSummary endpoint
//! (`financialData` and `summaryDetail` modules).
//!
//! API: `https://query1.finance.yahoo.com`
//! Auth: none for chart; quoteSummary needs a session cookie plus a
//! "crumb" token, fetched once and reused.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use rust_decimal::prelude::*;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{DataSource, FetchError};
use crate::types::{FundamentalSnapshot, PricePoint, PriceSeries, TickerData};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const BASE_URL: &str = "https://query1.finance.yahoo.com";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const SOURCE_NAME: &str = "yahoo";
const USER_AGENT: &str = "Mozilla/5.0 (compatible; quantamental/0.1)";

/// Default lookback for price history.
pub const DEFAULT_HISTORY_DAYS: u32 = 365;

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartData,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummaryData,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryData {
    #[serde(default)]
    result: Option<Vec<QuoteSummaryResult>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResult {
    #[serde(default)]
    financial_data: Option<FinancialData>,
    #[serde(default)]
    summary_detail: Option<SummaryDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinancialData {
    #[serde(default)]
    return_on_equity: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct SummaryDetail {
    #[serde(rename = "trailingPE", default)]
    trailing_pe: Option<RawValue>,
}

/// Yahoo wraps numbers as `{"raw": 0.1234, "fmt": "12.34%"}`; an unknown
/// value arrives as `{}`.
#[derive(Debug, Deserialize)]
struct RawValue {
    #[serde(default)]
    raw: Option<f64>,
}

fn raw(value: &Option<RawValue>) -> Option<f64> {
    value.as_ref().and_then(|v| v.raw).filter(|v| v.is_finite())
}

fn has_error(error: &Option<serde_json::Value>) -> Option<String> {
    match error {
        None | Some(serde_json::Value::Null) => None,
        Some(v) => Some(
            v.get("description")
                .and_then(|d| d.as_str())
                .map(String::from)
                .unwrap_or_else(|| v.to_string()),
        ),
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a chart response into a daily close series.
///
/// Null closes (holidays, halted sessions) are skipped. A result with no
/// timestamps is an empty series, not an error.
fn parse_chart(ticker: &str, body: &str) -> Result<PriceSeries, FetchError> {
    let resp: ChartResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Parse(format!("{ticker} chart: {e}")))?;

    if let Some(msg) = has_error(&resp.chart.error) {
        return Err(FetchError::NoData(format!("{ticker}: {msg}")));
    }

    let result = resp
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| FetchError::NoData(format!("{ticker}: empty chart result")))?;

    let timestamps = result.timestamp.unwrap_or_default();
    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    let points = timestamps
        .iter()
        .zip(closes.iter())
        .filter_map(|(ts, close)| {
            let close = Decimal::from_f64((*close)?)?;
            let timestamp = chrono::DateTime::from_timestamp(*ts, 0)?;
            Some(PricePoint { timestamp, close })
        })
        .collect();

    Ok(PriceSeries::new(points))
}

/// Parse a quoteSummary response into a fundamental snapshot.
///
/// Missing modules or fields leave the corresponding value absent.
fn parse_quote_summary(ticker: &str, body: &str) -> Result<FundamentalSnapshot, FetchError> {
    let resp: QuoteSummaryResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::Parse(format!("{ticker} quoteSummary: {e}")))?;

    if let Some(msg) = has_error(&resp.quote_summary.error) {
        return Err(FetchError::NoData(format!("{ticker}: {msg}")));
    }

    let result = resp
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| FetchError::NoData(format!("{ticker}: empty quoteSummary result")))?;

    let roe = result
        .financial_data
        .as_ref()
        .and_then(|f| raw(&f.return_on_equity));
    let pe = result
        .summary_detail
        .as_ref()
        .and_then(|s| raw(&s.trailing_pe));

    Ok(FundamentalSnapshot::from_f64(roe, pe))
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

pub struct YahooDataSource {
    http: Client,
    history_days: u32,
    crumb: Mutex<Option<String>>,
}

impl YahooDataSource {
    pub fn new(history_days: u32, timeout: std::time::Duration) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .build()?;
        Ok(Self {
            http,
            history_days,
            crumb: Mutex::new(None),
        })
    }

    async fn fetch_series(&self, ticker: &str) -> Result<PriceSeries, FetchError> {
        let now = Utc::now();
        let start = now - Duration::days(i64::from(self.history_days));
        let url = format!(
            "{BASE_URL}/v8/finance/chart/{}?period1={}&period2={}&interval=1d",
            urlencoding::encode(ticker),
            start.timestamp(),
            now.timestamp(),
        );

        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                ticker: ticker.to_string(),
                status: status.as_u16(),
            });
        }
        let body = resp.text().await?;
        parse_chart(ticker, &body)
    }

    /// Session crumb for quoteSummary, fetched once per source.
    async fn crumb(&self) -> Result<String, FetchError> {
        let mut guard = self.crumb.lock().await;
        if let Some(c) = guard.as_ref() {
            return Ok(c.clone());
        }

        // Only the Set-Cookie matters; this endpoint answers 404.
        if let Err(e) = self.http.get(COOKIE_URL).send().await {
            debug!(error = %e, "Yahoo cookie request failed");
        }

        let resp = self
            .http
            .get(format!("{BASE_URL}/v1/test/getcrumb"))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(FetchError::Other(format!(
                "crumb request returned {}",
                resp.status()
            )));
        }
        let crumb = resp.text().await?.trim().to_string();
        if crumb.is_empty() || crumb.contains('<') {
            return Err(FetchError::Other("invalid crumb".to_string()));
        }

        *guard = Some(crumb.clone());
        Ok(crumb)
    }

    async fn fetch_fundamentals(&self, ticker: &str) -> Result<FundamentalSnapshot, FetchError> {
        let crumb = self.crumb().await?;
        let url = format!(
            "{BASE_URL}/v10/finance/quoteSummary/{}?modules=financialData,summaryDetail&crumb={}",
            urlencoding::encode(ticker),
            urlencoding::encode(&crumb),
        );

        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        if status.as_u16() == 401 {
            // Stale crumb; the next fetch negotiates a fresh one.
            warn!(ticker, "Yahoo rejected crumb, resetting session");
            *self.crumb.lock().await = None;
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                ticker: ticker.to_string(),
                status: status.as_u16(),
            });
        }
        let body = resp.text().await?;
        parse_quote_summary(ticker, &body)
    }
}

#[async_trait]
impl DataSource for YahooDataSource {
    async fn fetch(&self, ticker: &str) -> Result<TickerData, FetchError> {
        let (series, fundamentals) =
            tokio::join!(self.fetch_series(ticker), self.fetch_fundamentals(ticker));
        let series = series?;
        let fundamentals = fundamentals?;

        debug!(
            ticker,
            points = series.len(),
            roe = ?fundamentals.roe,
            pe = ?fundamentals.pe_ratio,
            "Yahoo data fetched"
        );

        Ok(TickerData::new(series, fundamentals))
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
