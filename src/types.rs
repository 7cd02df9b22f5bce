//! Shared types for the screener.
//!
//! These types form the data model used across all modules: price
//! history and fundamentals coming in from a data source, the
//! user-chosen thresholds, and the per-ticker evaluation records that
//! flow out to the presentation layer.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Price history
// ---------------------------------------------------------------------------

/// A single daily close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub close: Decimal,
}

/// Closing prices for one ticker, ascending by time, no duplicate timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series from points in any order.
    ///
    /// Points are sorted by timestamp; when a timestamp repeats, the
    /// observation that came later in `points` wins.
    pub fn new(mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.timestamp);

        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.timestamp == point.timestamp => *last = point,
                _ => deduped.push(point),
            }
        }

        Self { points: deduped }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a daily series from bare closes, oldest first.
    ///
    /// Timestamps are synthetic (consecutive days from the Unix epoch);
    /// useful for offline sources and tests where only the closes matter.
    pub fn from_closes(closes: &[Decimal]) -> Self {
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, close)| PricePoint {
                timestamp: DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::days(i as i64),
                close: *close,
            })
            .collect();
        Self { points }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Most recent close, if any.
    pub fn last_close(&self) -> Option<Decimal> {
        self.points.last().map(|p| p.close)
    }

    /// The trailing `n` points ending at the most recent one.
    /// Returns `None` when the series is shorter than `n`.
    pub fn trailing(&self, n: usize) -> Option<&[PricePoint]> {
        if n > self.points.len() {
            return None;
        }
        Some(&self.points[self.points.len() - n..])
    }
}

// ---------------------------------------------------------------------------
// Fundamentals
// ---------------------------------------------------------------------------

/// One fundamental snapshot at evaluation time. Unknown values are `None`,
/// never a sentinel number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundamentalSnapshot {
    /// Return on equity as a fraction (0.20 = 20%).
    pub roe: Option<Decimal>,
    /// Trailing price-to-earnings ratio.
    pub pe_ratio: Option<Decimal>,
}

impl FundamentalSnapshot {
    pub fn new(roe: Option<Decimal>, pe_ratio: Option<Decimal>) -> Self {
        Self { roe, pe_ratio }
    }

    /// Convert provider floats; NaN and infinities become `None`.
    pub fn from_f64(roe: Option<f64>, pe_ratio: Option<f64>) -> Self {
        Self {
            roe: roe.and_then(Decimal::from_f64),
            pe_ratio: pe_ratio.and_then(Decimal::from_f64),
        }
    }
}

/// Everything a data source returns for one ticker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerData {
    pub series: PriceSeries,
    pub fundamentals: FundamentalSnapshot,
}

impl TickerData {
    pub fn new(series: PriceSeries, fundamentals: FundamentalSnapshot) -> Self {
        Self { series, fundamentals }
    }
}

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// User-chosen screening thresholds, immutable for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Minimum return on equity, as a fraction. Must be >= 0.
    pub min_roe: Decimal,
    /// Maximum trailing P/E. Must be > 0.
    pub max_pe: Decimal,
    /// Moving-average window in trading days. Must be >= 1.
    pub ma_period: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_roe: dec!(0.15),
            max_pe: dec!(25),
            ma_period: 200,
        }
    }
}

impl Thresholds {
    /// Check the documented domain of every threshold.
    pub fn validate(&self) -> Result<(), ScreenerError> {
        if self.min_roe < Decimal::ZERO {
            return Err(ScreenerError::InvalidConfiguration(format!(
                "min_roe must be >= 0, got {}",
                self.min_roe
            )));
        }
        if self.max_pe <= Decimal::ZERO {
            return Err(ScreenerError::InvalidConfiguration(format!(
                "max_pe must be > 0, got {}",
                self.max_pe
            )));
        }
        if self.ma_period == 0 {
            return Err(ScreenerError::InvalidConfiguration(
                "ma_period must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Thresholds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ROE >= {:.2}% | P/E <= {:.2} | MA({})",
            self.min_roe * dec!(100),
            self.max_pe,
            self.ma_period,
        )
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Trend classification of the latest close against its moving average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuantSignal {
    Buy,
    Sell,
    Neutral,
    InsufficientData,
}

impl fmt::Display for QuantSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuantSignal::Buy => write!(f, "BUY (uptrend)"),
            QuantSignal::Sell => write!(f, "SELL (downtrend)"),
            QuantSignal::Neutral => write!(f, "NEUTRAL"),
            QuantSignal::InsufficientData => write!(f, "Insufficient history"),
        }
    }
}

/// Combined outcome of the two filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyStatus {
    Ideal,
    Partial,
    Excluded,
    DataError,
}

impl StrategyStatus {
    /// Status for a usable ticker given how many filters it passed.
    pub fn from_score(score: u8) -> Self {
        match score {
            2 => StrategyStatus::Ideal,
            1 => StrategyStatus::Partial,
            _ => StrategyStatus::Excluded,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StrategyStatus::Ideal => "IDEAL (full alignment)",
            StrategyStatus::Partial => "Under review (missing timing or fundamentals)",
            StrategyStatus::Excluded => "Outside criteria",
            StrategyStatus::DataError => "Connection/data error",
        }
    }
}

impl fmt::Display for StrategyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Evaluation records
// ---------------------------------------------------------------------------

/// Score carried by `DataError` rows. Same value as a zero-filter pass, but
/// the status keeps the two apart.
pub const DATA_ERROR_SCORE: u8 = 0;

/// Outcome of evaluating one ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub ticker: String,
    pub last_price: Option<Decimal>,
    pub roe: Option<Decimal>,
    pub pe_ratio: Option<Decimal>,
    pub passes_fundamental: bool,
    /// `None` only on the data-error path.
    pub quant_signal: Option<QuantSignal>,
    pub passes_quant: bool,
    pub status: StrategyStatus,
    pub hybrid_score: u8,
    /// Upstream failure message for `DataError` rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EvaluationResult {
    pub fn is_ideal(&self) -> bool {
        self.status == StrategyStatus::Ideal
    }

    pub fn is_data_error(&self) -> bool {
        self.status == StrategyStatus::DataError
    }
}

impl fmt::Display for EvaluationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let price = self
            .last_price
            .map(|p| format!("{p:.2}"))
            .unwrap_or_else(|| "N/A".to_string());
        let signal = self
            .quant_signal
            .map(|s| s.to_string())
            .unwrap_or_else(|| "Error".to_string());
        write!(
            f,
            "{} @ {} | fund={} quant={} ({}) | score={} | {}",
            self.ticker,
            price,
            self.passes_fundamental,
            self.passes_quant,
            signal,
            self.hybrid_score,
            self.status,
        )
    }
}

/// Per-status tallies for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub ideal: usize,
    pub partial: usize,
    pub excluded: usize,
    pub data_error: usize,
}

/// Results of one screening run, ordered by hybrid score descending with
/// universe order kept among equal scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedResultSet {
    pub run_id: Uuid,
    pub thresholds: Thresholds,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub results: Vec<EvaluationResult>,
}

impl RankedResultSet {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EvaluationResult> {
        self.results.iter()
    }

    /// The `Ideal` rows, in rank order.
    pub fn ideal(&self) -> Vec<&EvaluationResult> {
        self.results.iter().filter(|r| r.is_ideal()).collect()
    }

    /// Look up a ticker's row.
    pub fn get(&self, ticker: &str) -> Option<&EvaluationResult> {
        self.results.iter().find(|r| r.ticker == ticker)
    }

    pub fn count_by_status(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for r in &self.results {
            match r.status {
                StrategyStatus::Ideal => counts.ideal += 1,
                StrategyStatus::Partial => counts.partial += 1,
                StrategyStatus::Excluded => counts.excluded += 1,
                StrategyStatus::DataError => counts.data_error += 1,
            }
        }
        counts
    }

    /// One-line summary for logging.
    pub fn summary(&self) -> String {
        let c = self.count_by_status();
        let secs = (self.completed_at - self.started_at).num_milliseconds() as f64 / 1000.0;
        format!(
            "Screened {} tickers in {:.1}s: {} ideal, {} partial, {} excluded, {} data errors",
            self.len(),
            secs,
            c.ideal,
            c.partial,
            c.excluded,
            c.data_error,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that abort a whole screening run. Per-ticker problems never
/// surface here; they become `DataError` rows.
#[derive(Debug, thiserror::Error)]
pub enum ScreenerError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
