//! Per-ticker hybrid evaluation.
//!
//! Runs the trend signal and the fundamental filter for one ticker and
//! folds them into a status and a 0–2 score. A failed fetch becomes a
//! `DataError` row instead of an error so one bad ticker never sinks the run.

use tracing::debug;

use crate::data::FetchError;
use crate::types::{
    EvaluationResult, FundamentalSnapshot, PriceSeries, QuantSignal, StrategyStatus, Thresholds,
    TickerData, DATA_ERROR_SCORE,
};

use super::fundamental::passes_fundamental;
use super::trend::compute_signal;

/// Evaluates tickers against one fixed set of thresholds.
#[derive(Debug, Clone, Copy)]
pub struct HybridEvaluator {
    thresholds: Thresholds,
}

impl HybridEvaluator {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// Evaluate one ticker from usable data.
    pub fn evaluate(
        &self,
        ticker: &str,
        series: &PriceSeries,
        snapshot: &FundamentalSnapshot,
    ) -> EvaluationResult {
        // 1. Trend
        let trend = compute_signal(series, self.thresholds.ma_period);
        let passes_quant = trend.signal == QuantSignal::Buy;

        // 2. Fundamentals
        let passes_fund = passes_fundamental(snapshot, &self.thresholds);

        // 3. Combine
        let hybrid_score = u8::from(passes_fund) + u8::from(passes_quant);
        let status = StrategyStatus::from_score(hybrid_score);

        debug!(
            ticker,
            signal = ?trend.signal,
            last_price = ?trend.last_price,
            sma = ?trend.moving_average,
            roe = ?snapshot.roe,
            pe = ?snapshot.pe_ratio,
            score = hybrid_score,
            "Ticker evaluated"
        );

        EvaluationResult {
            ticker: ticker.to_string(),
            last_price: trend.last_price,
            roe: snapshot.roe,
            pe_ratio: snapshot.pe_ratio,
            passes_fundamental: passes_fund,
            quant_signal: Some(trend.signal),
            passes_quant,
            status,
            hybrid_score,
            error: None,
        }
    }

    /// Evaluate the outcome of a data-source fetch.
    pub fn evaluate_fetched(
        &self,
        ticker: &str,
        fetched: &Result<TickerData, FetchError>,
    ) -> EvaluationResult {
        match fetched {
            Ok(data) => self.evaluate(ticker, &data.series, &data.fundamentals),
            Err(e) => data_error_result(ticker, e),
        }
    }
}

/// The row produced for a ticker whose data could not be retrieved.
pub fn data_error_result(ticker: &str, error: &FetchError) -> EvaluationResult {
    EvaluationResult {
        ticker: ticker.to_string(),
        last_price: None,
        roe: None,
        pe_ratio: None,
        passes_fundamental: false,
        quant_signal: None,
        passes_quant: false,
        status: StrategyStatus::DataError,
        hybrid_score: DATA_ERROR_SCORE,
        error: Some(error.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
