//! Screening engine.
//!
//! Drives the hybrid evaluator across the configured universe, isolating
//! per-ticker fetch failures, and returns the full ranked result set.
//!
//! Tickers are fetched concurrently up to `max_concurrency`. Results are
//! collected in universe order and then stably sorted by hybrid score, so
//! equal scores keep their input order.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tracing::{info, warn};
use uuid::Uuid;

use crate::data::DataSource;
use crate::strategy::hybrid::HybridEvaluator;
use crate::types::{EvaluationResult, RankedResultSet, ScreenerError, Thresholds};

/// Default number of tickers fetched at once.
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Stateless screening engine. Each `run` is independent.
#[derive(Debug, Clone, Copy)]
pub struct ScreeningEngine {
    max_concurrency: usize,
}

impl Default for ScreeningEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENCY)
    }
}

impl ScreeningEngine {
    /// Create an engine; a concurrency of zero is treated as one.
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Screen `tickers` with `thresholds`, pulling data from `source`.
    ///
    /// Only invalid thresholds fail the run. A ticker whose fetch fails
    /// is reported as a `DataError` row and the rest are unaffected.
    pub async fn run<D>(
        &self,
        tickers: &[String],
        thresholds: &Thresholds,
        source: &D,
    ) -> Result<RankedResultSet, ScreenerError>
    where
        D: DataSource + ?Sized,
    {
        thresholds.validate()?;

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(
            %run_id,
            tickers = tickers.len(),
            thresholds = %thresholds,
            concurrency = self.max_concurrency,
            "Starting screening run"
        );

        let evaluator = HybridEvaluator::new(*thresholds);

        // `buffered` yields in input order regardless of completion order.
        let results: Vec<EvaluationResult> = stream::iter(tickers.iter().cloned())
            .map(|ticker: String| async move {
                let fetched = source.fetch(&ticker).await;
                if let Err(e) = &fetched {
                    warn!(ticker = %ticker, error = %e, "Fetch failed, reporting as data error");
                }
                evaluator.evaluate_fetched(&ticker, &fetched)
            })
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let ranked = RankedResultSet {
            run_id,
            thresholds: *thresholds,
            started_at,
            completed_at: Utc::now(),
            results: rank(results),
        };

        let counts = ranked.count_by_status();
        info!(
            %run_id,
            ideal = counts.ideal,
            partial = counts.partial,
            excluded = counts.excluded,
            data_errors = counts.data_error,
            "Screening run complete"
        );

        Ok(ranked)
    }
}

/// Order results by hybrid score, highest first, keeping input order
/// among equal scores.
pub fn rank(mut results: Vec<EvaluationResult>) -> Vec<EvaluationResult> {
    results.sort_by(|a, b| b.hybrid_score.cmp(&a.hybrid_score));
    results
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
