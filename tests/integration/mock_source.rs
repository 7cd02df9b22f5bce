//! Mock market data source for integration testing.
//!
//! Provides a deterministic `DataSource` that serves scripted price
//! histories and fundamentals, can fail or stall individual tickers, and
//! records how it was called.

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use quantamental::data::{DataSource, FetchError};
use quantamental::types::{FundamentalSnapshot, PriceSeries, TickerData};

enum Scripted {
    Data(TickerData),
    Fail(FetchError),
}

/// A mock market data source for deterministic testing.
///
/// Per-ticker delays let tests make later tickers finish first.
pub struct MockMarket {
    scripts: HashMap<String, Scripted>,
    delays: HashMap<String, Duration>,
    calls: Arc<Mutex<Vec<String>>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockMarket {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            delays: HashMap::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Serve `closes` (oldest first) and the given fundamentals.
    pub fn with_ticker(
        mut self,
        ticker: &str,
        closes: &[Decimal],
        roe: Option<Decimal>,
        pe: Option<Decimal>,
    ) -> Self {
        let data = TickerData::new(
            PriceSeries::from_closes(closes),
            FundamentalSnapshot::new(roe, pe),
        );
        self.scripts.insert(ticker.to_string(), Scripted::Data(data));
        self
    }

    pub fn with_failure(mut self, ticker: &str, error: FetchError) -> Self {
        self.scripts.insert(ticker.to_string(), Scripted::Fail(error));
        self
    }

    pub fn with_delay(mut self, ticker: &str, delay: Duration) -> Self {
        self.delays.insert(ticker.to_string(), delay);
        self
    }

    /// Tickers in the order their fetches started.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Highest number of fetches observed running at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataSource for MockMarket {
    async fn fetch(&self, ticker: &str) -> Result<TickerData, FetchError> {
        self.calls.lock().unwrap().push(ticker.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(ticker) {
            tokio::time::sleep(*delay).await;
        }

        let result = match self.scripts.get(ticker) {
            Some(Scripted::Data(data)) => Ok(data.clone()),
            Some(Scripted::Fail(e)) => Err(e.clone()),
            None => Err(FetchError::NoData(ticker.to_string())),
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// Canned histories
// ---------------------------------------------------------------------------

/// 250 closes rising from 10.00 by 0.10 a day, last close 34.90.
pub fn uptrend() -> Vec<Decimal> {
    (0..250).map(|i| dec!(10) + Decimal::from(i) * dec!(0.1)).collect()
}

/// 250 closes falling from 50.00 by 0.10 a day, last close 25.10.
pub fn downtrend() -> Vec<Decimal> {
    (0..250).map(|i| dec!(50) - Decimal::from(i) * dec!(0.1)).collect()
}

/// Flat history: the last close equals every average.
pub fn flat(len: usize) -> Vec<Decimal> {
    vec![dec!(20); len]
}
