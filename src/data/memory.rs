//! Static in-memory data source.
//!
//! Serves fixed per-ticker data or a fixed error. Used for offline runs
//! and as a deterministic stand-in for the HTTP provider.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{DataSource, FetchError};
use crate::types::TickerData;

pub struct StaticDataSource {
    name: String,
    entries: HashMap<String, Result<TickerData, FetchError>>,
    calls: AtomicUsize,
}

impl StaticDataSource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Serve `data` for `ticker`.
    pub fn with_ticker(mut self, ticker: &str, data: TickerData) -> Self {
        self.entries.insert(ticker.to_string(), Ok(data));
        self
    }

    /// Fail every fetch of `ticker` with `error`.
    pub fn with_failure(mut self, ticker: &str, error: FetchError) -> Self {
        self.entries.insert(ticker.to_string(), Err(error));
        self
    }

    /// Number of `fetch` calls served so far, hits and misses alike.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataSource for StaticDataSource {
    async fn fetch(&self, ticker: &str) -> Result<TickerData, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.entries.get(ticker) {
            Some(entry) => entry.clone(),
            None => Err(FetchError::NoData(ticker.to_string())),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
