//! Market data sources.
//!
//! Defines the `DataSource` trait the screening engine pulls from, the
//! typed `FetchError` it returns, and the available implementations:
//! Yahoo Finance over HTTP, a static in-memory source, and a TTL cache
//! decorator that wraps any other source.

pub mod cache;
pub mod memory;
pub mod yahoo;

use async_trait::async_trait;

use crate::types::TickerData;

pub use cache::CachedDataSource;
pub use memory::StaticDataSource;
pub use yahoo::YahooDataSource;

/// Why a ticker's data could not be retrieved.
///
/// The engine does not branch on the variant; any error turns the ticker
/// into a `DataError` row. Variants exist for logging and for sources
/// that want to retry selectively.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Provider returned status {status} for {ticker}")]
    Status { ticker: String, status: u16 },

    #[error("Failed to parse provider response: {0}")]
    Parse(String),

    #[error("No data for ticker: {0}")]
    NoData(String),

    #[error("Data source error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Http(e.to_string())
    }
}

/// Abstraction over market/fundamental data providers.
///
/// One call returns the full price history and fundamental snapshot for
/// a single ticker. Retry and timeout policy belong to the implementor.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch price history and fundamentals for `ticker`.
    async fn fetch(&self, ticker: &str) -> Result<TickerData, FetchError>;

    /// Source name for logging and identification.
    fn name(&self) -> &str;
}
