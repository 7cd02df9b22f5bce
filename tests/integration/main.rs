//! Integration tests for the screener, driven through the public API
//! with an in-memory market data source.

mod dashboard;
mod mock_source;
mod screening;
