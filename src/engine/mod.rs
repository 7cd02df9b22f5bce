//! Core engine: fetch, evaluate and rank over the ticker universe.

pub mod screener;

pub use screener::{rank, ScreeningEngine, DEFAULT_MAX_CONCURRENCY};
