//! Trend signal, fundamental filter, and their hybrid.

pub mod fundamental;
pub mod hybrid;
pub mod trend;

pub use fundamental::passes_fundamental;
pub use hybrid::{data_error_result, HybridEvaluator};
pub use trend::{compute_signal, simple_moving_average, TrendReading};
