//! Moving-average trend signal.
//!
//! Classifies the latest close against the simple moving average of the
//! trailing `period` closes. The tie test compares `last * period` with the
//! trailing sum, so equality is exact at the precision of the stored prices.

use rust_decimal::Decimal;
use std::cmp::Ordering;

use crate::types::{PriceSeries, QuantSignal};

/// Output of the indicator for one series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendReading {
    pub signal: QuantSignal,
    /// Latest close, present whenever the series is non-empty.
    pub last_price: Option<Decimal>,
    /// SMA over the trailing window, absent with insufficient history.
    pub moving_average: Option<Decimal>,
}

/// Simple moving average of the trailing `period` closes.
///
/// Returns `None` when `period` is zero or the series is shorter than it.
pub fn simple_moving_average(series: &PriceSeries, period: usize) -> Option<Decimal> {
    if period == 0 {
        return None;
    }
    let window = series.trailing(period)?;
    let sum: Decimal = window.iter().map(|p| p.close).sum();
    Some(sum / Decimal::from(period))
}

/// Compute the trend signal and latest price for `series`.
pub fn compute_signal(series: &PriceSeries, period: usize) -> TrendReading {
    let last_price = series.last_close();

    let window = match (period, series.trailing(period)) {
        (0, _) | (_, None) => {
            return TrendReading {
                signal: QuantSignal::InsufficientData,
                last_price,
                moving_average: None,
            }
        }
        (_, Some(w)) => w,
    };

    // A non-empty window always has a last element.
    let last = window[window.len() - 1].close;
    let period_dec = Decimal::from(period);
    let sum: Decimal = window.iter().map(|p| p.close).sum();

    let signal = match (last * period_dec).cmp(&sum) {
        Ordering::Greater => QuantSignal::Buy,
        Ordering::Less => QuantSignal::Sell,
        Ordering::Equal => QuantSignal::Neutral,
    };

    TrendReading {
        signal,
        last_price: Some(last),
        moving_average: Some(sum / period_dec),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
