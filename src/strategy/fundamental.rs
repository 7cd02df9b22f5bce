//! Fundamental filter.
//!
//! Minimum return on equity and maximum trailing P/E. A missing field
//! fails the filter; absence is never read as a pass.

use crate::types::{FundamentalSnapshot, Thresholds};

/// Whether `snapshot` clears both fundamental thresholds.
pub fn passes_fundamental(snapshot: &FundamentalSnapshot, thresholds: &Thresholds) -> bool {
    match (snapshot.roe, snapshot.pe_ratio) {
        (Some(roe), Some(pe)) => roe >= thresholds.min_roe && pe <= thresholds.max_pe,
        _ => false,
    }
}
