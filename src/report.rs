//! Report rendering for a screening run.
//!
//! Produces the plain-text ranking table printed by the binary, the
//! headline for the Ideal subset, and a pretty JSON export.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::path::Path;

use crate::types::{EvaluationResult, RankedResultSet};

const NOT_AVAILABLE: &str = "N/A";
const ERROR_CELL: &str = "Error";

// ---------------------------------------------------------------------------
// Text table
// ---------------------------------------------------------------------------

/// Fixed-width ranking table, one row per ticker in rank order.
///
/// The hybrid score only drives the ordering and is not printed.
pub fn render_table(set: &RankedResultSet) -> String {
    let signal_header = format!("MA({}) signal", set.thresholds.ma_period);
    let mut out = String::new();

    out.push_str(&format!(
        "{:<10} {:>10} {:>8} {:>8} {:<6} {:<21} {:<7} {}\n",
        "Ticker", "Price", "ROE %", "P/E", "Fund.", signal_header, "Quant.", "Status"
    ));
    out.push_str(&"-".repeat(100));
    out.push('\n');

    for r in set.iter() {
        out.push_str(&render_row(r));
        out.push('\n');
    }
    out
}

fn render_row(r: &EvaluationResult) -> String {
    if r.is_data_error() {
        return format!(
            "{:<10} {:>10} {:>8} {:>8} {:<6} {:<21} {:<7} {}",
            r.ticker, ERROR_CELL, ERROR_CELL, ERROR_CELL, "-", ERROR_CELL, "-", r.status
        );
    }

    let signal = r
        .quant_signal
        .map(|s| s.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    format!(
        "{:<10} {:>10} {:>8} {:>8} {:<6} {:<21} {:<7} {}",
        r.ticker,
        fmt_decimal(r.last_price),
        fmt_decimal(r.roe.map(|roe| roe * dec!(100))),
        fmt_decimal(r.pe_ratio),
        yes_no(r.passes_fundamental),
        signal,
        yes_no(r.passes_quant),
        r.status,
    )
}

fn fmt_decimal(value: Option<Decimal>) -> String {
    match value {
        Some(v) => format!("{:.2}", v.round_dp(2)),
        None => NOT_AVAILABLE.to_string(),
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

// ---------------------------------------------------------------------------
// Ideal headline
// ---------------------------------------------------------------------------

/// Headline naming the tickers that passed both filters.
pub fn render_ideal(set: &RankedResultSet) -> String {
    let ideal = set.ideal();
    if ideal.is_empty() {
        return format!(
            "No ticker passed every criterion ({}).",
            set.thresholds
        );
    }

    let mut out = format!(
        "{} ticker(s) aligned on fundamentals and trend ({}):\n",
        ideal.len(),
        set.thresholds
    );
    for r in ideal {
        out.push_str(&format!(
            "  * {} @ {} (ROE {}%, P/E {})\n",
            r.ticker,
            fmt_decimal(r.last_price),
            fmt_decimal(r.roe.map(|roe| roe * dec!(100))),
            fmt_decimal(r.pe_ratio),
        ));
    }
    out
}

// ---------------------------------------------------------------------------
// JSON export
// ---------------------------------------------------------------------------

pub fn to_json(set: &RankedResultSet) -> Result<String> {
    serde_json::to_string_pretty(set).context("Failed to serialize screening results")
}

/// Write the JSON export, creating parent directories as needed.
pub fn write_json(set: &RankedResultSet, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create report directory: {}", parent.display()))?;
    }
    let json = to_json(set)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report file: {}", path.display()))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
