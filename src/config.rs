//! Configuration loading from TOML.
//!
//! Reads `config.toml` (or the file named by `QUANTAMENTAL_CONFIG`) and
//! deserializes into strongly-typed structs. Every section and field has
//! a default, so a partial file only overrides what it names.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;

use crate::data::yahoo::DEFAULT_HISTORY_DAYS;
use crate::engine::DEFAULT_MAX_CONCURRENCY;
use crate::types::Thresholds;

/// Default config file path.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Environment variable overriding the config path.
pub const CONFIG_PATH_ENV: &str = "QUANTAMENTAL_CONFIG";

/// Default universe: liquid B3 names.
pub const DEFAULT_TICKERS: &[&str] = &[
    "PETR4.SA", "VALE3.SA", "ITUB4.SA", "BBDC4.SA", "ABEV3.SA",
    "WEGE3.SA", "EGIE3.SA", "RDOR3.SA", "RENT3.SA", "HAPV3.SA",
];

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub screener: ScreenerConfig,
    pub thresholds: Thresholds,
    pub data_source: DataSourceConfig,
    pub dashboard: DashboardConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScreenerConfig {
    /// The universe, in reporting order.
    pub tickers: Vec<String>,
    /// Days of price history requested per ticker.
    pub history_days: u32,
    /// Tickers fetched concurrently.
    pub max_concurrency: usize,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            tickers: DEFAULT_TICKERS.iter().map(|s| s.to_string()).collect(),
            history_days: DEFAULT_HISTORY_DAYS,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DataSourceConfig {
    /// "yahoo" is the only live provider.
    pub provider: String,
    pub timeout_secs: u64,
    /// Cache successful fetches for this long; absent disables caching.
    pub cache_ttl_mins: Option<i64>,
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            provider: "yahoo".to_string(),
            timeout_secs: 15,
            cache_ttl_mins: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 8080,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ReportConfig {
    /// Write the ranked results as JSON here after each CLI run.
    pub json_path: Option<String>,
}

impl AppConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config = Self::from_toml(&contents)
            .with_context(|| format!("Invalid config file: {path}"))?;
        Ok(config)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Config path from `QUANTAMENTAL_CONFIG`, falling back to `config.toml`.
    pub fn path_from_env() -> String {
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
    }

    /// Cache lifetime, if caching is enabled and the value is representable.
    pub fn cache_ttl(&self) -> Option<chrono::Duration> {
        self.data_source
            .cache_ttl_mins
            .and_then(chrono::Duration::try_minutes)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.screener.tickers.is_empty() {
            bail!("screener.tickers must not be empty");
        }
        if self.screener.tickers.iter().any(|t| t.trim().is_empty()) {
            bail!("screener.tickers contains a blank entry");
        }
        if self.screener.history_days == 0 {
            bail!("screener.history_days must be >= 1");
        }
        if self.screener.max_concurrency == 0 {
            bail!("screener.max_concurrency must be >= 1");
        }
        if self.data_source.timeout_secs == 0 {
            bail!("data_source.timeout_secs must be >= 1");
        }
        if let Some(mins) = self.data_source.cache_ttl_mins {
            if mins <= 0 {
                bail!("data_source.cache_ttl_mins must be positive when set");
            }
            if self.cache_ttl().is_none() {
                bail!("data_source.cache_ttl_mins is out of range: {mins}");
            }
        }
        self.thresholds.validate()?;
        Ok(())
    }
}
