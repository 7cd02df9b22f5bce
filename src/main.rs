//! QUANTAMENTAL: hybrid fundamental + trend equity screener.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! screens the configured universe once and prints the ranking, then
//! optionally keeps serving the dashboard until Ctrl+C.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use quantamental::config::AppConfig;
use quantamental::dashboard::{self, DashboardState};
use quantamental::data::{CachedDataSource, DataSource, YahooDataSource};
use quantamental::engine::ScreeningEngine;
use quantamental::report;

const BANNER: &str = r#"
  ___  _   _   _   _  _ _____ _   __  __ ___ _  _ _____ _   _
 / _ \| | | | /_\ | \| |_   _/_\ |  \/  | __| \| |_   _/_\ | |
| (_) | |_| |/ _ \| .` | | |/ _ \| |\/| | _|| .` | | |/ _ \| |__
 \__\_\\___//_/ \_\_|\_| |_/_/ \_\_|  |_|___|_|\_| |_/_/ \_\____|

  Fundamentals decide what to buy, the trend decides when.
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = AppConfig::path_from_env();
    let cfg = AppConfig::load(&config_path)?;

    init_logging();

    println!("{BANNER}");
    info!(
        config = %config_path,
        tickers = cfg.screener.tickers.len(),
        thresholds = %cfg.thresholds,
        provider = %cfg.data_source.provider,
        "QUANTAMENTAL starting up"
    );

    // -- Initialise components -------------------------------------------

    let source = build_source(&cfg)?;
    let engine = ScreeningEngine::new(cfg.screener.max_concurrency);

    // -- Screen once -----------------------------------------------------

    let run = engine
        .run(&cfg.screener.tickers, &cfg.thresholds, source.as_ref())
        .await?;
    info!(run_id = %run.run_id, "{}", run.summary());

    println!("{}", report::render_table(&run));
    println!("{}", report::render_ideal(&run));

    if let Some(path) = &cfg.report.json_path {
        report::write_json(&run, Path::new(path))?;
        info!(path = %path, "JSON report written");
    }

    if !cfg.dashboard.enabled {
        return Ok(());
    }

    // -- Dashboard -------------------------------------------------------

    let state = Arc::new(DashboardState::new(
        source,
        engine,
        cfg.screener.tickers.clone(),
        cfg.thresholds,
    ));
    state.record_run(run).await;

    let server = dashboard::spawn_dashboard(state, cfg.dashboard.port);
    info!(port = cfg.dashboard.port, "Dashboard running. Press Ctrl+C to stop.");

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res.context("Failed to listen for shutdown signal")?;
            info!("Shutdown signal received.");
        }
        _ = server => {
            warn!("Dashboard server stopped.");
        }
    }

    info!("QUANTAMENTAL shut down cleanly.");
    Ok(())
}

/// Build the configured data source, wrapped in a TTL cache when enabled.
fn build_source(cfg: &AppConfig) -> Result<Arc<dyn DataSource>> {
    if cfg.data_source.provider != "yahoo" {
        warn!(
            provider = %cfg.data_source.provider,
            "Unknown data provider, defaulting to Yahoo Finance"
        );
    }

    let yahoo = YahooDataSource::new(
        cfg.screener.history_days,
        std::time::Duration::from_secs(cfg.data_source.timeout_secs),
    )
    .context("Failed to build Yahoo Finance client")?;

    let source: Arc<dyn DataSource> = match cfg.data_source.cache_ttl_mins {
        Some(mins) => {
            let ttl = cfg
                .cache_ttl()
                .with_context(|| format!("cache_ttl_mins out of range: {mins}"))?;
            info!(ttl_mins = mins, "Caching market data");
            Arc::new(CachedDataSource::new(yahoo, ttl))
        }
        None => Arc::new(yahoo),
    };
    Ok(source)
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("quantamental=info"));

    let json_logging = std::env::var("QUANTAMENTAL_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
