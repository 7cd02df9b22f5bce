//! End-to-end screening runs against the mock market.

use rust_decimal_macros::dec;
use std::time::Duration;

use quantamental::data::{CachedDataSource, FetchError};
use quantamental::engine::ScreeningEngine;
use quantamental::report;
use quantamental::types::{QuantSignal, StrategyStatus, Thresholds};

use crate::mock_source::{downtrend, flat, uptrend, MockMarket};

fn universe(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn thresholds(ma_period: usize) -> Thresholds {
    Thresholds {
        min_roe: dec!(0.15),
        max_pe: dec!(25),
        ma_period,
    }
}

/// A ten-name universe covering every status.
fn b3_market() -> MockMarket {
    MockMarket::new()
        .with_ticker("WEGE3.SA", &uptrend(), Some(dec!(0.31)), Some(dec!(24.5)))
        .with_ticker("ITUB4.SA", &uptrend(), Some(dec!(0.21)), Some(dec!(8.9)))
        .with_ticker("VALE3.SA", &downtrend(), Some(dec!(0.18)), Some(dec!(6.2)))
        .with_ticker("RDOR3.SA", &uptrend(), Some(dec!(0.11)), Some(dec!(30.0)))
        .with_ticker("ABEV3.SA", &downtrend(), Some(dec!(0.16)), Some(dec!(14.0)))
        .with_ticker("RENT3.SA", &downtrend(), Some(dec!(0.09)), Some(dec!(40.0)))
        .with_ticker("EGIE3.SA", &flat(250), None, Some(dec!(10.0)))
        .with_ticker("BBDC4.SA", &flat(50), Some(dec!(0.12)), Some(dec!(7.0)))
        .with_failure("HAPV3.SA", FetchError::Http("connection reset".into()))
        .with_failure("PETR4.SA", FetchError::Status { ticker: "PETR4.SA".into(), status: 404 })
}

const B3: &[&str] = &[
    "PETR4.SA", "VALE3.SA", "ITUB4.SA", "BBDC4.SA", "ABEV3.SA",
    "WEGE3.SA", "EGIE3.SA", "RDOR3.SA", "RENT3.SA", "HAPV3.SA",
];

#[tokio::test]
async fn test_full_universe_ranking() {
    let market = b3_market();
    let set = ScreeningEngine::default()
        .run(&universe(B3), &thresholds(200), &market)
        .await
        .unwrap();

    assert_eq!(set.len(), 10);
    let order: Vec<&str> = set.iter().map(|r| r.ticker.as_str()).collect();
    assert_eq!(
        order,
        vec![
            // score 2, universe order
            "ITUB4.SA", "WEGE3.SA",
            // score 1
            "VALE3.SA", "ABEV3.SA", "RDOR3.SA",
            // score 0, data errors included in universe order
            "PETR4.SA", "BBDC4.SA", "EGIE3.SA", "RENT3.SA", "HAPV3.SA",
        ]
    );

    let counts = set.count_by_status();
    assert_eq!(counts.ideal, 2);
    assert_eq!(counts.partial, 3);
    assert_eq!(counts.excluded, 3);
    assert_eq!(counts.data_error, 2);

    assert_eq!(set.get("EGIE3.SA").unwrap().quant_signal, Some(QuantSignal::Neutral));
    assert_eq!(
        set.get("BBDC4.SA").unwrap().quant_signal,
        Some(QuantSignal::InsufficientData)
    );
    assert_eq!(set.get("BBDC4.SA").unwrap().last_price, Some(dec!(20)));
}

#[tokio::test]
async fn test_every_row_is_consistent() {
    let set = ScreeningEngine::new(3)
        .run(&universe(B3), &thresholds(200), &b3_market())
        .await
        .unwrap();

    for r in set.iter() {
        if r.is_data_error() {
            assert_eq!(r.hybrid_score, 0);
            assert!(r.last_price.is_none() && r.roe.is_none() && r.pe_ratio.is_none());
            assert!(r.error.is_some());
            continue;
        }
        let expected = u8::from(r.passes_fundamental) + u8::from(r.passes_quant);
        assert_eq!(r.hybrid_score, expected, "{}", r.ticker);
        assert_eq!(r.status, StrategyStatus::from_score(expected), "{}", r.ticker);
        assert_eq!(r.passes_quant, r.quant_signal == Some(QuantSignal::Buy), "{}", r.ticker);
        assert!(r.error.is_none());
    }
}

#[tokio::test]
async fn test_scenarios() {
    let market = MockMarket::new()
        .with_ticker("A", &flat(5), Some(dec!(0.20)), Some(dec!(18)))
        .with_ticker("BC", &[dec!(8), dec!(9), dec!(10), dec!(11), dec!(12)], Some(dec!(0.20)), Some(dec!(18)))
        .with_ticker("D", &[dec!(8), dec!(9), dec!(10), dec!(11), dec!(12)], None, Some(dec!(18)))
        .with_failure("E", FetchError::Other("boom".into()));

    let set = ScreeningEngine::default()
        .run(&universe(&["A", "BC", "D", "E"]), &thresholds(5), &market)
        .await
        .unwrap();

    let a = set.get("A").unwrap();
    assert_eq!(a.quant_signal, Some(QuantSignal::Neutral));
    assert!(!a.passes_quant);

    let bc = set.get("BC").unwrap();
    assert_eq!(bc.quant_signal, Some(QuantSignal::Buy));
    assert!(bc.passes_fundamental);
    assert_eq!(bc.status, StrategyStatus::Ideal);
    assert_eq!(bc.hybrid_score, 2);

    let d = set.get("D").unwrap();
    assert!(!d.passes_fundamental);
    assert_eq!(d.status, StrategyStatus::Partial);

    let e = set.get("E").unwrap();
    assert_eq!(e.status, StrategyStatus::DataError);
    assert_ne!(e.hybrid_score, 2);
    assert!(e.last_price.is_none() && e.roe.is_none() && e.pe_ratio.is_none());

    assert_eq!(set.results[0].ticker, "BC");
}

#[tokio::test]
async fn test_completion_order_does_not_leak_into_ranking() {
    // All three tie on score; the slow first ticker must stay first.
    let market = MockMarket::new()
        .with_ticker("SLOW", &uptrend(), Some(dec!(0.05)), Some(dec!(10)))
        .with_ticker("FAST1", &uptrend(), Some(dec!(0.05)), Some(dec!(10)))
        .with_ticker("FAST2", &uptrend(), Some(dec!(0.05)), Some(dec!(10)))
        .with_delay("SLOW", Duration::from_millis(80));

    let set = ScreeningEngine::new(3)
        .run(&universe(&["SLOW", "FAST1", "FAST2"]), &thresholds(200), &market)
        .await
        .unwrap();

    let order: Vec<&str> = set.iter().map(|r| r.ticker.as_str()).collect();
    assert_eq!(order, vec!["SLOW", "FAST1", "FAST2"]);
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    let delay = Duration::from_millis(20);
    let mut market = MockMarket::new();
    let names = ["T1", "T2", "T3", "T4", "T5", "T6"];
    for name in names {
        market = market
            .with_ticker(name, &flat(10), Some(dec!(0.2)), Some(dec!(10)))
            .with_delay(name, delay);
    }

    let set = ScreeningEngine::new(2)
        .run(&universe(&names), &thresholds(5), &market)
        .await
        .unwrap();

    assert_eq!(set.len(), 6);
    assert_eq!(market.calls().len(), 6);
    assert_eq!(market.peak_in_flight(), 2);
}

#[tokio::test]
async fn test_thresholds_apply_per_run() {
    let market = b3_market();
    let engine = ScreeningEngine::default();
    let tickers = universe(B3);

    let strict = engine.run(&tickers, &thresholds(200), &market).await.unwrap();
    let loose = engine
        .run(
            &tickers,
            &Thresholds { min_roe: dec!(0.10), max_pe: dec!(35), ma_period: 200 },
            &market,
        )
        .await
        .unwrap();

    assert_eq!(strict.get("RDOR3.SA").unwrap().status, StrategyStatus::Partial);
    assert_eq!(loose.get("RDOR3.SA").unwrap().status, StrategyStatus::Ideal);
    assert_eq!(strict.thresholds.max_pe, dec!(25));
    assert_ne!(strict.run_id, loose.run_id);
}

#[tokio::test]
async fn test_invalid_thresholds_fetch_nothing() {
    let market = b3_market();
    let result = ScreeningEngine::default()
        .run(
            &universe(B3),
            &Thresholds { max_pe: dec!(0), ..thresholds(200) },
            &market,
        )
        .await;

    assert!(result.is_err());
    assert!(market.calls().is_empty());
}

#[tokio::test]
async fn test_cached_source_reuses_fetches() {
    let cached = CachedDataSource::new(b3_market(), chrono::Duration::minutes(10));
    let engine = ScreeningEngine::default();
    let tickers = universe(B3);

    let first = engine.run(&tickers, &thresholds(200), &cached).await.unwrap();
    let second = engine.run(&tickers, &thresholds(50), &cached).await.unwrap();

    // Eight successes were cached; the two failures are fetched again.
    assert_eq!(cached.inner().calls().len(), 12);
    assert_eq!(cached.len().await, 8);
    assert_eq!(first.len(), second.len());
    assert_eq!(second.count_by_status().data_error, 2);
}

#[tokio::test]
async fn test_report_from_run() {
    let set = ScreeningEngine::default()
        .run(&universe(B3), &thresholds(200), &b3_market())
        .await
        .unwrap();

    let table = report::render_table(&set);
    assert_eq!(table.lines().count(), 12);
    assert!(table.contains("MA(200) signal"));
    assert!(table.contains("Connection/data error"));

    let ideal = report::render_ideal(&set);
    assert!(ideal.contains("ITUB4.SA"));
    assert!(ideal.contains("WEGE3.SA"));
    assert!(!ideal.contains("VALE3.SA"));
}
