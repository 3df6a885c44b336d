use std::sync::Arc;

use common::{Candle, FundingSample, SignalStrength, Timeframe};
use engine::{ScanConfig, Scanner};
use replay::ReplayFeed;
use signal::FlagClassifier;

const M15: i64 = 15 * 60 * 1000;

/// Rising series: +1 per bar, constant range, volume spike on the final bar.
fn rising_series(bars: usize) -> Vec<Candle> {
    (0..bars)
        .map(|i| {
            let base = 100.0 + i as f64;
            Candle {
                open_time: i as i64 * M15,
                open: base,
                high: base + 1.4,
                low: base - 0.6,
                close: base + 0.8,
                volume: if i == bars - 1 { 25.0 } else { 10.0 },
            }
        })
        .collect()
}

fn falling_series(bars: usize) -> Vec<Candle> {
    (0..bars)
        .map(|i| {
            let base = 200.0 - i as f64;
            Candle {
                open_time: i as i64 * M15,
                open: base,
                high: base + 0.6,
                low: base - 1.4,
                close: base - 0.8,
                volume: if i == bars - 1 { 25.0 } else { 10.0 },
            }
        })
        .collect()
}

fn scan_config() -> ScanConfig {
    ScanConfig {
        symbols: vec![
            "AAAUSDT".to_string(),
            "BBBUSDT".to_string(),
            "FAILUSDT".to_string(),
        ],
        timeframe: Timeframe::M15,
        higher_timeframe: Timeframe::H4,
        candle_limit: 200,
        max_concurrency: 4,
        funding_stale_ms: 120_000,
        price_change_lookback: 24,
        top_candidates: 5,
        volume_lookback: 20,
    }
}

async fn seeded_feed(now_ms: i64) -> Arc<ReplayFeed> {
    let feed = Arc::new(ReplayFeed::new());
    feed.load_candles("AAAUSDT", Timeframe::M15, rising_series(60))
        .await;
    feed.load_candles("AAAUSDT", Timeframe::H4, rising_series(60))
        .await;
    feed.load_candles("BBBUSDT", Timeframe::M15, falling_series(60))
        .await;
    feed.load_candles("BBBUSDT", Timeframe::H4, falling_series(60))
        .await;
    // FAILUSDT is deliberately never loaded.

    // Shorts paying into a rising AAAUSDT: squeeze quadrant. Fresh sample.
    feed.set_funding(FundingSample {
        symbol: "AAAUSDT".into(),
        rate: -0.004,
        sampled_at: now_ms - 30_000,
    })
    .await;
    // Longs paying into a falling BBBUSDT: trap quadrant. Stale sample.
    feed.set_funding(FundingSample {
        symbol: "BBBUSDT".into(),
        rate: 0.004,
        sampled_at: now_ms - 600_000,
    })
    .await;
    feed
}

#[tokio::test]
async fn scan_cycle_end_to_end() {
    let now_ms = 60 * M15; // just past the last loaded bar
    let feed = seeded_feed(now_ms).await;
    let scanner = Scanner::new(
        feed.clone(),
        feed.clone(),
        FlagClassifier::default(),
        scan_config(),
    );

    let scan = scanner.scan_cycle(now_ms).await;

    // One symbol failed, the batch survived.
    assert_eq!(scan.evaluated, 2);
    assert_eq!(scan.failed, vec!["FAILUSDT".to_string()]);

    // Directional signals for both healthy symbols.
    let aaa = scan
        .signals
        .iter()
        .find(|s| s.symbol == "AAAUSDT")
        .expect("AAAUSDT should be flagged");
    assert_eq!(aaa.direction, common::Direction::Bullish);
    assert!(aaa.strength >= SignalStrength::Weak);

    let bbb = scan
        .signals
        .iter()
        .find(|s| s.symbol == "BBBUSDT")
        .expect("BBBUSDT should be flagged");
    assert_eq!(bbb.direction, common::Direction::Bearish);

    // Funding quadrants: one squeeze, one trap.
    assert_eq!(scan.breakdown.short_squeeze, 1);
    assert_eq!(scan.breakdown.long_trap, 1);
    assert_eq!(scan.squeeze_candidates.len(), 1);
    assert_eq!(scan.squeeze_candidates[0].symbol, "AAAUSDT");
    assert_eq!(scan.trap_candidates[0].symbol, "BBBUSDT");

    // Only the old BBBUSDT sample is flagged stale.
    assert_eq!(scan.stale_funding, vec!["BBBUSDT".to_string()]);

    // Categories present and folded into an outlook.
    assert!(!scan.categories.is_empty());
    assert!(scan.outlook.is_some());
}

#[tokio::test]
async fn scan_cycle_is_idempotent_on_unchanged_data() {
    let now_ms = 60 * M15;
    let feed = seeded_feed(now_ms).await;
    let scanner = Scanner::new(
        feed.clone(),
        feed.clone(),
        FlagClassifier::default(),
        scan_config(),
    );

    let first = scanner.scan_cycle(now_ms).await;
    let second = scanner.scan_cycle(now_ms).await;

    // Generations differ; everything derived from the data does not.
    assert_ne!(first.generation, second.generation);
    assert_eq!(first.signals, second.signals);
    assert_eq!(first.breakdown, second.breakdown);
    assert_eq!(first.categories, second.categories);
    assert_eq!(first.outlook, second.outlook);
}

#[tokio::test]
async fn scan_results_are_broadcast() {
    let now_ms = 60 * M15;
    let feed = seeded_feed(now_ms).await;
    let scanner = Scanner::new(
        feed.clone(),
        feed.clone(),
        FlagClassifier::default(),
        scan_config(),
    );

    let mut rx = scanner.subscribe();
    let scan = scanner.scan_cycle(now_ms).await;
    let received = rx.recv().await.unwrap();
    assert_eq!(received.generation, scan.generation);
    assert_eq!(received.signals, scan.signals);
}

#[tokio::test]
async fn backtest_flagged_replays_forward_data() {
    let now_ms = 60 * M15;
    let feed = seeded_feed(now_ms).await;
    let scanner = Scanner::new(
        feed.clone(),
        feed.clone(),
        FlagClassifier::default(),
        scan_config(),
    );

    let scan = scanner.scan_cycle(now_ms).await;
    // Entry 10 bars back; both trends continue, so 2% take-profits resolve
    // before the 2% stops.
    let summary = scanner.backtest_flagged(&scan, 10, 0.02, 0.02).await;
    assert_eq!(summary.wins, 2);
    assert_eq!(summary.losses, 0);
    assert!((summary.hit_rate_pct().unwrap() - 100.0).abs() < 1e-9);
}
