use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use common::{Config, FundingSample};
use engine::{ScanConfig, Scanner};
use replay::{synthetic_series, ReplayFeed};
use signal::{ClassifierConfig, ClassifierFileConfig, FlagClassifier};

#[tokio::main]
async fn main() {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    info!(symbols = ?cfg.symbols, timeframe = %cfg.timeframe, "PulseBot starting");

    let classifier_cfg = match &cfg.classifier_config_path {
        Some(path) => match ClassifierFileConfig::load(path) {
            Ok(file) => file.classifier,
            Err(e) => {
                warn!(path = %path, error = %e, "Falling back to default classifier config");
                ClassifierConfig::default()
            }
        },
        None => ClassifierConfig::default(),
    };

    // ── Replay feed ───────────────────────────────────────────────────────────
    // PulseBot ships with a deterministic simulated feed; a live exchange
    // adapter plugs in through the same supplier traits.
    let now_ms = chrono::Utc::now().timestamp_millis();
    let feed = Arc::new(ReplayFeed::new());
    for (i, symbol) in cfg.symbols.iter().enumerate() {
        // Alternate up- and down-trending universes so every scan has both
        // squeeze and trap material.
        let drift = if i % 2 == 0 { 0.004 } else { -0.004 };
        let start = now_ms - cfg.candle_limit as i64 * cfg.timeframe.duration_ms();
        feed.load_candles(
            symbol,
            cfg.timeframe,
            synthetic_series(cfg.candle_limit, cfg.timeframe, start, 100.0, drift),
        )
        .await;
        let higher_start =
            now_ms - cfg.candle_limit as i64 * cfg.higher_timeframe.duration_ms();
        feed.load_candles(
            symbol,
            cfg.higher_timeframe,
            synthetic_series(cfg.candle_limit, cfg.higher_timeframe, higher_start, 100.0, drift),
        )
        .await;
        feed.set_funding(FundingSample {
            symbol: symbol.clone(),
            rate: if i % 2 == 0 { -0.0004 } else { 0.0004 },
            sampled_at: now_ms,
        })
        .await;
    }

    // ── Scanner ───────────────────────────────────────────────────────────────
    let scanner = Scanner::new(
        feed.clone(),
        feed.clone(),
        FlagClassifier::new(classifier_cfg),
        ScanConfig::from_config(&cfg),
    );
    let mut scans = scanner.subscribe();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(scanner.run(Duration::from_secs(cfg.scan_interval_secs), shutdown_rx));

    // ── Scan consumer ─────────────────────────────────────────────────────────
    tokio::spawn(async move {
        while let Ok(scan) = scans.recv().await {
            if let Some(outlook) = &scan.outlook {
                info!(
                    score = format!("{:.1}", outlook.score),
                    tone = %outlook.tone,
                    strategy = %outlook.strategy_suggestion,
                    "Market outlook"
                );
            }
            for sig in &scan.signals {
                info!(symbol = %sig.symbol, direction = %sig.direction, strength = %sig.strength, "Flag");
            }
            for candidate in &scan.squeeze_candidates {
                info!(
                    symbol = %candidate.symbol,
                    funding = candidate.funding_rate,
                    change_pct = format!("{:.2}", candidate.price_change_pct),
                    "Squeeze candidate"
                );
            }
        }
    });

    info!("Scanner started. Waiting for shutdown signal.");
    tokio::signal::ctrl_c().await.expect("ctrl-c handler");
    let _ = shutdown_tx.send(true);
    info!("Shutdown signal received. Exiting.");
}
