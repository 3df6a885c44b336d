use crate::Timeframe;

/// All configuration loaded from environment variables at startup.
/// Malformed values cause an immediate panic with a clear message.
#[derive(Debug, Clone)]
pub struct Config {
    /// Instrument universe to scan, e.g. "BTCUSDT,ETHUSDT".
    pub symbols: Vec<String>,
    /// Primary timeframe the classifier evaluates.
    pub timeframe: Timeframe,
    /// Higher timeframe used for trend confirmation.
    pub higher_timeframe: Timeframe,
    /// Candles requested per (symbol, timeframe) each cycle.
    pub candle_limit: usize,
    /// Seconds between scan cycles.
    pub scan_interval_secs: u64,
    /// Max symbols evaluated concurrently within one cycle.
    pub max_concurrency: usize,
    /// Funding samples older than this are flagged stale (advisory).
    pub funding_stale_ms: i64,
    /// Optional classifier parameter file (TOML).
    pub classifier_config_path: Option<String>,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present. Panics on any malformed value.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        let symbols: Vec<String> = optional_env("PULSE_SYMBOLS")
            .unwrap_or_else(|| "BTCUSDT,ETHUSDT,SOLUSDT".to_string())
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        if symbols.is_empty() {
            panic!("PULSE_SYMBOLS must contain at least one symbol");
        }

        Config {
            symbols,
            timeframe: parse_timeframe("PULSE_TIMEFRAME", Timeframe::M15),
            higher_timeframe: parse_timeframe("PULSE_HIGHER_TIMEFRAME", Timeframe::H4),
            candle_limit: optional_env("PULSE_CANDLE_LIMIT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(200),
            scan_interval_secs: optional_env("PULSE_SCAN_INTERVAL_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            max_concurrency: optional_env("PULSE_MAX_CONCURRENCY")
                .and_then(|v| v.parse().ok())
                .unwrap_or(8),
            funding_stale_ms: optional_env("PULSE_FUNDING_STALE_SECS")
                .and_then(|v| v.parse::<i64>().ok())
                .map(|s| s * 1000)
                .unwrap_or(120_000),
            classifier_config_path: optional_env("PULSE_CLASSIFIER_CONFIG"),
        }
    }
}

fn parse_timeframe(key: &str, default: Timeframe) -> Timeframe {
    match optional_env(key) {
        Some(v) => v
            .parse()
            .unwrap_or_else(|e| panic!("{key} is not a valid timeframe: {e}")),
        None => default,
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
