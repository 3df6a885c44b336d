use serde::{Deserialize, Serialize};

/// Top-level classifier parameter file (TOML).
///
/// Example `config/classifier.toml`:
/// ```toml
/// [classifier]
/// ema_periods = [5, 10, 20, 50]
/// rsi_period = 14
/// trend_period = 14
/// adx_strong = 25.0
/// adx_medium_low = 20.0
/// atr_floor_pct = 0.002
/// volume_lookback = 20
/// macd_fast = 12
/// macd_slow = 26
/// macd_signal = 9
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassifierFileConfig {
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

/// Tunable thresholds for the flag classifier. The same parameter set drives
/// every instrument; per-call-site variation is configuration, not code.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// EMA ladder checked for alignment, shortest first.
    pub ema_periods: [usize; 4],
    pub rsi_period: usize,
    /// Shared Wilder period for ADX and ATR.
    pub trend_period: usize,
    /// ADX above this confirms a strong trend.
    pub adx_strong: f64,
    /// Lower bound of the medium ADX band (the upper bound is `adx_strong`).
    pub adx_medium_low: f64,
    /// Volatility floor for strong signals, as a fraction of the last close.
    pub atr_floor_pct: f64,
    /// Trailing candles averaged for volume confirmation.
    pub volume_lookback: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            ema_periods: [5, 10, 20, 50],
            rsi_period: 14,
            trend_period: 14,
            adx_strong: 25.0,
            adx_medium_low: 20.0,
            atr_floor_pct: 0.002,
            volume_lookback: 20,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
        }
    }
}

impl ClassifierFileConfig {
    /// Load from a TOML file.
    pub fn load(path: &str) -> common::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| common::Error::Config(format!("failed to parse '{path}': {e}")))
    }
}
