use serde::{Deserialize, Serialize};

/// One OHLCV observation for a fixed time interval.
///
/// A candle series for one (symbol, timeframe) is owned by the caller and is
/// ascending by `open_time` with no duplicate timestamps. The engine only
/// reads it and returns derived values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Open time in milliseconds since the Unix epoch.
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Absolute size of the candle body.
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Full high-to-low range. Zero for a flat candle.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// True when the candle closed above its open.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// True when the candle closed below its open.
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// Supported chart timeframes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
}

impl Timeframe {
    /// Duration of one bar in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        match self {
            Timeframe::M5 => 5 * 60_000,
            Timeframe::M15 => 15 * 60_000,
            Timeframe::H1 => 60 * 60_000,
            Timeframe::H4 => 4 * 60 * 60_000,
            Timeframe::D1 => 24 * 60 * 60_000,
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Timeframe::M5 => write!(f, "5m"),
            Timeframe::M15 => write!(f, "15m"),
            Timeframe::H1 => write!(f, "1h"),
            Timeframe::H4 => write!(f, "4h"),
            Timeframe::D1 => write!(f, "1d"),
        }
    }
}

impl std::str::FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "5m" => Ok(Timeframe::M5),
            "15m" => Ok(Timeframe::M15),
            "1h" => Ok(Timeframe::H1),
            "4h" => Ok(Timeframe::H4),
            "1d" => Ok(Timeframe::D1),
            other => Err(format!("unknown timeframe '{other}'")),
        }
    }
}

/// Direction of a trading signal or breakout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Bullish,
    Bearish,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Bullish => write!(f, "bullish"),
            Direction::Bearish => write!(f, "bearish"),
        }
    }
}

/// Graded strength of a flag signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SignalStrength {
    None,
    Weak,
    Medium,
    Strong,
}

impl std::fmt::Display for SignalStrength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalStrength::None => write!(f, "none"),
            SignalStrength::Weak => write!(f, "weak"),
            SignalStrength::Medium => write!(f, "medium"),
            SignalStrength::Strong => write!(f, "strong"),
        }
    }
}

/// Per-instrument classification emitted each evaluation cycle.
/// Cycles are independent and idempotent given the same inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagSignal {
    pub symbol: String,
    pub direction: Direction,
    pub strength: SignalStrength,
}

/// A funding-rate observation for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingSample {
    pub symbol: String,
    /// Funding rate as a fraction (e.g. -0.0004 = shorts pay 4 bps).
    pub rate: f64,
    /// Sample time in milliseconds since the Unix epoch.
    pub sampled_at: i64,
}

impl FundingSample {
    /// Advisory staleness check. Stale samples still classify; callers may
    /// surface the flag as metadata.
    pub fn is_stale(&self, now_ms: i64, window_ms: i64) -> bool {
        now_ms - self.sampled_at > window_ms
    }
}

/// One scored sentiment dimension (funding imbalance, volume, momentum, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentCategory {
    /// Short label, e.g. "Strong Short Squeeze".
    pub rating: String,
    /// Human-readable interpretation shown alongside the rating.
    pub interpretation: String,
    /// Score in [0, 10]; 5 is neutral.
    pub score: f64,
}

/// Composite market outlook derived from all present categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallOutlook {
    pub score: f64,
    pub tone: String,
    pub strategy_suggestion: String,
}

/// Terminal result of one simulated trade. Produced once, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BacktestOutcome {
    TakeProfitHit,
    StopLossHit,
    NoResult,
}

impl std::fmt::Display for BacktestOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BacktestOutcome::TakeProfitHit => write!(f, "take-profit"),
            BacktestOutcome::StopLossHit => write!(f, "stop-loss"),
            BacktestOutcome::NoResult => write!(f, "no-result"),
        }
    }
}
