use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use common::{Candle, CandleSupplier, Error, FundingSample, FundingSupplier, Result, Timeframe};

/// In-memory market-data supplier for simulation and tests.
///
/// Series are loaded up front (or pushed incrementally) and served back
/// through the supplier traits. No real exchange is ever contacted. Requests
/// for a series that was never loaded fail per-symbol, which exercises the
/// same exclusion path a live fetch failure would.
pub struct ReplayFeed {
    candles: RwLock<HashMap<(String, Timeframe), Vec<Candle>>>,
    funding: RwLock<HashMap<String, FundingSample>>,
}

impl ReplayFeed {
    pub fn new() -> Self {
        Self {
            candles: RwLock::new(HashMap::new()),
            funding: RwLock::new(HashMap::new()),
        }
    }

    /// Load (or replace) the series for one (symbol, timeframe).
    pub async fn load_candles(&self, symbol: &str, timeframe: Timeframe, series: Vec<Candle>) {
        debug!(symbol, %timeframe, bars = series.len(), "Replay series loaded");
        self.candles
            .write()
            .await
            .insert((symbol.to_string(), timeframe), series);
    }

    /// Append one bar to an already-loaded series.
    pub async fn push_candle(&self, symbol: &str, timeframe: Timeframe, candle: Candle) {
        self.candles
            .write()
            .await
            .entry((symbol.to_string(), timeframe))
            .or_default()
            .push(candle);
    }

    /// Set the latest funding sample for a symbol.
    pub async fn set_funding(&self, sample: FundingSample) {
        self.funding
            .write()
            .await
            .insert(sample.symbol.clone(), sample);
    }
}

impl Default for ReplayFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CandleSupplier for ReplayFeed {
    async fn candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let candles = self.candles.read().await;
        let series = candles
            .get(&(symbol.to_string(), timeframe))
            .ok_or_else(|| {
                Error::Supplier(format!("no replay series loaded for {symbol} {timeframe}"))
            })?;
        let start = series.len().saturating_sub(limit);
        Ok(series[start..].to_vec())
    }
}

#[async_trait]
impl FundingSupplier for ReplayFeed {
    async fn funding(&self, symbol: &str) -> Result<Option<FundingSample>> {
        Ok(self.funding.read().await.get(symbol).cloned())
    }
}

/// Deterministic synthetic series: geometric drift plus a sine wiggle, with a
/// repeating volume pattern. No RNG, so seeded runs are reproducible.
pub fn synthetic_series(
    bars: usize,
    timeframe: Timeframe,
    start_ms: i64,
    start_price: f64,
    drift_per_bar: f64,
) -> Vec<Candle> {
    let step = timeframe.duration_ms();
    (0..bars)
        .map(|i| {
            let base = start_price
                * (1.0 + drift_per_bar).powi(i as i32)
                * (1.0 + 0.002 * (i as f64 * 0.7).sin());
            let open = base;
            let close = base * (1.0 + drift_per_bar * 0.5);
            let high = open.max(close) * 1.002;
            let low = open.min(close) * 0.998;
            Candle {
                open_time: start_ms + i as i64 * step,
                open,
                high,
                low,
                close,
                volume: 100.0 + 40.0 * ((i % 7) as f64),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(open_time: i64, close: f64) -> Candle {
        Candle {
            open_time,
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
        }
    }

    #[tokio::test]
    async fn serves_tail_of_loaded_series() {
        let feed = ReplayFeed::new();
        let series: Vec<Candle> = (0..10).map(|i| bar(i * 60_000, i as f64)).collect();
        feed.load_candles("BTCUSDT", Timeframe::M15, series).await;

        let tail = feed.candles("BTCUSDT", Timeframe::M15, 3).await.unwrap();
        assert_eq!(tail.len(), 3);
        assert_eq!(tail[0].close, 7.0);
    }

    #[tokio::test]
    async fn limit_larger_than_series_returns_all() {
        let feed = ReplayFeed::new();
        feed.load_candles("BTCUSDT", Timeframe::M15, vec![bar(0, 1.0)])
            .await;
        let all = feed.candles("BTCUSDT", Timeframe::M15, 100).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn unknown_series_fails_per_symbol() {
        let feed = ReplayFeed::new();
        assert!(feed.candles("NOPEUSDT", Timeframe::M15, 10).await.is_err());
    }

    #[tokio::test]
    async fn missing_funding_is_none_not_error() {
        let feed = ReplayFeed::new();
        assert_eq!(feed.funding("BTCUSDT").await.unwrap(), None);

        feed.set_funding(FundingSample {
            symbol: "BTCUSDT".into(),
            rate: -0.0004,
            sampled_at: 0,
        })
        .await;
        assert!(feed.funding("BTCUSDT").await.unwrap().is_some());
    }

    #[test]
    fn synthetic_series_is_well_formed_and_deterministic() {
        let a = synthetic_series(100, Timeframe::M15, 0, 100.0, 0.001);
        let b = synthetic_series(100, Timeframe::M15, 0, 100.0, 0.001);
        assert_eq!(a, b);
        for pair in a.windows(2) {
            assert!(pair[0].open_time < pair[1].open_time);
        }
        for c in &a {
            assert!(c.high >= c.open.max(c.close));
            assert!(c.low <= c.open.min(c.close));
        }
    }
}
