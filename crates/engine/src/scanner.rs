use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use backtest::{hit_rate, BacktestSummary, TradeSetup};
use common::{
    Candle, CandleSupplier, FlagSignal, FundingSupplier, OverallOutlook, SentimentCategory,
    SignalStrength, Timeframe,
};
use sentiment::{
    general_bias_category, overall_outlook, squeeze_candidates, trap_candidates,
    volume_category, FundingBreakdown, FundingObservation,
};
use signal::{detect_trend, session_window, FlagClassifier};

use crate::store::{CandleStore, SeriesKey};

/// Scan behavior knobs, usually derived from `common::Config`.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub symbols: Vec<String>,
    pub timeframe: Timeframe,
    pub higher_timeframe: Timeframe,
    pub candle_limit: usize,
    pub max_concurrency: usize,
    pub funding_stale_ms: i64,
    /// Bars used for the price-change percentage behind the funding quadrant.
    pub price_change_lookback: usize,
    /// Candidates kept in each squeeze/trap ranking.
    pub top_candidates: usize,
    /// Trailing candles averaged for the volume participation category.
    pub volume_lookback: usize,
}

impl ScanConfig {
    pub fn from_config(cfg: &common::Config) -> Self {
        Self {
            symbols: cfg.symbols.clone(),
            timeframe: cfg.timeframe,
            higher_timeframe: cfg.higher_timeframe,
            candle_limit: cfg.candle_limit,
            max_concurrency: cfg.max_concurrency.max(1),
            funding_stale_ms: cfg.funding_stale_ms,
            price_change_lookback: 24,
            top_candidates: 5,
            volume_lookback: 20,
        }
    }
}

/// Everything one scan cycle produced. Published on the scan broadcast and
/// consumed by presentation layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketScan {
    pub generation: u64,
    /// Symbols that contributed to this cycle's aggregates.
    pub evaluated: usize,
    /// Symbols excluded by a supplier failure. Never aborts the batch.
    pub failed: Vec<String>,
    pub signals: Vec<FlagSignal>,
    pub breakdown: FundingBreakdown,
    pub squeeze_candidates: Vec<FundingObservation>,
    pub trap_candidates: Vec<FundingObservation>,
    pub categories: Vec<SentimentCategory>,
    pub outlook: Option<OverallOutlook>,
    /// Symbols whose funding sample exceeded the staleness window (advisory).
    pub stale_funding: Vec<String>,
}

/// Per-symbol result gathered before aggregation.
struct SymbolReading {
    symbol: String,
    signal: Option<FlagSignal>,
    observation: Option<FundingObservation>,
    price_change_pct: Option<f64>,
    volume_elevated: Option<bool>,
    stale_funding: bool,
}

/// Orchestrates one evaluation cycle across the instrument universe.
///
/// Each instrument's series is fetched, merged into the store under this
/// cycle's generation, and classified independently; instruments are
/// embarrassingly parallel, so the cycle fans out with a bounded pool. All
/// computation below the suppliers is pure, which makes cycles idempotent:
/// re-running on unchanged data yields an identical `MarketScan`.
pub struct Scanner {
    candles: Arc<dyn CandleSupplier>,
    funding: Arc<dyn FundingSupplier>,
    store: Arc<CandleStore>,
    classifier: FlagClassifier,
    cfg: ScanConfig,
    scan_tx: broadcast::Sender<MarketScan>,
}

impl Scanner {
    pub fn new(
        candles: Arc<dyn CandleSupplier>,
        funding: Arc<dyn FundingSupplier>,
        classifier: FlagClassifier,
        cfg: ScanConfig,
    ) -> Self {
        let (scan_tx, _) = broadcast::channel(16);
        Self {
            candles,
            funding,
            store: Arc::new(CandleStore::new()),
            classifier,
            cfg,
            scan_tx,
        }
    }

    /// Subscribe to published scan results.
    pub fn subscribe(&self) -> broadcast::Receiver<MarketScan> {
        self.scan_tx.subscribe()
    }

    pub fn store(&self) -> Arc<CandleStore> {
        self.store.clone()
    }

    /// Run one full evaluation cycle and publish the result.
    pub async fn scan_cycle(&self, now_ms: i64) -> MarketScan {
        let generation = self.store.next_generation();

        let readings: Vec<Result<Option<SymbolReading>, String>> =
            stream::iter(self.cfg.symbols.clone())
                .map(|symbol| async move {
                    match self.evaluate_symbol(&symbol, generation, now_ms).await {
                        Ok(reading) => Ok(reading),
                        Err(e) => {
                            warn!(symbol = %symbol, error = %e, "Excluding symbol from cycle");
                            Err(symbol)
                        }
                    }
                })
                .buffer_unordered(self.cfg.max_concurrency)
                .collect()
                .await;

        let mut evaluated = Vec::new();
        let mut failed = Vec::new();
        for result in readings {
            match result {
                Ok(Some(reading)) => evaluated.push(reading),
                // Superseded by a newer cycle mid-flight; silently dropped.
                Ok(None) => {}
                Err(symbol) => failed.push(symbol),
            }
        }
        // Deterministic aggregate ordering regardless of completion order.
        evaluated.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        failed.sort();

        let scan = self.aggregate(generation, evaluated, failed);
        info!(
            generation = scan.generation,
            evaluated = scan.evaluated,
            failed = scan.failed.len(),
            signals = scan.signals.len(),
            outlook = scan.outlook.as_ref().map(|o| o.tone.as_str()).unwrap_or("n/a"),
            "Scan cycle complete"
        );
        let _ = self.scan_tx.send(scan.clone());
        scan
    }

    /// Periodic rescan loop. Stops when the shutdown flag flips.
    pub async fn run(self, interval: std::time::Duration, mut shutdown: watch::Receiver<bool>) {
        info!(symbols = self.cfg.symbols.len(), every = ?interval, "Scanner running");
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now_ms = chrono::Utc::now().timestamp_millis();
                    self.scan_cycle(now_ms).await;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("Scanner shutting down");
                        return;
                    }
                }
            }
        }
    }

    /// Replay history for every flagged instrument: enter at the close
    /// `forward_window` bars back and let the simulator race the thresholds
    /// over the bars that followed.
    pub async fn backtest_flagged(
        &self,
        scan: &MarketScan,
        forward_window: usize,
        take_profit_pct: f64,
        stop_loss_pct: f64,
    ) -> BacktestSummary {
        let mut series: Vec<(FlagSignal, Vec<Candle>)> = Vec::new();
        for sig in &scan.signals {
            let key = SeriesKey::new(sig.symbol.clone(), self.cfg.timeframe);
            if let Some(candles) = self.store.series(&key).await {
                if candles.len() > forward_window + 1 {
                    series.push((sig.clone(), candles));
                }
            }
        }

        let setups: Vec<TradeSetup<'_>> = series
            .iter()
            .map(|(sig, candles)| {
                let signal_index = candles.len() - forward_window - 1;
                TradeSetup {
                    candles,
                    direction: sig.direction,
                    entry: candles[signal_index].close,
                    take_profit_pct,
                    stop_loss_pct,
                    signal_index,
                }
            })
            .collect();

        hit_rate(&setups)
    }

    /// Fetch, store, and classify one symbol. `Ok(None)` means a newer cycle
    /// already superseded this one and the reading was discarded.
    async fn evaluate_symbol(
        &self,
        symbol: &str,
        generation: u64,
        now_ms: i64,
    ) -> common::Result<Option<SymbolReading>> {
        let primary = self
            .candles
            .candles(symbol, self.cfg.timeframe, self.cfg.candle_limit)
            .await?;
        let higher = self
            .candles
            .candles(symbol, self.cfg.higher_timeframe, self.cfg.candle_limit)
            .await?;
        let funding = self.funding.funding(symbol).await?;

        let key = SeriesKey::new(symbol, self.cfg.timeframe);
        if !self.store.apply_batch(key.clone(), generation, primary).await {
            return Ok(None);
        }
        let higher_key = SeriesKey::new(symbol, self.cfg.higher_timeframe);
        if !self
            .store
            .apply_batch(higher_key, generation, higher.clone())
            .await
        {
            return Ok(None);
        }

        // Read back through the store so live-merged bars are included.
        let candles = self.store.series(&key).await.unwrap_or_default();

        let window = session_window(self.cfg.timeframe, now_ms);
        let trend = detect_trend(&candles, &window);

        let higher_closes: Vec<f64> = higher.iter().map(|c| c.close).collect();
        let bias = self.classifier.higher_timeframe_bias(&higher_closes);

        let signal = self
            .classifier
            .evaluate(symbol, &candles, trend.as_ref(), bias);
        if let Some(sig) = &signal {
            debug!(
                symbol = %sig.symbol,
                direction = %sig.direction,
                strength = %sig.strength,
                "Classified"
            );
        }

        let price_change_pct = price_change_pct(&candles, self.cfg.price_change_lookback);
        let volume_elevated = volume_elevated(&candles, self.cfg.volume_lookback);

        let stale_funding = funding
            .as_ref()
            .map(|f| f.is_stale(now_ms, self.cfg.funding_stale_ms))
            .unwrap_or(false);
        let observation = match (funding, price_change_pct) {
            (Some(sample), Some(change)) => Some(FundingObservation {
                symbol: symbol.to_string(),
                price_change_pct: change,
                funding_rate: sample.rate,
                stale: stale_funding,
            }),
            _ => None,
        };

        Ok(Some(SymbolReading {
            symbol: symbol.to_string(),
            signal,
            observation,
            price_change_pct,
            volume_elevated,
            stale_funding,
        }))
    }

    fn aggregate(
        &self,
        generation: u64,
        readings: Vec<SymbolReading>,
        failed: Vec<String>,
    ) -> MarketScan {
        let signals: Vec<FlagSignal> = readings
            .iter()
            .filter_map(|r| r.signal.clone())
            .filter(|s| s.strength != SignalStrength::None)
            .collect();

        let observations: Vec<FundingObservation> = readings
            .iter()
            .filter_map(|r| r.observation.clone())
            .collect();
        let breakdown = FundingBreakdown::from_observations(&observations);

        let gainers = readings
            .iter()
            .filter(|r| r.price_change_pct.map(|p| p > 0.0).unwrap_or(false))
            .count();
        let losers = readings
            .iter()
            .filter(|r| r.price_change_pct.map(|p| p < 0.0).unwrap_or(false))
            .count();

        let volume_reports: Vec<bool> =
            readings.iter().filter_map(|r| r.volume_elevated).collect();

        let mut categories = Vec::new();
        categories.extend(general_bias_category(gainers, losers));
        categories.extend(breakdown.squeeze_category());
        categories.extend(breakdown.trap_category());
        categories.extend(volume_category(
            volume_reports.iter().filter(|&&v| v).count(),
            volume_reports.len(),
        ));
        let outlook = overall_outlook(&categories);

        let stale_funding = readings
            .iter()
            .filter(|r| r.stale_funding)
            .map(|r| r.symbol.clone())
            .collect();

        MarketScan {
            generation,
            evaluated: readings.len(),
            failed,
            signals,
            squeeze_candidates: squeeze_candidates(&observations, self.cfg.top_candidates),
            trap_candidates: trap_candidates(&observations, self.cfg.top_candidates),
            breakdown,
            categories,
            outlook,
            stale_funding,
        }
    }
}

/// Percent change of the close over the last `lookback` bars.
fn price_change_pct(candles: &[Candle], lookback: usize) -> Option<f64> {
    if candles.len() < lookback + 1 {
        return None;
    }
    let last = candles.last()?.close;
    let base = candles[candles.len() - 1 - lookback].close;
    if base == 0.0 {
        return None;
    }
    Some((last - base) / base * 100.0)
}

/// Latest volume above the trailing average of the `lookback` bars before it.
fn volume_elevated(candles: &[Candle], lookback: usize) -> Option<bool> {
    if candles.len() < lookback + 1 {
        return None;
    }
    let last = candles.last()?;
    let tail = &candles[candles.len() - 1 - lookback..candles.len() - 1];
    let avg = tail.iter().map(|c| c.volume).sum::<f64>() / lookback as f64;
    Some(last.volume > avg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(i: usize, close: f64, volume: f64) -> Candle {
        Candle {
            open_time: i as i64 * 60_000,
            open: close,
            high: close + 0.5,
            low: close - 0.5,
            close,
            volume,
        }
    }

    #[test]
    fn price_change_requires_lookback_history() {
        let candles: Vec<Candle> = (0..10).map(|i| bar(i, 100.0 + i as f64, 1.0)).collect();
        assert!(price_change_pct(&candles, 24).is_none());
        let change = price_change_pct(&candles, 9).unwrap();
        assert!((change - 9.0).abs() < 1e-9);
    }

    #[test]
    fn volume_elevated_compares_to_trailing_average() {
        let mut candles: Vec<Candle> = (0..20).map(|i| bar(i, 100.0, 10.0)).collect();
        candles.push(bar(20, 100.0, 30.0));
        assert_eq!(volume_elevated(&candles, 20), Some(true));

        let flat: Vec<Candle> = (0..21).map(|i| bar(i, 100.0, 10.0)).collect();
        assert_eq!(volume_elevated(&flat, 20), Some(false));
    }
}
