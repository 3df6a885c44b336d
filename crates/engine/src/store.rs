use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tracing::debug;

use common::{Candle, Timeframe};

/// Identifies one candle series.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesKey {
    pub symbol: String,
    pub timeframe: Timeframe,
}

impl SeriesKey {
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
        }
    }
}

/// How a live bar update was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveUpdate {
    /// Strictly newer timestamp: appended to the series.
    Appended,
    /// Timestamp already present in the series: overwrote that bar in place.
    Replaced,
    /// Older than the tail and not present: dropped.
    Discarded,
}

struct Slot {
    candles: Vec<Candle>,
    generation: u64,
}

/// Owned per-instrument candle series with generation-tagged refresh cycles.
///
/// All writes go through `&self` methods that take the write lock, which makes
/// every key single-writer by construction. Each refresh cycle draws a fresh
/// generation from `next_generation`; a batch tagged with a generation at or
/// below the one already stored lost the race to a newer refresh and is
/// dropped before it can clobber newer data.
pub struct CandleStore {
    slots: RwLock<HashMap<SeriesKey, Slot>>,
    generation: AtomicU64,
}

impl CandleStore {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Monotonically increasing cycle tag.
    pub fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Replace a series with a freshly fetched batch. Returns `false` when the
    /// batch's generation is stale and was discarded.
    pub async fn apply_batch(
        &self,
        key: SeriesKey,
        generation: u64,
        candles: Vec<Candle>,
    ) -> bool {
        let mut slots = self.slots.write().await;
        if let Some(slot) = slots.get(&key) {
            if generation <= slot.generation {
                debug!(
                    symbol = %key.symbol,
                    timeframe = %key.timeframe,
                    stale = generation,
                    current = slot.generation,
                    "Dropping superseded candle batch"
                );
                return false;
            }
        }
        slots.insert(key, Slot { candles, generation });
        true
    }

    /// Merge one streaming bar into a series: a newer `open_time` appends,
    /// an `open_time` already in the series overwrites that bar (exchanges
    /// re-send in-progress and revised bars), anything else is discarded.
    /// A bar for an unknown series starts that series.
    pub async fn apply_live(&self, key: SeriesKey, candle: Candle) -> LiveUpdate {
        let mut slots = self.slots.write().await;
        let slot = slots.entry(key).or_insert_with(|| Slot {
            candles: Vec::new(),
            generation: 0,
        });

        match slot.candles.last() {
            None => {
                slot.candles.push(candle);
                LiveUpdate::Appended
            }
            Some(last) if candle.open_time > last.open_time => {
                slot.candles.push(candle);
                LiveUpdate::Appended
            }
            // Batches arrive sorted by open_time, so the series is ordered.
            Some(_) => match slot
                .candles
                .binary_search_by_key(&candle.open_time, |c| c.open_time)
            {
                Ok(i) => {
                    slot.candles[i] = candle;
                    LiveUpdate::Replaced
                }
                Err(_) => LiveUpdate::Discarded,
            },
        }
    }

    /// Snapshot of one series, or `None` for an unknown key.
    pub async fn series(&self, key: &SeriesKey) -> Option<Vec<Candle>> {
        self.slots.read().await.get(key).map(|s| s.candles.clone())
    }

    /// Generation of the last applied batch for one key.
    pub async fn generation(&self, key: &SeriesKey) -> Option<u64> {
        self.slots.read().await.get(key).map(|s| s.generation)
    }
}

impl Default for CandleStore {
    fn default() -> Self {
        Self::new()
    }
}
