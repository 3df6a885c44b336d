use async_trait::async_trait;

use crate::{Candle, FundingSample, Result, Timeframe};

/// Abstraction over the market-data source.
///
/// Live exchange adapters and the in-memory `ReplayFeed` both implement these
/// traits. The scan orchestrator in `crates/engine` is the only consumer; a
/// per-symbol failure from either trait excludes that symbol from the current
/// cycle and never aborts the batch.
#[async_trait]
pub trait CandleSupplier: Send + Sync {
    /// Fetch up to `limit` candles for one (symbol, timeframe), ascending by
    /// `open_time`. May return fewer than `limit` near history boundaries.
    async fn candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>>;
}

#[async_trait]
pub trait FundingSupplier: Send + Sync {
    /// Latest funding-rate sample for one symbol, or `None` when the
    /// instrument has no funding market.
    async fn funding(&self, symbol: &str) -> Result<Option<FundingSample>>;
}
