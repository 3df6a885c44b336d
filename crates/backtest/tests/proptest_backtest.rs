use proptest::prelude::*;

use backtest::{simulate, TradeSetup};
use common::{BacktestOutcome, Candle, Direction};

fn arbitrary_candles() -> impl Strategy<Value = Vec<Candle>> {
    prop::collection::vec((50.0f64..150.0, 0.0f64..5.0), 0..60).prop_map(|bars| {
        bars
            .into_iter()
            .enumerate()
            .map(|(i, (mid, spread))| Candle {
                open_time: i as i64 * 60_000,
                open: mid,
                high: mid + spread,
                low: mid - spread,
                close: mid,
                volume: 1.0,
            })
            .collect()
    })
}

proptest! {
    /// The simulator never panics, is deterministic, and ignores everything
    /// at or before the signal candle.
    #[test]
    fn simulate_is_total_and_deterministic(
        candles in arbitrary_candles(),
        entry in 50.0f64..150.0,
        tp in 0.001f64..0.2,
        sl in 0.001f64..0.2,
        signal_index in 0usize..80,
        bearish in any::<bool>(),
    ) {
        let direction = if bearish { Direction::Bearish } else { Direction::Bullish };
        let setup = TradeSetup {
            candles: &candles,
            direction,
            entry,
            take_profit_pct: tp,
            stop_loss_pct: sl,
            signal_index,
        };
        let first = simulate(&setup);
        prop_assert_eq!(first, simulate(&setup));

        if signal_index + 1 >= candles.len() {
            prop_assert_eq!(first, BacktestOutcome::NoResult);
        }
    }
}
