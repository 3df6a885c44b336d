use serde::{Deserialize, Serialize};

use common::{BacktestOutcome, Candle, Direction};

/// One historical trade to replay: a signal candle plus exit thresholds.
#[derive(Debug, Clone)]
pub struct TradeSetup<'a> {
    pub candles: &'a [Candle],
    pub direction: Direction,
    pub entry: f64,
    /// Take-profit distance as a fraction of entry (0.03 = 3%).
    pub take_profit_pct: f64,
    /// Stop-loss distance as a fraction of entry.
    pub stop_loss_pct: f64,
    /// Index of the signal candle; replay starts at the next index.
    pub signal_index: usize,
}

/// Replay forward candles from a historical signal point and report which
/// threshold was struck first.
///
/// For a bullish signal: take-profit when `high >= entry * (1 + tp)`,
/// stop-loss when `low <= entry * (1 - sl)`; mirrored for bearish. The first
/// trigger in chronological order wins. When a single candle spans both
/// thresholds the stop-loss is counted, the conservative fill assumption.
/// Exhausted forward data is `NoResult`. The series is never mutated and
/// nothing past the given slice is consulted.
pub fn simulate(setup: &TradeSetup<'_>) -> BacktestOutcome {
    let (tp_price, sl_price) = match setup.direction {
        Direction::Bullish => (
            setup.entry * (1.0 + setup.take_profit_pct),
            setup.entry * (1.0 - setup.stop_loss_pct),
        ),
        Direction::Bearish => (
            setup.entry * (1.0 - setup.take_profit_pct),
            setup.entry * (1.0 + setup.stop_loss_pct),
        ),
    };

    for candle in setup.candles.iter().skip(setup.signal_index + 1) {
        let (tp_hit, sl_hit) = match setup.direction {
            Direction::Bullish => (candle.high >= tp_price, candle.low <= sl_price),
            Direction::Bearish => (candle.low <= tp_price, candle.high >= sl_price),
        };
        if sl_hit {
            return BacktestOutcome::StopLossHit;
        }
        if tp_hit {
            return BacktestOutcome::TakeProfitHit;
        }
    }
    BacktestOutcome::NoResult
}

/// Aggregate result of replaying every flagged instrument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BacktestSummary {
    pub wins: usize,
    pub losses: usize,
    pub unresolved: usize,
}

impl BacktestSummary {
    /// Take-profit share of resolved trades, in percent. `None` when nothing
    /// resolved within the data.
    pub fn hit_rate_pct(&self) -> Option<f64> {
        let resolved = self.wins + self.losses;
        if resolved == 0 {
            None
        } else {
            Some(100.0 * self.wins as f64 / resolved as f64)
        }
    }
}

/// Run the simulator over a batch of setups and tally the outcomes.
pub fn hit_rate(setups: &[TradeSetup<'_>]) -> BacktestSummary {
    let mut summary = BacktestSummary::default();
    for setup in setups {
        match simulate(setup) {
            BacktestOutcome::TakeProfitHit => summary.wins += 1,
            BacktestOutcome::StopLossHit => summary.losses += 1,
            BacktestOutcome::NoResult => summary.unresolved += 1,
        }
    }
    summary
}
