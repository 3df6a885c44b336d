use common::{Candle, Direction, FlagSignal, SignalStrength};

use crate::config::ClassifierConfig;
use crate::indicators::{adx, atr, ema_last, Macd, Rsi};
use crate::session::TrendState;

/// Higher-timeframe trend bias derived from the EMA ladder of a slower chart.
///
/// `Neutral` (including the no-data case) never contradicts a signal but also
/// never confirms a strong one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    Bullish,
    Bearish,
    Neutral,
}

impl Bias {
    pub fn agrees(&self, direction: Direction) -> bool {
        matches!(
            (self, direction),
            (Bias::Bullish, Direction::Bullish) | (Bias::Bearish, Direction::Bearish)
        )
    }

    pub fn contradicts(&self, direction: Direction) -> bool {
        matches!(
            (self, direction),
            (Bias::Bullish, Direction::Bearish) | (Bias::Bearish, Direction::Bullish)
        )
    }
}

/// Layered rule engine combining indicators, breakout state, volume
/// confirmation and higher-timeframe bias into a graded signal.
///
/// Rules are evaluated top-down, first match wins; every layer requires
/// stronger confirmation than the one below it. Missing indicator inputs
/// (insufficient history) fail the affected layer quietly; the classifier
/// never errors and is deterministic for identical inputs.
#[derive(Debug, Clone)]
pub struct FlagClassifier {
    cfg: ClassifierConfig,
    rsi: Rsi,
    macd: Macd,
}

impl FlagClassifier {
    pub fn new(cfg: ClassifierConfig) -> Self {
        let rsi = Rsi::new(cfg.rsi_period);
        let macd = Macd::new(cfg.macd_fast, cfg.macd_slow, cfg.macd_signal);
        Self { cfg, macd, rsi }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.cfg
    }

    /// Trend bias of a higher timeframe from its close series.
    pub fn higher_timeframe_bias(&self, closes: &[f64]) -> Bias {
        match self.ema_ladder_direction(closes) {
            Some(Direction::Bullish) => Bias::Bullish,
            Some(Direction::Bearish) => Bias::Bearish,
            None => Bias::Neutral,
        }
    }

    /// Classify one instrument. Returns `None` when the EMA ladder gives no
    /// direction; otherwise the graded signal (possibly strength `None`).
    pub fn evaluate(
        &self,
        symbol: &str,
        candles: &[Candle],
        trend: Option<&TrendState>,
        higher_tf: Bias,
    ) -> Option<FlagSignal> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let direction = self.ema_ladder_direction(&closes)?;

        let breakout_agrees = trend
            .and_then(|t| t.breakout)
            .map(|b| b == direction)
            .unwrap_or(false);

        let macd_agrees = self
            .macd
            .compute(&closes)
            .map(|m| match direction {
                Direction::Bullish => m.is_bullish(),
                Direction::Bearish => m.is_bearish(),
            })
            .unwrap_or(false);

        let adx_value = adx(candles, self.cfg.trend_period);
        let adx_strong = adx_value.map(|v| v > self.cfg.adx_strong).unwrap_or(false);
        let adx_medium = adx_value
            .map(|v| v >= self.cfg.adx_medium_low && v <= self.cfg.adx_strong)
            .unwrap_or(false);

        let atr_ok = match (atr(candles, self.cfg.trend_period), closes.last()) {
            (Some(a), Some(&last_close)) => a >= self.cfg.atr_floor_pct * last_close,
            _ => false,
        };

        let volume_ok = self.volume_confirms(candles, direction);

        let rsi_ok = self
            .rsi
            .compute(&closes)
            .map(|v| match direction {
                Direction::Bullish => v > 50.0,
                Direction::Bearish => v < 50.0,
            })
            .unwrap_or(false);

        let strength = if breakout_agrees
            && macd_agrees
            && volume_ok
            && adx_strong
            && atr_ok
            && higher_tf.agrees(direction)
        {
            SignalStrength::Strong
        } else if (breakout_agrees || macd_agrees)
            && adx_medium
            && !higher_tf.contradicts(direction)
        {
            SignalStrength::Medium
        } else if rsi_ok && !higher_tf.contradicts(direction) {
            SignalStrength::Weak
        } else {
            SignalStrength::None
        };

        Some(FlagSignal {
            symbol: symbol.to_string(),
            direction,
            strength,
        })
    }

    /// Direction from EMA ladder alignment: every shorter EMA strictly above
    /// the next longer one is bullish, strictly below is bearish. Any missing
    /// EMA (insufficient history) or mixed ordering gives no direction.
    fn ema_ladder_direction(&self, closes: &[f64]) -> Option<Direction> {
        let mut emas = [0.0; 4];
        for (slot, &period) in emas.iter_mut().zip(&self.cfg.ema_periods) {
            *slot = ema_last(closes, period)?;
        }

        if emas.windows(2).all(|w| w[0] > w[1]) {
            Some(Direction::Bullish)
        } else if emas.windows(2).all(|w| w[0] < w[1]) {
            Some(Direction::Bearish)
        } else {
            None
        }
    }

    /// Current-candle volume above its trailing average, with the candle's own
    /// direction matching the signal.
    fn volume_confirms(&self, candles: &[Candle], direction: Direction) -> bool {
        let lookback = self.cfg.volume_lookback;
        if candles.len() < lookback + 1 {
            return false;
        }
        let last = candles.last().expect("len checked above");
        let tail = &candles[candles.len() - 1 - lookback..candles.len() - 1];
        let avg = tail.iter().map(|c| c.volume).sum::<f64>() / lookback as f64;

        let direction_matches = match direction {
            Direction::Bullish => last.is_bullish(),
            Direction::Bearish => last.is_bearish(),
        };
        last.volume > avg && direction_matches
    }
}

impl Default for FlagClassifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}
