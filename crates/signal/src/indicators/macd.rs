use super::ema::{ema_last, ema_series};

/// MACD (Moving Average Convergence/Divergence) indicator.
///
/// `line = EMA(fast) − EMA(slow)`, `signal = EMA(line, signal_period)`,
/// `histogram = line − signal`. Returns `None` until `slow + signal` closes
/// are available; a shorter series is insufficient history, not an error.
#[derive(Debug, Clone)]
pub struct Macd {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

/// Latest MACD values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdOutput {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

impl MacdOutput {
    /// Line above signal: upward momentum agreement.
    pub fn is_bullish(&self) -> bool {
        self.line > self.signal
    }

    pub fn is_bearish(&self) -> bool {
        self.line < self.signal
    }
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast < slow, "MACD fast period must be less than slow period");
        Self { fast, slow, signal }
    }

    /// Compute the latest MACD values from a slice of close prices (oldest
    /// first). Needs at least `slow + signal` prices.
    pub fn compute(&self, closes: &[f64]) -> Option<MacdOutput> {
        if closes.len() < self.slow + self.signal {
            return None;
        }

        let fast_ema = ema_series(closes, self.fast);
        let slow_ema = ema_series(closes, self.slow);

        // MACD line exists wherever both EMAs are defined.
        let line_values: Vec<f64> = fast_ema
            .iter()
            .zip(&slow_ema)
            .filter_map(|(f, s)| match (f, s) {
                (Some(f), Some(s)) => Some(f - s),
                _ => None,
            })
            .collect();

        let line = *line_values.last()?;
        let signal = ema_last(&line_values, self.signal)?;

        Some(MacdOutput {
            line,
            signal,
            histogram: line - signal,
        })
    }
}

impl Default for Macd {
    fn default() -> Self {
        Self::new(12, 26, 9)
    }
}
