/// Exponential Moving Average, aligned to the input series.
///
/// Multiplier `k = 2 / (period + 1)`. The first defined value, at index
/// `period - 1`, is the simple average of the first `period` closes; later
/// values use the standard recursion. Warm-up indices are `None`, never zero.
/// Input shorter than `period` yields an all-`None` vector of the same length.
pub fn ema_series(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() < period {
        return out;
    }

    let k = 2.0 / (period as f64 + 1.0);
    let seed: f64 = closes[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(seed);

    let mut prev = seed;
    for i in period..closes.len() {
        prev = closes[i] * k + prev * (1.0 - k);
        out[i] = Some(prev);
    }
    out
}

/// Latest EMA value, or `None` when there is insufficient history.
pub fn ema_last(closes: &[f64], period: usize) -> Option<f64> {
    ema_series(closes, period).last().copied().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_warmup_indices_are_none() {
        let closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let out = ema_series(&closes, 5);
        assert_eq!(out.len(), closes.len());
        assert!(out[..4].iter().all(|v| v.is_none()));
        assert!(out[4..].iter().all(|v| v.is_some()));
    }

    #[test]
    fn ema_seed_is_simple_average() {
        let closes = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let out = ema_series(&closes, 5);
        assert!((out[4].unwrap() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn ema_short_input_is_all_none() {
        let closes = vec![1.0, 2.0, 3.0];
        let out = ema_series(&closes, 5);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|v| v.is_none()));
        assert!(ema_last(&closes, 5).is_none());
    }

    #[test]
    fn ema_converges_to_constant() {
        let closes = vec![42.0; 100];
        for period in [2usize, 5, 14, 50] {
            let last = ema_last(&closes, period).unwrap();
            assert!(
                (last - 42.0).abs() < 1e-9,
                "period {period}: expected 42, got {last}"
            );
        }
    }

    #[test]
    fn ema_is_deterministic() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.7).sin()).collect();
        assert_eq!(ema_series(&closes, 12), ema_series(&closes, 12));
    }
}
