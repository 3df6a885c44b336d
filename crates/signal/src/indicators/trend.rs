use common::Candle;

/// Average True Range over `period` bars (Wilder's smoothing).
///
/// `TR = max(high − low, |high − prev close|, |low − prev close|)`. The first
/// ATR is the simple average of the first `period` true ranges; later bars use
/// Wilder's recursion. Fewer than `period + 1` candles is insufficient history
/// and yields `None`.
pub fn atr(candles: &[Candle], period: usize) -> Option<f64> {
    if period == 0 || candles.len() < period + 1 {
        return None;
    }

    let trs = true_ranges(candles);
    let mut atr_val: f64 = trs[..period].iter().sum::<f64>() / period as f64;
    for &tr in &trs[period..] {
        atr_val = (atr_val * (period - 1) as f64 + tr) / period as f64;
    }
    Some(atr_val)
}

/// Average Directional Index over `period` bars (Wilder's smoothing).
///
/// Directional movement from consecutive high/low deltas is smoothed the same
/// way as the true range, combined into `DX = 100·|+DI − −DI| / (+DI + −DI)`
/// (0 when the denominator is 0), then smoothed again into ADX. The double
/// smoothing needs at least `2·period` candles; shorter series yield `None`.
pub fn adx(candles: &[Candle], period: usize) -> Option<f64> {
    if period == 0 || candles.len() < 2 * period {
        return None;
    }

    let trs = true_ranges(candles);
    let n = trs.len();

    let mut plus_dm = vec![0.0; n];
    let mut minus_dm = vec![0.0; n];
    for i in 1..candles.len() {
        let up = candles[i].high - candles[i - 1].high;
        let down = candles[i - 1].low - candles[i].low;
        if up > down && up > 0.0 {
            plus_dm[i - 1] = up;
        }
        if down > up && down > 0.0 {
            minus_dm[i - 1] = down;
        }
    }

    // Wilder's smoothed running sums, seeded over the first `period` bars.
    let mut s_tr: f64 = trs[..period].iter().sum();
    let mut s_plus: f64 = plus_dm[..period].iter().sum();
    let mut s_minus: f64 = minus_dm[..period].iter().sum();

    let mut dx_values = vec![dx(s_plus, s_minus, s_tr)];
    for i in period..n {
        s_tr = s_tr - s_tr / period as f64 + trs[i];
        s_plus = s_plus - s_plus / period as f64 + plus_dm[i];
        s_minus = s_minus - s_minus / period as f64 + minus_dm[i];
        dx_values.push(dx(s_plus, s_minus, s_tr));
    }

    if dx_values.len() < period {
        return None;
    }

    let mut adx_val: f64 = dx_values[..period].iter().sum::<f64>() / period as f64;
    for &d in &dx_values[period..] {
        adx_val = (adx_val * (period - 1) as f64 + d) / period as f64;
    }
    Some(adx_val)
}

fn dx(s_plus: f64, s_minus: f64, s_tr: f64) -> f64 {
    if s_tr == 0.0 {
        return 0.0;
    }
    let plus_di = 100.0 * s_plus / s_tr;
    let minus_di = 100.0 * s_minus / s_tr;
    let sum = plus_di + minus_di;
    if sum == 0.0 {
        0.0
    } else {
        100.0 * (plus_di - minus_di).abs() / sum
    }
}

fn true_ranges(candles: &[Candle]) -> Vec<f64> {
    (1..candles.len())
        .map(|i| {
            let hl = candles[i].high - candles[i].low;
            let hc = (candles[i].high - candles[i - 1].close).abs();
            let lc = (candles[i].low - candles[i - 1].close).abs();
            hl.max(hc).max(lc)
        })
        .collect()
}
