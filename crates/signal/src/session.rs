use chrono::{Duration, FixedOffset, TimeZone, Timelike};

use common::{Candle, Direction, Timeframe};

/// Daily sessions roll over at 08:00 in this reference zone (UTC+8).
const DAILY_ANCHOR_OFFSET_SECS: i32 = 8 * 3600;
const DAILY_ANCHOR_HOUR: u32 = 8;

/// Body-to-range ratio below which a candle counts as a doji.
const DOJI_RATIO: f64 = 0.2;

/// Current and previous session start times for one timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionWindow {
    pub current_start: i64,
    pub prev_start: i64,
}

/// Breakout state of the current session relative to the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendState {
    pub breakout: Option<Direction>,
    /// Last candle of the current session is a doji. Only meaningful when a
    /// breakout was declared.
    pub doji_after_breakout: bool,
}

/// Compute the session window for `(timeframe, now)`.
///
/// Intraday timeframes are fixed-size windows floor-aligned to the timeframe
/// duration. The daily timeframe anchors to 08:00 in the UTC+8 reference zone
/// rather than midnight UTC, rolling back one day when `now` precedes today's
/// boundary.
pub fn session_window(timeframe: Timeframe, now_ms: i64) -> SessionWindow {
    match timeframe {
        Timeframe::D1 => daily_window(now_ms),
        _ => {
            let dur = timeframe.duration_ms();
            let current_start = now_ms.div_euclid(dur) * dur;
            SessionWindow {
                current_start,
                prev_start: current_start - dur,
            }
        }
    }
}

fn daily_window(now_ms: i64) -> SessionWindow {
    let zone = FixedOffset::east_opt(DAILY_ANCHOR_OFFSET_SECS).expect("fixed offset in range");
    let local_now = zone.timestamp_millis_opt(now_ms).unwrap();
    let mut boundary = local_now
        .with_hour(DAILY_ANCHOR_HOUR)
        .and_then(|t| t.with_minute(0))
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .expect("08:00 exists in a fixed-offset zone");
    if local_now < boundary {
        boundary = boundary - Duration::days(1);
    }
    let current_start = boundary.timestamp_millis();
    SessionWindow {
        current_start,
        prev_start: (boundary - Duration::days(1)).timestamp_millis(),
    }
}

/// Detect a breakout of the current session against the previous one.
///
/// Returns `None` when either session has no candles, which happens near
/// data-history boundaries and is not an error.
///
/// Tie-break: when the window makes both a new high and a new low, the bearish
/// branch wins. The bullish condition is evaluated first and overwritten, so
/// the precedence is deterministic.
pub fn detect_trend(candles: &[Candle], window: &SessionWindow) -> Option<TrendState> {
    let prev: Vec<&Candle> = candles
        .iter()
        .filter(|c| c.open_time >= window.prev_start && c.open_time < window.current_start)
        .collect();
    let current: Vec<&Candle> = candles
        .iter()
        .filter(|c| c.open_time >= window.current_start)
        .collect();

    if prev.is_empty() || current.is_empty() {
        return None;
    }

    let prev_high = prev.iter().map(|c| c.high).fold(f64::MIN, f64::max);
    let prev_low = prev.iter().map(|c| c.low).fold(f64::MAX, f64::min);
    let cur_high = current.iter().map(|c| c.high).fold(f64::MIN, f64::max);
    let cur_low = current.iter().map(|c| c.low).fold(f64::MAX, f64::min);

    let mut breakout = None;
    if cur_high > prev_high {
        breakout = Some(Direction::Bullish);
    }
    if cur_low < prev_low {
        breakout = Some(Direction::Bearish);
    }

    let last = current.last().expect("current session is non-empty");
    let doji_after_breakout = breakout.is_some() && is_doji(last);

    Some(TrendState {
        breakout,
        doji_after_breakout,
    })
}

/// A candle whose body is under 20% of its full range. A zero-range candle is
/// not a doji (avoids the 0/0 division).
pub fn is_doji(candle: &Candle) -> bool {
    let range = candle.range();
    if range == 0.0 {
        return false;
    }
    candle.body() / range < DOJI_RATIO
}
