use serde::Serialize;

use crate::domain::market_data::{Candle, Resolution, Timestamp};

/// A bar that follows a market closure. Shaded by the gap primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GapMarker {
    pub time: Timestamp,
    /// Logical bar index when the marker was computed.
    pub index: usize,
}

/// Consecutive bars further apart than this many bar durations form a gap.
pub const GAP_TOLERANCE_BARS: f64 = 1.5;

/// Markers for every bar that starts after a closure. `candles` must be time-sorted.
pub fn detect_gaps(candles: &[Candle], resolution: Resolution) -> Vec<GapMarker> {
    let limit = resolution.duration_secs() as f64 * GAP_TOLERANCE_BARS;
    candles
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| (pair[1].timestamp.value() - pair[0].timestamp.value()) as f64 > limit)
        .map(|(i, pair)| GapMarker { time: pair[1].timestamp, index: i + 1 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market_data::{OHLCV, Price, Volume};

    fn bar(ts: i64) -> Candle {
        let p = Price::from(1.0);
        Candle::new(Timestamp::from_secs(ts), OHLCV::new(p, p, p, p, Volume::from(0.0)))
    }

    #[test]
    fn marks_bar_after_closure() {
        let day = 86_400;
        let candles: Vec<Candle> = [0, 1, 2, 3, 4, 7, 8].iter().map(|d| bar(d * day)).collect();
        let gaps = detect_gaps(&candles, Resolution::OneDay);
        assert_eq!(gaps, vec![GapMarker { time: Timestamp::from_secs(7 * day), index: 5 }]);
    }

    #[test]
    fn contiguous_series_has_no_gaps() {
        let candles: Vec<Candle> = (0..10).map(|i| bar(i * 300)).collect();
        assert!(detect_gaps(&candles, Resolution::FiveMinutes).is_empty());
        assert!(detect_gaps(&[], Resolution::OneMinute).is_empty());
    }
}
