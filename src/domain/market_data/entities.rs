use super::value_objects::{OHLCV, Resolution, SentimentSource, Ticker, TimeRange, Timestamp};
use serde::{Deserialize, Serialize};

/// Domain entity - Candle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: Timestamp,
    pub ohlcv: OHLCV,
}

impl Candle {
    pub fn new(timestamp: Timestamp, ohlcv: OHLCV) -> Self {
        Self { timestamp, ohlcv }
    }

    pub fn is_bullish(&self) -> bool {
        self.ohlcv.close >= self.ohlcv.open
    }

    /// Intrabar volatility used by the histogram overlay.
    pub fn volatility(&self) -> f64 {
        self.ohlcv.range_percent()
    }
}

/// Domain entity - one sentiment observation, score in [-1, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentPoint {
    pub timestamp: Timestamp,
    pub score: f64,
}

impl SentimentPoint {
    pub fn new(timestamp: Timestamp, score: f64) -> Self {
        Self { timestamp, score: clamp_score(score) }
    }
}

/// Clamp into the oscillator domain; NaN becomes neutral.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() { 0.0 } else { score.clamp(-1.0, 1.0) }
}

/// Parameters of one chart data request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartQuery {
    pub ticker: Ticker,
    pub time_range: TimeRange,
    pub resolution: Resolution,
    pub source: SentimentSource,
    /// Monotonic request number; responses for older numbers are stale.
    pub generation: u64,
}

/// Series content returned for a `ChartQuery`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub candles: Vec<Candle>,
    pub sentiment: Vec<SentimentPoint>,
    /// Resolution actually served.
    pub resolution: Resolution,
    pub resolution_fallback: bool,
    pub fallback_message: Option<String>,
}

impl ChartData {
    pub fn new(candles: Vec<Candle>, sentiment: Vec<SentimentPoint>, resolution: Resolution) -> Self {
        Self { candles, sentiment, resolution, resolution_fallback: false, fallback_message: None }
    }

    pub fn with_fallback(mut self, served: Resolution, message: Option<String>) -> Self {
        self.resolution = served;
        self.resolution_fallback = true;
        self.fallback_message = message;
        self
    }

    /// Sort both series by time and drop duplicate timestamps (last one wins).
    pub fn normalized(mut self) -> Self {
        self.candles.sort_by_key(|c| c.timestamp);
        dedup_last_by_key(&mut self.candles, |c| c.timestamp);
        self.sentiment.sort_by_key(|p| p.timestamp);
        dedup_last_by_key(&mut self.sentiment, |p| p.timestamp);
        self
    }
}

fn dedup_last_by_key<T, K: PartialEq>(items: &mut Vec<T>, key: impl Fn(&T) -> K) {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items.drain(..) {
        match out.last_mut() {
            Some(last) if key(last) == key(&item) => *last = item,
            _ => out.push(item),
        }
    }
    *items = out;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market_data::{Price, Volume};

    fn candle(ts: i64, close: f64) -> Candle {
        Candle::new(
            Timestamp::from_secs(ts),
            OHLCV::new(Price::from(close), Price::from(close), Price::from(close), Price::from(close), Volume::from(1.0)),
        )
    }

    #[test]
    fn normalized_sorts_and_keeps_latest_duplicate() {
        let data = ChartData::new(vec![candle(120, 2.0), candle(60, 1.0), candle(120, 3.0)], vec![], Resolution::OneMinute)
            .normalized();
        let closes: Vec<f64> = data.candles.iter().map(|c| c.ohlcv.close.value()).collect();
        assert_eq!(closes, vec![1.0, 3.0]);
    }

    #[test]
    fn sentiment_scores_are_clamped() {
        assert_eq!(SentimentPoint::new(Timestamp::from_secs(0), 1.7).score, 1.0);
        assert_eq!(SentimentPoint::new(Timestamp::from_secs(0), f64::NAN).score, 0.0);
    }
}
