use futures::FutureExt;
use futures::future::LocalBoxFuture;
use gloo::net::http::Request;
use serde::Deserialize;

use crate::domain::errors::{ChartError, ChartResult};
use crate::domain::logging::LogComponent;
use crate::domain::market_data::{
    Candle, ChartData, ChartDataSource, ChartQuery, OHLCV, Price, Resolution, SentimentPoint, Timestamp, Volume,
};
use crate::{log_info, log_warn};

/// One OHLCV bar as served by the chart API. `time` is Unix seconds.
#[derive(Debug, Deserialize)]
pub struct CandleDto {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

#[derive(Debug, Deserialize)]
pub struct SentimentDto {
    pub time: i64,
    pub score: f64,
}

/// Body of `GET /api/chart/{ticker}`.
#[derive(Debug, Deserialize)]
pub struct ChartResponseDto {
    #[serde(default)]
    pub candles: Vec<CandleDto>,
    #[serde(default)]
    pub sentiment: Vec<SentimentDto>,
    /// Resolution actually served; missing means "as requested".
    #[serde(default)]
    pub resolution: Option<Resolution>,
    #[serde(default)]
    pub resolution_fallback: bool,
    #[serde(default)]
    pub fallback_message: Option<String>,
}

impl CandleDto {
    fn to_domain_candle(&self) -> Option<Candle> {
        let ohlcv = OHLCV::new(
            Price::from(self.open),
            Price::from(self.high),
            Price::from(self.low),
            Price::from(self.close),
            Volume::from(self.volume),
        );
        ohlcv.is_valid().then(|| Candle::new(Timestamp::from_secs(self.time), ohlcv))
    }
}

impl ChartResponseDto {
    /// Convert to domain data. Invalid bars are dropped; a served resolution
    /// that differs from the requested one counts as a fallback.
    pub fn into_domain(self, requested: Resolution) -> ChartData {
        let total = self.candles.len();
        let candles: Vec<Candle> = self.candles.iter().filter_map(CandleDto::to_domain_candle).collect();
        if candles.len() != total {
            log_warn!(
                LogComponent::Infrastructure("HttpChartDataSource"),
                "dropped {} invalid bars",
                total - candles.len()
            );
        }
        let sentiment =
            self.sentiment.iter().map(|p| SentimentPoint::new(Timestamp::from_secs(p.time), p.score)).collect();

        let served = self.resolution.unwrap_or(requested);
        let data = ChartData::new(candles, sentiment, requested);
        let data = if self.resolution_fallback || served != requested {
            data.with_fallback(served, self.fallback_message)
        } else {
            data
        };
        data.normalized()
    }
}

/// Decode a response body into domain data.
pub fn parse_chart_response(body: &str, requested: Resolution) -> ChartResult<ChartData> {
    let dto: ChartResponseDto =
        serde_json::from_str(body).map_err(|e| ChartError::Decode(format!("Failed to parse JSON: {}", e)))?;
    Ok(dto.into_domain(requested))
}

/// Chart API client built on `gloo::net`.
#[derive(Debug, Clone)]
pub struct HttpChartDataSource {
    base_url: String,
}

impl HttpChartDataSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }

    pub fn request_url(&self, query: &ChartQuery) -> String {
        format!(
            "{}/api/chart/{}?range={}&resolution={}&source={}",
            self.base_url.trim_end_matches('/'),
            query.ticker,
            query.time_range,
            query.resolution,
            query.source
        )
    }
}

impl ChartDataSource for HttpChartDataSource {
    fn fetch(&self, query: ChartQuery) -> LocalBoxFuture<'static, ChartResult<ChartData>> {
        let url = self.request_url(&query);
        async move {
            log_info!(LogComponent::Infrastructure("HttpChartDataSource"), "GET {}", url);

            let response = Request::get(&url)
                .send()
                .await
                .map_err(|e| ChartError::Network(format!("Failed to send request: {:?}", e)))?;

            if !response.ok() {
                return Err(ChartError::Network(format!(
                    "HTTP error: {} - {}",
                    response.status(),
                    response.status_text()
                )));
            }

            let body = response
                .text()
                .await
                .map_err(|e| ChartError::Decode(format!("Failed to read body: {:?}", e)))?;
            let data = parse_chart_response(&body, query.resolution)?;

            log_info!(
                LogComponent::Infrastructure("HttpChartDataSource"),
                "received {} bars, {} sentiment points at {}",
                data.candles.len(),
                data.sentiment.len(),
                data.resolution
            );
            Ok(data)
        }
        .boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market_data::{SentimentSource, Ticker, TimeRange};

    #[test]
    fn builds_query_url() {
        let source = HttpChartDataSource::new("https://api.example.com/");
        let query = ChartQuery {
            ticker: Ticker::from("aapl"),
            time_range: TimeRange::OneWeek,
            resolution: Resolution::FifteenMinutes,
            source: SentimentSource::News,
            generation: 3,
        };
        assert_eq!(
            source.request_url(&query),
            "https://api.example.com/api/chart/AAPL?range=1W&resolution=15m&source=news"
        );
    }

    #[test]
    fn parses_fallback_and_drops_invalid_bars() {
        let body = r#"{
            "candles": [
                {"time": 120, "open": 10, "high": 12, "low": 9, "close": 11, "volume": 5},
                {"time": 60, "open": 10, "high": 8, "low": 9, "close": 11}
            ],
            "sentiment": [{"time": 60, "score": 1.7}],
            "resolution": "1h",
            "resolution_fallback": true,
            "fallback_message": "Hourly data only"
        }"#;
        let data = parse_chart_response(body, Resolution::OneMinute).unwrap();
        assert_eq!(data.candles.len(), 1);
        assert_eq!(data.sentiment[0].score, 1.0);
        assert_eq!(data.resolution, Resolution::OneHour);
        assert!(data.resolution_fallback);
        assert_eq!(data.fallback_message.as_deref(), Some("Hourly data only"));
    }

    #[test]
    fn served_resolution_mismatch_counts_as_fallback() {
        let data = parse_chart_response(r#"{"resolution": "1d"}"#, Resolution::OneHour).unwrap();
        assert!(data.resolution_fallback);
        assert_eq!(data.fallback_message, None);
    }

    #[test]
    fn malformed_body_is_decode_error() {
        let err = parse_chart_response("<html>", Resolution::OneHour).unwrap_err();
        assert!(matches!(err, ChartError::Decode(_)));
        assert!(err.is_retryable());
    }
}
