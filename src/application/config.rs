use serde::Deserialize;

use crate::domain::logging::LogComponent;
use crate::domain::market_data::{Resolution, SentimentSource, Ticker, TimeRange};
use crate::infrastructure::rendering::DEFAULT_GAP_COLOR;
use crate::infrastructure::storage::RESOLUTION_STORAGE_KEY;
use crate::log_warn;

/// Which series value the shared scrub store carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrubSeries {
    #[default]
    Sentiment,
    Price,
}

/// Embedding options. Every field is optional in JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub ticker: Ticker,
    pub default_resolution: Resolution,
    pub default_time_range: TimeRange,
    pub default_source: SentimentSource,
    pub width: f64,
    pub height: f64,
    pub api_base_url: String,
    pub resolution_storage_key: String,
    pub gap_color: String,
    pub scrub_series: ScrubSeries,
    pub resize_debounce_ms: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            ticker: Ticker::from("SPY"),
            default_resolution: Resolution::OneHour,
            default_time_range: TimeRange::OneMonth,
            default_source: SentimentSource::All,
            width: 800.0,
            height: 400.0,
            api_base_url: String::new(),
            resolution_storage_key: RESOLUTION_STORAGE_KEY.to_string(),
            gap_color: DEFAULT_GAP_COLOR.to_string(),
            scrub_series: ScrubSeries::default(),
            resize_debounce_ms: 150,
        }
    }
}

impl ChartConfig {
    /// Parse embedding JSON; absent, empty or malformed input yields the
    /// default config.
    pub fn from_json(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return Self::default();
        };
        match serde_json::from_str::<ChartConfig>(raw) {
            Ok(config) => config.sanitized(),
            Err(e) => {
                log_warn!(LogComponent::Application("ChartConfig"), "invalid config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.width.is_finite() && self.width > 0.0) {
            self.width = defaults.width;
        }
        if !(self.height.is_finite() && self.height > 0.0) {
            self.height = defaults.height;
        }
        self.ticker = Ticker::from(self.ticker.value());
        if self.ticker.value().is_empty() {
            self.ticker = defaults.ticker;
        }
        self
    }
}
