use serde::Serialize;

use crate::domain::market_data::{OHLCV, Timestamp};
use crate::domain::sentiment::{LabelStyle, format_score, score_to_color, sentiment_label};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSample {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub change_percent: f64,
}

impl From<OHLCV> for PriceSample {
    fn from(ohlcv: OHLCV) -> Self {
        let open = ohlcv.open.value();
        let close = ohlcv.close.value();
        let change_percent = if open != 0.0 { (close - open) / open * 100.0 } else { 0.0 };
        Self { open, high: ohlcv.high.value(), low: ohlcv.low.value(), close, change_percent }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentSample {
    pub score: f64,
    pub label: &'static str,
    pub color: String,
}

impl SentimentSample {
    pub fn new(score: f64, style: LabelStyle) -> Self {
        Self { score, label: sentiment_label(score, style), color: score_to_color(score) }
    }
}

/// Hover payload: whichever of the two layers had a point under the cursor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipData {
    pub time: Timestamp,
    pub timestamp_iso: Option<String>,
    /// Cursor position in media pixels.
    pub x: f64,
    pub y: f64,
    pub price: Option<PriceSample>,
    pub sentiment: Option<SentimentSample>,
}

impl TooltipData {
    /// `None` when neither sample is present.
    pub fn compose(
        time: Timestamp,
        (x, y): (f64, f64),
        price: Option<OHLCV>,
        sentiment: Option<f64>,
        style: LabelStyle,
    ) -> Option<Self> {
        if price.is_none() && sentiment.is_none() {
            return None;
        }
        Some(Self {
            time,
            timestamp_iso: time.to_iso8601(),
            x,
            y,
            price: price.map(PriceSample::from),
            sentiment: sentiment.map(|score| SentimentSample::new(score, style)),
        })
    }

    pub fn formatted_text(&self) -> String {
        let mut lines = Vec::with_capacity(7);
        if let Some(iso) = &self.timestamp_iso {
            lines.push(iso.clone());
        }
        if let Some(price) = &self.price {
            lines.push(format!("Open:   {:.2}", price.open));
            lines.push(format!("High:   {:.2}", price.high));
            lines.push(format!("Low:    {:.2}", price.low));
            lines.push(format!("Close:  {:.2} ({:+.2}%)", price.close, price.change_percent));
        }
        if let Some(sentiment) = &self.sentiment {
            lines.push(format!("Sentiment: {} ({})", format_score(sentiment.score), sentiment.label));
        }
        lines.join("\n")
    }
}
