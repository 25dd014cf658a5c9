use derive_more::Display;
use serde::Serialize;
use strum::{AsRefStr, EnumIter};

use crate::domain::market_data::{Candle, OHLCV, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display(fmt = "series#{}", _0)]
pub struct SeriesId(pub u32);

/// Series presentation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, AsRefStr)]
pub enum SeriesKind {
    #[display(fmt = "Candlestick")]
    #[strum(serialize = "candlestick")]
    Candlestick,
    #[display(fmt = "Line")]
    #[strum(serialize = "line")]
    Line,
    #[display(fmt = "Area")]
    #[strum(serialize = "area")]
    Area,
    #[display(fmt = "Histogram")]
    #[strum(serialize = "histogram")]
    Histogram,
}

/// Which vertical axis a series is plotted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceScaleId {
    /// Auto-fitted price axis.
    Left,
    /// Fixed [-1, 1] oscillator axis.
    Right,
    /// Unlabelled scale in the bottom strip of the pane.
    Overlay,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesOptions {
    pub kind: SeriesKind,
    pub scale: PriceScaleId,
    pub title: String,
    pub color: String,
    pub up_color: String,
    pub down_color: String,
    pub line_width: f64,
    pub visible: bool,
}

impl SeriesOptions {
    pub fn candlestick(title: &str) -> Self {
        Self {
            kind: SeriesKind::Candlestick,
            scale: PriceScaleId::Left,
            title: title.to_string(),
            color: "#888888".to_string(),
            up_color: "#26a69a".to_string(),
            down_color: "#ef5350".to_string(),
            line_width: 1.0,
            visible: true,
        }
    }

    pub fn line(title: &str, color: &str, scale: PriceScaleId) -> Self {
        Self {
            kind: SeriesKind::Line,
            scale,
            title: title.to_string(),
            color: color.to_string(),
            up_color: color.to_string(),
            down_color: color.to_string(),
            line_width: 2.0,
            visible: true,
        }
    }

    pub fn histogram(title: &str, color: &str) -> Self {
        Self {
            kind: SeriesKind::Histogram,
            scale: PriceScaleId::Overlay,
            title: title.to_string(),
            color: color.to_string(),
            up_color: color.to_string(),
            down_color: color.to_string(),
            line_width: 1.0,
            visible: true,
        }
    }
}

/// Single-value point of a line/area/histogram series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinePoint {
    pub timestamp: Timestamp,
    pub value: f64,
    /// Per-point colour override (histogram bars).
    pub color: Option<String>,
}

impl LinePoint {
    pub fn new(timestamp: Timestamp, value: f64) -> Self {
        Self { timestamp, value, color: None }
    }

    pub fn colored(timestamp: Timestamp, value: f64, color: impl Into<String>) -> Self {
        Self { timestamp, value, color: Some(color.into()) }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SeriesData {
    Bars(Vec<Candle>),
    Points(Vec<LinePoint>),
}

impl Default for SeriesData {
    fn default() -> Self {
        SeriesData::Points(Vec::new())
    }
}

impl SeriesData {
    pub fn len(&self) -> usize {
        match self {
            SeriesData::Bars(bars) => bars.len(),
            SeriesData::Points(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn times(&self) -> Vec<Timestamp> {
        match self {
            SeriesData::Bars(bars) => bars.iter().map(|c| c.timestamp).collect(),
            SeriesData::Points(points) => points.iter().map(|p| p.timestamp).collect(),
        }
    }

    /// Value at exactly `time`; nothing is interpolated.
    pub fn value_at(&self, time: Timestamp) -> Option<SeriesValue> {
        match self {
            SeriesData::Bars(bars) => bars
                .binary_search_by_key(&time, |c| c.timestamp)
                .ok()
                .map(|i| SeriesValue::Bar(bars[i].ohlcv)),
            SeriesData::Points(points) => points
                .binary_search_by_key(&time, |p| p.timestamp)
                .ok()
                .map(|i| SeriesValue::Single(points[i].value)),
        }
    }

    /// Values that drive auto-scaling for points inside `[from, to]`.
    pub fn extent_values(&self, from: Timestamp, to: Timestamp) -> Vec<f64> {
        match self {
            SeriesData::Bars(bars) => bars
                .iter()
                .filter(|c| c.timestamp >= from && c.timestamp <= to)
                .flat_map(|c| [c.ohlcv.low.value(), c.ohlcv.high.value()])
                .collect(),
            SeriesData::Points(points) => points
                .iter()
                .filter(|p| p.timestamp >= from && p.timestamp <= to)
                .map(|p| p.value)
                .collect(),
        }
    }
}

/// Sample of a series at one time coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeriesValue {
    Bar(OHLCV),
    Single(f64),
}

impl SeriesValue {
    /// Close for bars, the value itself otherwise.
    pub fn primary(&self) -> f64 {
        match self {
            SeriesValue::Bar(ohlcv) => ohlcv.close.value(),
            SeriesValue::Single(value) => *value,
        }
    }

    pub fn as_bar(&self) -> Option<OHLCV> {
        match self {
            SeriesValue::Bar(ohlcv) => Some(*ohlcv),
            SeriesValue::Single(_) => None,
        }
    }
}

/// One series registered with a host chart.
#[derive(Debug, Clone)]
pub struct Series {
    pub id: SeriesId,
    pub options: SeriesOptions,
    pub data: SeriesData,
}

impl Series {
    pub fn new(id: SeriesId, options: SeriesOptions) -> Self {
        let data = match options.kind {
            SeriesKind::Candlestick => SeriesData::Bars(Vec::new()),
            _ => SeriesData::Points(Vec::new()),
        };
        Self { id, options, data }
    }
}
