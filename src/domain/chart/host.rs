//! Capability surface of the charting host that an orchestrator drives.

use std::cell::RefCell;
use std::rc::Rc;

use super::primitive::SeriesPrimitive;
use super::series::{SeriesData, SeriesId, SeriesOptions, SeriesValue};
use crate::domain::market_data::Timestamp;

pub type PrimitiveRef = Rc<RefCell<dyn SeriesPrimitive>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrimitiveId(pub u32);

/// Crosshair movement as seen by subscribers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CrosshairEvent {
    /// Pointer position in media pixels; `None` when the crosshair left the plot.
    pub point: Option<(f64, f64)>,
    pub time: Option<Timestamp>,
    pub logical: Option<usize>,
    /// Values of visible series that have a point at exactly `time`.
    pub series_values: Vec<(SeriesId, SeriesValue)>,
}

impl CrosshairEvent {
    pub fn value_of(&self, series: SeriesId) -> Option<SeriesValue> {
        self.series_values.iter().find(|(id, _)| *id == series).map(|(_, value)| *value)
    }
}

pub type CrosshairHandler = Box<dyn FnMut(&CrosshairEvent)>;

/// Construction options for a host chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartOptions {
    pub width: f64,
    pub height: f64,
    /// Device pixels per media pixel.
    pub pixel_ratio: f64,
    pub background: String,
    pub text_color: String,
    pub grid_color: String,
    pub crosshair_color: String,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 400.0,
            pixel_ratio: 1.0,
            background: "#131722".to_string(),
            text_color: "#d1d4dc".to_string(),
            grid_color: "rgba(42, 46, 57, 0.6)".to_string(),
            crosshair_color: "#758696".to_string(),
        }
    }
}

/// Narrow interface to a time-series chart with one shared time axis and
/// per-series value axes.
pub trait HostChart {
    fn add_series(&mut self, options: SeriesOptions) -> SeriesId;
    fn remove_series(&mut self, series: SeriesId);
    fn set_series_data(&mut self, series: SeriesId, data: SeriesData);
    fn set_series_visible(&mut self, series: SeriesId, visible: bool);
    fn is_series_visible(&self, series: SeriesId) -> bool;

    /// Value of a visible series at exactly `time`.
    fn sample(&self, series: SeriesId, time: Timestamp) -> Option<SeriesValue>;

    fn time_to_coordinate(&self, time: Timestamp) -> Option<f64>;
    fn coordinate_to_time(&self, x: f64) -> Option<Timestamp>;
    fn bar_spacing(&self) -> f64;
    fn fit_content(&mut self);

    fn width(&self) -> f64;
    fn height(&self) -> f64;
    fn resize(&mut self, width: f64, height: f64);

    fn subscribe_crosshair_move(&mut self, handler: CrosshairHandler) -> SubscriptionId;
    fn unsubscribe_crosshair_move(&mut self, subscription: SubscriptionId);
    /// Move the crosshair to a media-pixel point and notify subscribers.
    fn set_crosshair_position(&mut self, x: f64, y: f64);
    fn clear_crosshair_position(&mut self);

    /// `None` when `series` does not exist.
    fn attach_primitive(&mut self, series: SeriesId, primitive: PrimitiveRef) -> Option<PrimitiveId>;
    fn detach_primitive(&mut self, primitive: PrimitiveId);

    fn request_redraw(&self);

    /// Release every series, subscriber and primitive. Later calls are no-ops.
    fn remove(&mut self);
}
