//! Extension points for drawing into a host chart's own paint cycle.
//!
//! A primitive is attached to one series. On every repaint the host asks
//! each attached primitive for its pane views, groups them by z-order and
//! hands their renderers a [`BitmapScope`]. Drawing happens in bitmap
//! (physical) pixels; the host's coordinate queries answer in media
//! (logical) pixels, so renderers scale by the pixel ratios.

use std::fmt;
use std::rc::Rc;

use crate::domain::market_data::Timestamp;

/// Paint layer relative to the host's series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ZOrder {
    /// Beneath every series.
    Bottom,
    /// With the series, after them.
    Normal,
    /// Above series and crosshair.
    Top,
}

/// Drawing target in bitmap pixel space.
pub trait Surface {
    fn clear(&mut self, width: f64, height: f64, color: &str);
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: &str);
    fn stroke_polyline(&mut self, points: &[(f64, f64)], color: &str, line_width: f64, dashed: bool);
    fn fill_text(&mut self, text: &str, x: f64, y: f64, color: &str, font_px: f64);
}

/// Surface plus the media→bitmap conversion factors for the current frame.
pub struct BitmapScope<'a> {
    pub surface: &'a mut dyn Surface,
    pub horizontal_pixel_ratio: f64,
    pub vertical_pixel_ratio: f64,
    /// Plot size in media pixels.
    pub media_width: f64,
    pub media_height: f64,
}

impl BitmapScope<'_> {
    pub fn bitmap_width(&self) -> f64 {
        self.media_width * self.horizontal_pixel_ratio
    }

    pub fn bitmap_height(&self) -> f64 {
        self.media_height * self.vertical_pixel_ratio
    }
}

/// Coordinate queries a host exposes to attached primitives (media pixels).
pub trait CoordinateSource {
    /// `None` when `time` has no bar or is not currently visible.
    fn time_to_coordinate(&self, time: Timestamp) -> Option<f64>;
    fn bar_spacing(&self) -> f64;
}

/// Asks the host for another paint.
#[derive(Clone)]
pub struct RedrawHandle(Rc<dyn Fn()>);

impl RedrawHandle {
    pub fn new(request: impl Fn() + 'static) -> Self {
        Self(Rc::new(request))
    }

    pub fn noop() -> Self {
        Self::new(|| {})
    }

    pub fn request(&self) {
        (self.0)()
    }
}

impl fmt::Debug for RedrawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RedrawHandle")
    }
}

/// What a primitive receives when it is attached.
#[derive(Clone)]
pub struct AttachContext {
    pub coordinates: Rc<dyn CoordinateSource>,
    pub redraw: RedrawHandle,
}

/// Result of a primitive hit test.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveHit {
    pub z_order: ZOrder,
    pub cursor: Option<String>,
}

pub trait PaneRenderer {
    fn draw(&self, scope: &mut BitmapScope<'_>);
}

pub trait PaneView {
    fn z_order(&self) -> ZOrder;
    fn renderer(&self) -> Option<Box<dyn PaneRenderer + '_>>;
}

/// Custom drawing attached to a series.
pub trait SeriesPrimitive {
    fn attached(&mut self, context: AttachContext);

    /// After this the primitive must not query the host again.
    fn detached(&mut self);

    fn pane_views(&self) -> Vec<Box<dyn PaneView + '_>>;

    /// Called by the host before a paint after its data or geometry changed.
    fn update_all_views(&mut self) {}

    fn hit_test(&self, _x: f64, _y: f64) -> Option<PrimitiveHit> {
        None
    }
}
