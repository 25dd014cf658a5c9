use std::cell::Cell;

use crate::domain::chart::{
    AttachContext, BitmapScope, GapMarker, PaneRenderer, PaneView, SeriesPrimitive, ZOrder,
};
use crate::domain::logging::LogComponent;
use crate::log_trace;

pub const DEFAULT_GAP_COLOR: &str = "rgba(128, 128, 128, 0.15)";

/// Translucent full-height bands behind the series at market-closure bars.
///
/// Decorative only: no hit testing, drawn at the bottom z-order.
pub struct GapShadingPrimitive {
    markers: Vec<GapMarker>,
    chart_height: f64,
    color: String,
    context: Option<AttachContext>,
    drawn_last_frame: Cell<usize>,
}

impl GapShadingPrimitive {
    pub fn new(chart_height: f64) -> Self {
        Self {
            markers: Vec::new(),
            chart_height,
            color: DEFAULT_GAP_COLOR.to_string(),
            context: None,
            drawn_last_frame: Cell::new(0),
        }
    }

    /// Replace the whole marker list and ask the host for a repaint.
    pub fn update_gaps(&mut self, markers: Vec<GapMarker>) {
        self.markers = markers;
        self.request_redraw();
    }

    /// Vertical extent (media pixels) used from the next draw on.
    pub fn set_chart_height(&mut self, px: f64) {
        self.chart_height = px.max(0.0);
    }

    pub fn set_color(&mut self, color: impl Into<String>) {
        self.color = color.into();
        self.request_redraw();
    }

    pub fn markers(&self) -> &[GapMarker] {
        &self.markers
    }

    pub fn is_attached(&self) -> bool {
        self.context.is_some()
    }

    /// Rectangles filled by the most recent draw.
    pub fn drawn_last_frame(&self) -> usize {
        self.drawn_last_frame.get()
    }

    fn request_redraw(&self) {
        if let Some(context) = &self.context {
            context.redraw.request();
        }
    }

    /// Fill one band per visible marker. Returns how many were drawn.
    pub fn draw_bands(&self, scope: &mut BitmapScope<'_>) -> usize {
        let Some(context) = &self.context else {
            self.drawn_last_frame.set(0);
            return 0;
        };
        let half_width = context.coordinates.bar_spacing() / 2.0;
        let hpr = scope.horizontal_pixel_ratio;
        let height = self.chart_height * scope.vertical_pixel_ratio;

        let mut drawn = 0;
        for marker in &self.markers {
            let Some(x) = context.coordinates.time_to_coordinate(marker.time) else {
                continue;
            };
            let left = (x - half_width) * hpr;
            let width = half_width * 2.0 * hpr;
            scope.surface.fill_rect(left, 0.0, width, height, &self.color);
            drawn += 1;
        }
        log_trace!(LogComponent::Infrastructure("GapShading"), "drew {}/{} gap bands", drawn, self.markers.len());
        self.drawn_last_frame.set(drawn);
        drawn
    }
}

struct GapPaneView<'a> {
    source: &'a GapShadingPrimitive,
}

struct GapRenderer<'a> {
    source: &'a GapShadingPrimitive,
}

impl PaneRenderer for GapRenderer<'_> {
    fn draw(&self, scope: &mut BitmapScope<'_>) {
        self.source.draw_bands(scope);
    }
}

impl PaneView for GapPaneView<'_> {
    fn z_order(&self) -> ZOrder {
        ZOrder::Bottom
    }

    fn renderer(&self) -> Option<Box<dyn PaneRenderer + '_>> {
        Some(Box::new(GapRenderer { source: self.source }))
    }
}

impl SeriesPrimitive for GapShadingPrimitive {
    fn attached(&mut self, context: AttachContext) {
        self.context = Some(context);
        self.request_redraw();
    }

    fn detached(&mut self) {
        self.context = None;
    }

    fn pane_views(&self) -> Vec<Box<dyn PaneView + '_>> {
        vec![Box::new(GapPaneView { source: self })]
    }
}
