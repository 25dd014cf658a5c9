use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use crate::domain::chart::{
    AttachContext, BitmapScope, ChartOptions, CoordinateSource, CrosshairEvent, CrosshairHandler, HostChart,
    PriceScale, PriceScaleId, PrimitiveId, PrimitiveRef, RedrawHandle, Series, SeriesData, SeriesId, SeriesKind,
    SeriesOptions, SeriesValue, SubscriptionId, Surface, TimeScale, ZOrder,
};
use crate::domain::logging::LogComponent;
use crate::domain::market_data::Timestamp;
use crate::time_utils::format_time_label;
use crate::{log_debug, log_trace};

/// Share of the bar slot taken by a candle body or histogram column.
const BODY_RATIO: f64 = 0.6;
/// Bottom strip of the pane used by overlay-scale series.
const OVERLAY_TOP_MARGIN: f64 = 0.8;
const LABEL_FONT_PX: f64 = 11.0;
const TIME_LABEL_COUNT: usize = 5;

/// Coordinate queries handed to attached primitives.
struct TimeScaleCoordinates(Rc<RefCell<TimeScale>>);

impl CoordinateSource for TimeScaleCoordinates {
    fn time_to_coordinate(&self, time: Timestamp) -> Option<f64> {
        self.0.borrow().time_to_coordinate(time)
    }

    fn bar_spacing(&self) -> f64 {
        self.0.borrow().bar_spacing()
    }
}

struct AttachedPrimitive {
    id: PrimitiveId,
    series: SeriesId,
    primitive: PrimitiveRef,
}

/// Host chart drawing onto any [`Surface`]: candles, lines and histograms on
/// one logical-index time axis with a left (price), right (oscillator) and
/// overlay value scale.
pub struct CanvasChart<S: Surface> {
    surface: S,
    options: ChartOptions,
    series: Vec<Series>,
    next_series_id: u32,
    time_scale: Rc<RefCell<TimeScale>>,
    left_scale: PriceScale,
    right_scale: PriceScale,
    overlay_scale: PriceScale,
    subscribers: Vec<(SubscriptionId, CrosshairHandler)>,
    next_subscription_id: u32,
    primitives: Vec<AttachedPrimitive>,
    next_primitive_id: u32,
    crosshair: Option<(f64, f64)>,
    dirty: Rc<Cell<bool>>,
    redraw: RedrawHandle,
    removed: bool,
}

impl<S: Surface> CanvasChart<S> {
    /// `on_redraw` is invoked whenever the chart or one of its primitives
    /// needs a paint; the caller decides when to call [`CanvasChart::paint`].
    pub fn new(surface: S, options: ChartOptions, on_redraw: RedrawHandle) -> Self {
        let dirty = Rc::new(Cell::new(true));
        let redraw = {
            let dirty = Rc::clone(&dirty);
            RedrawHandle::new(move || {
                dirty.set(true);
                on_redraw.request();
            })
        };
        let height = options.height;
        Self {
            surface,
            time_scale: Rc::new(RefCell::new(TimeScale::new(options.width))),
            left_scale: PriceScale::auto(height),
            right_scale: PriceScale::fixed(-1.0, 1.0, height),
            overlay_scale: PriceScale::auto(height).with_margins(OVERLAY_TOP_MARGIN, 0.0),
            options,
            series: Vec::new(),
            next_series_id: 1,
            subscribers: Vec::new(),
            next_subscription_id: 1,
            primitives: Vec::new(),
            next_primitive_id: 1,
            crosshair: None,
            dirty,
            redraw,
            removed: false,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn options(&self) -> &ChartOptions {
        &self.options
    }

    pub fn time_scale(&self) -> Ref<'_, TimeScale> {
        self.time_scale.borrow()
    }

    pub fn scale(&self, id: PriceScaleId) -> &PriceScale {
        match id {
            PriceScaleId::Left => &self.left_scale,
            PriceScaleId::Right => &self.right_scale,
            PriceScaleId::Overlay => &self.overlay_scale,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    /// Zoom around a media-pixel x (wheel / pinch).
    pub fn zoom_at(&mut self, anchor_x: f64, factor: f64) {
        if self.removed {
            return;
        }
        self.time_scale.borrow_mut().zoom_at(anchor_x, factor);
        self.request_redraw();
    }

    pub fn set_bar_spacing(&mut self, spacing: f64) {
        if self.removed {
            return;
        }
        self.time_scale.borrow_mut().set_bar_spacing(spacing);
        self.request_redraw();
    }

    pub fn scroll_by_pixels(&mut self, delta_px: f64) {
        if self.removed {
            return;
        }
        self.time_scale.borrow_mut().scroll_by_pixels(delta_px);
        self.request_redraw();
    }

    pub fn set_pixel_ratio(&mut self, ratio: f64) {
        if ratio.is_finite() && ratio > 0.0 {
            self.options.pixel_ratio = ratio;
            self.request_redraw();
        }
    }

    fn series_mut(&mut self, id: SeriesId) -> Option<&mut Series> {
        self.series.iter_mut().find(|s| s.id == id)
    }

    fn rebuild_time_points(&mut self) {
        let times: Vec<Timestamp> = self.series.iter().flat_map(|s| s.data.times()).collect();
        self.time_scale.borrow_mut().set_times(times);
    }

    fn refit_scales(&mut self) {
        let range = {
            let ts = self.time_scale.borrow();
            ts.visible_indices().map(|(first, last)| (ts.times()[first], ts.times()[last]))
        };
        let Some((from, to)) = range else { return };
        for (scale_id, scale) in [
            (PriceScaleId::Left, &mut self.left_scale),
            (PriceScaleId::Right, &mut self.right_scale),
            (PriceScaleId::Overlay, &mut self.overlay_scale),
        ] {
            let mut values: Vec<f64> = self
                .series
                .iter()
                .filter(|s| s.options.visible && s.options.scale == scale_id)
                .flat_map(|s| s.data.extent_values(from, to))
                .collect();
            if scale_id == PriceScaleId::Overlay && !values.is_empty() {
                values.push(0.0);
            }
            scale.fit(values);
        }
    }

    fn build_crosshair_event(&self, point: Option<(f64, f64)>) -> CrosshairEvent {
        let Some((x, y)) = point else {
            return CrosshairEvent::default();
        };
        let ts = self.time_scale.borrow();
        let logical = ts.coordinate_to_logical(x);
        let time = logical.map(|index| ts.times()[index]);
        let series_values = match time {
            Some(time) => self
                .series
                .iter()
                .filter(|s| s.options.visible)
                .filter_map(|s| s.data.value_at(time).map(|value| (s.id, value)))
                .collect(),
            None => Vec::new(),
        };
        CrosshairEvent { point: Some((x, y)), time, logical, series_values }
    }

    fn notify_crosshair(&mut self, event: &CrosshairEvent) {
        for (_, handler) in self.subscribers.iter_mut() {
            handler(event);
        }
    }

    /// Paint only if something requested it since the last paint.
    pub fn paint_if_dirty(&mut self) -> bool {
        if self.dirty.get() { self.paint() } else { false }
    }

    /// Full repaint. Returns `false` once the chart has been removed.
    pub fn paint(&mut self) -> bool {
        if self.removed {
            return false;
        }
        self.refit_scales();
        for attached in &self.primitives {
            attached.primitive.borrow_mut().update_all_views();
        }

        let ratio = self.options.pixel_ratio;
        let (width, height) = (self.options.width, self.options.height);
        self.surface.clear(width * ratio, height * ratio, &self.options.background);
        self.draw_grid();

        self.draw_primitives(ZOrder::Bottom);
        for kind in [SeriesKind::Histogram, SeriesKind::Area, SeriesKind::Candlestick, SeriesKind::Line] {
            self.draw_series_of_kind(kind);
        }
        self.draw_primitives(ZOrder::Normal);
        self.draw_axis_labels();
        self.draw_crosshair();
        self.draw_primitives(ZOrder::Top);

        self.dirty.set(false);
        log_trace!(LogComponent::Infrastructure("CanvasChart"), "painted {} series", self.series.len());
        true
    }

    fn draw_primitives(&mut self, z_order: ZOrder) {
        let mut scope = BitmapScope {
            surface: &mut self.surface,
            horizontal_pixel_ratio: self.options.pixel_ratio,
            vertical_pixel_ratio: self.options.pixel_ratio,
            media_width: self.options.width,
            media_height: self.options.height,
        };
        for attached in &self.primitives {
            let primitive = attached.primitive.borrow();
            for view in primitive.pane_views() {
                if view.z_order() != z_order {
                    continue;
                }
                if let Some(renderer) = view.renderer() {
                    renderer.draw(&mut scope);
                }
            }
        }
    }

    fn draw_grid(&mut self) {
        let ratio = self.options.pixel_ratio;
        let width = self.options.width * ratio;
        for step in 1..4 {
            let y = (self.options.height * step as f64 / 4.0 * ratio).round();
            self.surface.stroke_polyline(&[(0.0, y), (width, y)], &self.options.grid_color, ratio, false);
        }
    }

    fn draw_series_of_kind(&mut self, kind: SeriesKind) {
        let ratio = self.options.pixel_ratio;
        let ts = self.time_scale.borrow();
        let spacing = ts.bar_spacing();
        let slot = |time: Timestamp| -> Option<f64> {
            let index = ts.index_of(time)?;
            let x = ts.index_to_coordinate(index as f64);
            (x >= -spacing && x <= ts.width() + spacing).then_some(x)
        };

        for series in self.series.iter().filter(|s| s.options.visible && s.options.kind == kind) {
            let scale = match series.options.scale {
                PriceScaleId::Left => &self.left_scale,
                PriceScaleId::Right => &self.right_scale,
                PriceScaleId::Overlay => &self.overlay_scale,
            };
            match (&series.data, kind) {
                (SeriesData::Bars(bars), SeriesKind::Candlestick) => {
                    let body_width = (spacing * BODY_RATIO).max(1.0) * ratio;
                    for candle in bars {
                        let Some(x) = slot(candle.timestamp) else { continue };
                        let ohlcv = &candle.ohlcv;
                        let color =
                            if candle.is_bullish() { &series.options.up_color } else { &series.options.down_color };
                        let high_y = scale.price_to_coordinate(ohlcv.high.value()) * ratio;
                        let low_y = scale.price_to_coordinate(ohlcv.low.value()) * ratio;
                        let open_y = scale.price_to_coordinate(ohlcv.open.value()) * ratio;
                        let close_y = scale.price_to_coordinate(ohlcv.close.value()) * ratio;
                        let cx = x * ratio;
                        self.surface.stroke_polyline(&[(cx, high_y), (cx, low_y)], color, ratio, false);
                        let body_top = open_y.min(close_y);
                        let body_height = (open_y - close_y).abs().max(ratio);
                        self.surface.fill_rect(cx - body_width / 2.0, body_top, body_width, body_height, color);
                    }
                }
                (SeriesData::Points(points), SeriesKind::Histogram) => {
                    let column_width = (spacing * BODY_RATIO).max(1.0) * ratio;
                    let base_y = scale.price_to_coordinate(0.0) * ratio;
                    for point in points {
                        let Some(x) = slot(point.timestamp) else { continue };
                        let y = scale.price_to_coordinate(point.value) * ratio;
                        let color = point.color.as_deref().unwrap_or(&series.options.color);
                        self.surface.fill_rect(
                            x * ratio - column_width / 2.0,
                            y.min(base_y),
                            column_width,
                            (base_y - y).abs(),
                            color,
                        );
                    }
                }
                (SeriesData::Points(points), SeriesKind::Line | SeriesKind::Area) => {
                    let path: Vec<(f64, f64)> = points
                        .iter()
                        .filter_map(|p| slot(p.timestamp).map(|x| (x * ratio, scale.price_to_coordinate(p.value) * ratio)))
                        .collect();
                    if path.len() > 1 {
                        self.surface.stroke_polyline(
                            &path,
                            &series.options.color,
                            series.options.line_width * ratio,
                            false,
                        );
                    }
                }
                _ => {}
            }
        }
    }

    fn draw_axis_labels(&mut self) {
        let ratio = self.options.pixel_ratio;
        let color = self.options.text_color.clone();
        let has_left = self.series.iter().any(|s| s.options.visible && s.options.scale == PriceScaleId::Left);
        let has_right = self.series.iter().any(|s| s.options.visible && s.options.scale == PriceScaleId::Right);

        if has_left {
            let (min, max) = self.left_scale.range();
            for price in [max, min] {
                let y = self.left_scale.price_to_coordinate(price) * ratio;
                self.surface.fill_text(&format!("{:.2}", price), 4.0 * ratio, y, &color, LABEL_FONT_PX * ratio);
            }
        }
        if has_right {
            let x = (self.options.width - 30.0) * ratio;
            for score in [1.0, 0.0, -1.0] {
                let y = self.right_scale.price_to_coordinate(score) * ratio;
                self.surface.fill_text(&format!("{:+.1}", score), x, y, &color, LABEL_FONT_PX * ratio);
            }
        }

        let labels: Vec<(f64, String)> = {
            let ts = self.time_scale.borrow();
            let Some((first, last)) = ts.visible_indices() else { return };
            let times = ts.times();
            let span = times[last].value() - times[first].value();
            let step = ((last - first) / TIME_LABEL_COUNT).max(1);
            (first..=last)
                .step_by(step)
                .map(|i| (ts.index_to_coordinate(i as f64), format_time_label(times[i], span)))
                .collect()
        };
        let y = (self.options.height - 4.0) * ratio;
        for (x, label) in labels {
            self.surface.fill_text(&label, x * ratio, y, &color, LABEL_FONT_PX * ratio);
        }
    }

    fn draw_crosshair(&mut self) {
        let Some((x, y)) = self.crosshair else { return };
        let ratio = self.options.pixel_ratio;
        let snapped_x = {
            let ts = self.time_scale.borrow();
            ts.coordinate_to_logical(x).map(|index| ts.index_to_coordinate(index as f64)).unwrap_or(x)
        };
        let (width, height) = (self.options.width * ratio, self.options.height * ratio);
        let color = self.options.crosshair_color.clone();
        self.surface.stroke_polyline(&[(snapped_x * ratio, 0.0), (snapped_x * ratio, height)], &color, ratio, true);
        self.surface.stroke_polyline(&[(0.0, y * ratio), (width, y * ratio)], &color, ratio, true);
    }
}

impl<S: Surface> HostChart for CanvasChart<S> {
    fn add_series(&mut self, options: SeriesOptions) -> SeriesId {
        let id = SeriesId(self.next_series_id);
        self.next_series_id += 1;
        if self.removed {
            return id;
        }
        log_debug!(LogComponent::Infrastructure("CanvasChart"), "add {} {}", options.kind, id);
        self.series.push(Series::new(id, options));
        self.request_redraw();
        id
    }

    fn remove_series(&mut self, series: SeriesId) {
        let detached: Vec<PrimitiveId> =
            self.primitives.iter().filter(|p| p.series == series).map(|p| p.id).collect();
        for id in detached {
            self.detach_primitive(id);
        }
        self.series.retain(|s| s.id != series);
        self.rebuild_time_points();
        self.request_redraw();
    }

    fn set_series_data(&mut self, series: SeriesId, data: SeriesData) {
        if self.removed {
            return;
        }
        let Some(target) = self.series_mut(series) else { return };
        target.data = data;
        self.rebuild_time_points();
        self.request_redraw();
    }

    fn set_series_visible(&mut self, series: SeriesId, visible: bool) {
        if let Some(target) = self.series_mut(series) {
            target.options.visible = visible;
            self.request_redraw();
        }
    }

    fn is_series_visible(&self, series: SeriesId) -> bool {
        self.series.iter().any(|s| s.id == series && s.options.visible)
    }

    fn sample(&self, series: SeriesId, time: Timestamp) -> Option<SeriesValue> {
        self.series.iter().find(|s| s.id == series && s.options.visible)?.data.value_at(time)
    }

    fn time_to_coordinate(&self, time: Timestamp) -> Option<f64> {
        self.time_scale.borrow().time_to_coordinate(time)
    }

    fn coordinate_to_time(&self, x: f64) -> Option<Timestamp> {
        self.time_scale.borrow().coordinate_to_time(x)
    }

    fn bar_spacing(&self) -> f64 {
        self.time_scale.borrow().bar_spacing()
    }

    fn fit_content(&mut self) {
        if self.removed {
            return;
        }
        self.time_scale.borrow_mut().fit_content();
        self.request_redraw();
    }

    fn width(&self) -> f64 {
        self.options.width
    }

    fn height(&self) -> f64 {
        self.options.height
    }

    fn resize(&mut self, width: f64, height: f64) {
        if self.removed || !(width.is_finite() && height.is_finite()) {
            return;
        }
        self.options.width = width.max(0.0);
        self.options.height = height.max(0.0);
        self.time_scale.borrow_mut().set_width(self.options.width);
        for scale in [&mut self.left_scale, &mut self.right_scale, &mut self.overlay_scale] {
            scale.set_height(self.options.height);
        }
        self.request_redraw();
    }

    fn subscribe_crosshair_move(&mut self, handler: CrosshairHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription_id);
        self.next_subscription_id += 1;
        if !self.removed {
            self.subscribers.push((id, handler));
        }
        id
    }

    fn unsubscribe_crosshair_move(&mut self, subscription: SubscriptionId) {
        self.subscribers.retain(|(id, _)| *id != subscription);
    }

    fn set_crosshair_position(&mut self, x: f64, y: f64) {
        if self.removed {
            return;
        }
        self.crosshair = Some((x, y));
        let event = self.build_crosshair_event(Some((x, y)));
        self.notify_crosshair(&event);
        self.request_redraw();
    }

    fn clear_crosshair_position(&mut self) {
        if self.removed || self.crosshair.is_none() {
            return;
        }
        self.crosshair = None;
        let event = self.build_crosshair_event(None);
        self.notify_crosshair(&event);
        self.request_redraw();
    }

    fn attach_primitive(&mut self, series: SeriesId, primitive: PrimitiveRef) -> Option<PrimitiveId> {
        if self.removed || !self.series.iter().any(|s| s.id == series) {
            return None;
        }
        let id = PrimitiveId(self.next_primitive_id);
        self.next_primitive_id += 1;
        primitive.borrow_mut().attached(AttachContext {
            coordinates: Rc::new(TimeScaleCoordinates(Rc::clone(&self.time_scale))),
            redraw: self.redraw.clone(),
        });
        self.primitives.push(AttachedPrimitive { id, series, primitive });
        Some(id)
    }

    fn detach_primitive(&mut self, primitive: PrimitiveId) {
        if let Some(pos) = self.primitives.iter().position(|p| p.id == primitive) {
            let attached = self.primitives.remove(pos);
            attached.primitive.borrow_mut().detached();
            self.request_redraw();
        }
    }

    fn request_redraw(&self) {
        if !self.removed {
            self.redraw.request();
        }
    }

    fn remove(&mut self) {
        if self.removed {
            return;
        }
        for attached in self.primitives.drain(..) {
            attached.primitive.borrow_mut().detached();
        }
        self.subscribers.clear();
        self.series.clear();
        self.crosshair = None;
        self.time_scale.borrow_mut().set_times(Vec::new());
        self.removed = true;
        log_debug!(LogComponent::Infrastructure("CanvasChart"), "chart removed");
    }
}
