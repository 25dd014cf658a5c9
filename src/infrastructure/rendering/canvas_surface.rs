use js_sys::Array;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::domain::chart::Surface;
use crate::domain::errors::{ChartError, ChartResult};
use crate::domain::logging::LogComponent;
use crate::log_warn;

/// Canvas 2D drawing target. Coordinates are bitmap pixels.
pub struct Canvas2dSurface {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl Canvas2dSurface {
    pub fn new(canvas: HtmlCanvasElement) -> ChartResult<Self> {
        let context = canvas
            .get_context("2d")
            .map_err(|_| ChartError::Host("Failed to get 2D context".to_string()))?
            .ok_or_else(|| ChartError::Host("2D context unavailable".to_string()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| ChartError::Host("Failed to cast to 2D context".to_string()))?;
        Ok(Self { canvas, context })
    }

    /// Size the backing store in device pixels and the element in CSS pixels.
    pub fn set_size(&self, media_width: f64, media_height: f64, pixel_ratio: f64) {
        self.canvas.set_width((media_width * pixel_ratio).round().max(1.0) as u32);
        self.canvas.set_height((media_height * pixel_ratio).round().max(1.0) as u32);
        let style = format!("width: {}px; height: {}px;", media_width, media_height);
        if self.canvas.set_attribute("style", &style).is_err() {
            log_warn!(LogComponent::Infrastructure("Canvas2dSurface"), "failed to set canvas style");
        }
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }
}

impl Surface for Canvas2dSurface {
    fn clear(&mut self, width: f64, height: f64, color: &str) {
        self.context.clear_rect(0.0, 0.0, width, height);
        self.context.set_fill_style_str(color);
        self.context.fill_rect(0.0, 0.0, width, height);
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: &str) {
        self.context.set_fill_style_str(color);
        self.context.fill_rect(x, y, width, height);
    }

    fn stroke_polyline(&mut self, points: &[(f64, f64)], color: &str, line_width: f64, dashed: bool) {
        let Some(((x0, y0), rest)) = points.split_first() else { return };
        let dash = Array::new();
        if dashed {
            dash.push(&JsValue::from_f64(4.0 * line_width));
            dash.push(&JsValue::from_f64(4.0 * line_width));
        }
        let _ = self.context.set_line_dash(&dash);
        self.context.set_stroke_style_str(color);
        self.context.set_line_width(line_width);
        self.context.begin_path();
        self.context.move_to(*x0, *y0);
        for (x, y) in rest {
            self.context.line_to(*x, *y);
        }
        self.context.stroke();
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, color: &str, font_px: f64) {
        self.context.set_fill_style_str(color);
        self.context.set_font(&format!("{}px -apple-system, BlinkMacSystemFont, sans-serif", font_px));
        let _ = self.context.fill_text(text, x, y);
    }
}
