use crate::domain::chart::Surface;

/// One recorded draw call, bitmap pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Clear { width: f64, height: f64, color: String },
    FillRect { x: f64, y: f64, width: f64, height: f64, color: String },
    Polyline { points: Vec<(f64, f64)>, color: String, line_width: f64, dashed: bool },
    Text { text: String, x: f64, y: f64, color: String },
}

/// Surface that records calls instead of drawing. Used off-browser.
#[derive(Debug, Default, Clone)]
pub struct RecordingSurface {
    pub calls: Vec<DrawCall>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.calls.clear();
    }

    /// Filled rectangles with the given colour, in draw order.
    pub fn rects_with_color(&self, color: &str) -> Vec<(f64, f64, f64, f64)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::FillRect { x, y, width, height, color: c } if c == color => Some((*x, *y, *width, *height)),
                _ => None,
            })
            .collect()
    }

    pub fn fill_count(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, DrawCall::FillRect { .. })).count()
    }

    pub fn position_of(&self, predicate: impl Fn(&DrawCall) -> bool) -> Option<usize> {
        self.calls.iter().position(predicate)
    }
}

impl Surface for RecordingSurface {
    fn clear(&mut self, width: f64, height: f64, color: &str) {
        self.calls.push(DrawCall::Clear { width, height, color: color.to_string() });
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: &str) {
        self.calls.push(DrawCall::FillRect { x, y, width, height, color: color.to_string() });
    }

    fn stroke_polyline(&mut self, points: &[(f64, f64)], color: &str, line_width: f64, dashed: bool) {
        self.calls.push(DrawCall::Polyline { points: points.to_vec(), color: color.to_string(), line_width, dashed });
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, color: &str, _font_px: f64) {
        self.calls.push(DrawCall::Text { text: text.to_string(), x, y, color: color.to_string() });
    }
}
