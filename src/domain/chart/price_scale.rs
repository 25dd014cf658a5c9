/// Vertical value axis. Each series is bound to one of these; scales never
/// share a range, only the pane height.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceScale {
    min: f64,
    max: f64,
    height: f64,
    /// Fraction of the pane left empty above the range.
    margin_top: f64,
    /// Fraction of the pane left empty below the range.
    margin_bottom: f64,
    auto_scale: bool,
}

impl PriceScale {
    /// Range follows the visible data.
    pub fn auto(height: f64) -> Self {
        Self { min: 0.0, max: 1.0, height, margin_top: 0.1, margin_bottom: 0.1, auto_scale: true }
    }

    /// Range pinned to `[min, max]`.
    pub fn fixed(min: f64, max: f64, height: f64) -> Self {
        Self { min, max, height, margin_top: 0.05, margin_bottom: 0.05, auto_scale: false }
    }

    pub fn with_margins(mut self, top: f64, bottom: f64) -> Self {
        self.margin_top = top.clamp(0.0, 0.95);
        self.margin_bottom = bottom.clamp(0.0, 0.95 - self.margin_top);
        self
    }

    pub fn range(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn is_auto(&self) -> bool {
        self.auto_scale
    }

    pub fn set_height(&mut self, height: f64) {
        self.height = height.max(0.0);
    }

    /// Refit an auto scale to `values`; fixed scales and empty input are left alone.
    pub fn fit<I: IntoIterator<Item = f64>>(&mut self, values: I) {
        if !self.auto_scale {
            return;
        }
        let (min, max) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if !min.is_finite() {
            return;
        }
        if (max - min).abs() < f64::EPSILON {
            let pad = if min == 0.0 { 1.0 } else { min.abs() * 0.01 };
            self.min = min - pad;
            self.max = max + pad;
        } else {
            self.min = min;
            self.max = max;
        }
    }

    fn plot_top(&self) -> f64 {
        self.height * self.margin_top
    }

    fn plot_height(&self) -> f64 {
        self.height * (1.0 - self.margin_top - self.margin_bottom)
    }

    pub fn price_to_coordinate(&self, price: f64) -> f64 {
        let span = self.max - self.min;
        if span == 0.0 {
            return self.plot_top() + self.plot_height() / 2.0;
        }
        self.plot_top() + (self.max - price) / span * self.plot_height()
    }

    pub fn coordinate_to_price(&self, y: f64) -> f64 {
        let plot_height = self.plot_height();
        if plot_height <= 0.0 {
            return self.min;
        }
        self.max - (y - self.plot_top()) / plot_height * (self.max - self.min)
    }
}
