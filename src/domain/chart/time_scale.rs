use crate::domain::market_data::Timestamp;

pub const DEFAULT_BAR_SPACING: f64 = 6.0;
pub const MIN_BAR_SPACING: f64 = 0.5;
pub const MAX_BAR_SPACING: f64 = 50.0;

/// Shared horizontal axis of every series on a chart.
///
/// Bars are laid out by logical index, so closed-market periods take no
/// horizontal space. `right_offset` is the number of empty bar slots after
/// the last bar.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeScale {
    times: Vec<Timestamp>,
    width: f64,
    bar_spacing: f64,
    right_offset: f64,
}

impl TimeScale {
    pub fn new(width: f64) -> Self {
        Self { times: Vec::new(), width: width.max(0.0), bar_spacing: DEFAULT_BAR_SPACING, right_offset: 0.0 }
    }

    /// Replace the point set with the sorted, deduplicated union of `times`.
    pub fn set_times(&mut self, mut times: Vec<Timestamp>) {
        times.sort_unstable();
        times.dedup();
        self.times = times;
    }

    pub fn times(&self) -> &[Timestamp] {
        &self.times
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn bar_spacing(&self) -> f64 {
        self.bar_spacing
    }

    pub fn right_offset(&self) -> f64 {
        self.right_offset
    }

    pub fn set_width(&mut self, width: f64) {
        self.width = width.max(0.0);
    }

    pub fn set_bar_spacing(&mut self, spacing: f64) {
        if spacing.is_finite() {
            self.bar_spacing = spacing.clamp(MIN_BAR_SPACING, MAX_BAR_SPACING);
        }
    }

    pub fn set_right_offset(&mut self, offset: f64) {
        if offset.is_finite() {
            self.right_offset = offset;
        }
    }

    fn last_index(&self) -> f64 {
        self.times.len().saturating_sub(1) as f64
    }

    /// Bar centre for a (possibly fractional) logical index.
    pub fn index_to_coordinate(&self, index: f64) -> f64 {
        self.width - (self.last_index() + self.right_offset - index + 0.5) * self.bar_spacing
    }

    /// Fractional logical index under `x`.
    pub fn coordinate_to_index(&self, x: f64) -> f64 {
        self.last_index() + self.right_offset + 0.5 - (self.width - x) / self.bar_spacing
    }

    /// Pixel x of a bar at `time`; `None` when there is no bar at that time
    /// or the bar is scrolled out of the plot.
    pub fn time_to_coordinate(&self, time: Timestamp) -> Option<f64> {
        let index = self.times.binary_search(&time).ok()?;
        let x = self.index_to_coordinate(index as f64);
        (0.0..=self.width).contains(&x).then_some(x)
    }

    /// Nearest bar index under `x`, if `x` is on the plot and a bar is there.
    pub fn coordinate_to_logical(&self, x: f64) -> Option<usize> {
        if self.times.is_empty() || !(0.0..=self.width).contains(&x) {
            return None;
        }
        let index = self.coordinate_to_index(x).round();
        (index >= 0.0 && index <= self.last_index()).then_some(index as usize)
    }

    pub fn coordinate_to_time(&self, x: f64) -> Option<Timestamp> {
        self.coordinate_to_logical(x).map(|index| self.times[index])
    }

    pub fn index_of(&self, time: Timestamp) -> Option<usize> {
        self.times.binary_search(&time).ok()
    }

    /// Fractional index range covered by the plot width.
    pub fn visible_logical_range(&self) -> (f64, f64) {
        (self.coordinate_to_index(0.0), self.coordinate_to_index(self.width))
    }

    /// Clamped integer index range of bars that are at least partly visible.
    pub fn visible_indices(&self) -> Option<(usize, usize)> {
        if self.times.is_empty() {
            return None;
        }
        let (from, to) = self.visible_logical_range();
        let first = from.floor().max(0.0);
        let last = to.ceil().min(self.last_index());
        (first <= last).then_some((first as usize, last as usize))
    }

    /// Fit every bar into the width.
    pub fn fit_content(&mut self) {
        self.right_offset = 0.0;
        if self.times.is_empty() || self.width <= 0.0 {
            return;
        }
        self.set_bar_spacing(self.width / self.times.len() as f64);
    }

    /// Change spacing while keeping the bar under `anchor_x` in place.
    pub fn zoom_at(&mut self, anchor_x: f64, factor: f64) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        let anchor_index = self.coordinate_to_index(anchor_x);
        self.set_bar_spacing(self.bar_spacing * factor);
        self.right_offset = (self.width - anchor_x) / self.bar_spacing - self.last_index() + anchor_index - 0.5;
    }

    /// Pan by whole or fractional bars; positive values reveal newer bars.
    pub fn scroll_by_bars(&mut self, bars: f64) {
        if bars.is_finite() {
            self.right_offset -= bars;
        }
    }

    pub fn scroll_by_pixels(&mut self, delta_px: f64) {
        self.scroll_by_bars(-delta_px / self.bar_spacing);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scale(n: i64, width: f64) -> TimeScale {
        let mut ts = TimeScale::new(width);
        ts.set_times((0..n).map(|i| Timestamp::from_secs(i * 60)).collect());
        ts
    }

    #[test]
    fn fit_content_spreads_bars_over_width() {
        let mut ts = scale(10, 100.0);
        ts.fit_content();
        assert_eq!(ts.bar_spacing(), 10.0);
        assert_eq!(ts.time_to_coordinate(Timestamp::from_secs(0)), Some(5.0));
        assert_eq!(ts.time_to_coordinate(Timestamp::from_secs(9 * 60)), Some(95.0));
    }

    #[test]
    fn coordinate_round_trip() {
        let mut ts = scale(10, 100.0);
        ts.fit_content();
        for i in 0..10 {
            let t = Timestamp::from_secs(i * 60);
            let x = ts.time_to_coordinate(t).unwrap();
            assert_eq!(ts.coordinate_to_time(x), Some(t));
        }
    }

    #[test]
    fn unknown_or_scrolled_out_times_are_none() {
        let mut ts = scale(10, 100.0);
        ts.set_bar_spacing(20.0);
        assert_eq!(ts.time_to_coordinate(Timestamp::from_secs(30)), None);
        assert_eq!(ts.time_to_coordinate(Timestamp::from_secs(0)), None);
        assert!(ts.time_to_coordinate(Timestamp::from_secs(9 * 60)).is_some());
    }

    #[test]
    fn zoom_keeps_anchor_bar() {
        let mut ts = scale(50, 500.0);
        ts.fit_content();
        let before = ts.coordinate_to_index(250.0);
        ts.zoom_at(250.0, 2.0);
        assert!((ts.coordinate_to_index(250.0) - before).abs() < 1e-9);
        assert_eq!(ts.bar_spacing(), 20.0);
    }
}
