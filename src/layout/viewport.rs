//! Viewport state management for scrolling.

use serde::Serialize;

/// Viewport state: where the visible window sits along the scroll axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    /// Scroll position in content coordinates
    pub scroll_offset: f64,
    /// Visible length along the scroll axis
    pub extent: f64,
    /// Extra rows rendered on each side of the visible range
    pub overscan: usize,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

/// Where a row lands in the viewport after [`Viewport::scroll_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Start,
    Center,
    End,
}

impl Viewport {
    pub fn new() -> Self {
        Self {
            scroll_offset: 0.0,
            extent: 0.0,
            overscan: 0,
        }
    }

    /// Overscan from a signed setting; negative values mean none.
    pub fn overscan_from(value: i64) -> usize {
        usize::try_from(value).unwrap_or(0)
    }

    /// Largest scroll offset for content of `total_extent`.
    pub fn max_scroll(&self, total_extent: f64) -> f64 {
        (total_extent - self.extent.max(0.0)).max(0.0)
    }

    /// Clamp scroll position to `[0, total_extent - extent]`.
    pub fn clamp_scroll(&mut self, total_extent: f64) {
        let max = self.max_scroll(total_extent);
        self.scroll_offset = if self.scroll_offset.is_finite() {
            self.scroll_offset.clamp(0.0, max)
        } else {
            0.0
        };
    }

    /// Scroll by a delta.
    pub fn scroll_by(&mut self, delta: f64, total_extent: f64) {
        self.scroll_offset += delta;
        self.clamp_scroll(total_extent);
    }

    /// Set absolute scroll position.
    pub fn set_scroll(&mut self, offset: f64, total_extent: f64) {
        self.scroll_offset = offset;
        self.clamp_scroll(total_extent);
    }

    /// Bring the span `[start, start + size)` into view.
    pub fn scroll_to(&mut self, start: f64, size: f64, align: Align, total_extent: f64) {
        let target = match align {
            Align::Start => start,
            Align::Center => start + size / 2.0 - self.extent / 2.0,
            Align::End => start + size - self.extent,
        };
        self.set_scroll(target, total_extent);
    }

    /// Resize the viewport. Negative or non-finite extents collapse to 0.
    pub fn resize(&mut self, extent: f64, total_extent: f64) {
        self.extent = if extent.is_finite() { extent.max(0.0) } else { 0.0 };
        self.clamp_scroll(total_extent);
    }
}
