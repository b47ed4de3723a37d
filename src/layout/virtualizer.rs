//! Cumulative row offsets and visible-range computation.
//!
//! Offsets are computed once per structural change (dataset, filter or sort)
//! and patched in place when a single row is re-measured, so a scroll event
//! only costs two binary searches.

use serde::Serialize;

use super::{MeasurementCache, Viewport};

/// Pre-computed row positions for the current logical order.
#[derive(Debug, Clone)]
pub struct Virtualizer {
    /// Cumulative row positions (`offsets[i]` = start of row i; last entry is
    /// the total extent)
    offsets: Vec<f64>,
}

/// One row the renderer must draw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualRow {
    /// Logical index
    pub index: usize,
    /// Absolute start offset
    pub start: f64,
    pub size: f64,
}

/// Result of one range computation: rows `[start, end)` plus the spacer sizes
/// around them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualRange {
    pub start: usize,
    /// Exclusive
    pub end: usize,
    pub padding_top: f64,
    pub padding_bottom: f64,
    pub total_extent: f64,
    /// Scroll offset the range was computed for, after clamping
    pub scroll_offset: f64,
}

impl VirtualRange {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start..self.end).contains(&index)
    }
}

impl Default for Virtualizer {
    fn default() -> Self {
        Self { offsets: vec![0.0] }
    }
}

impl Virtualizer {
    /// Lay out `len` rows using the cache's measurement or estimate for each.
    pub fn new(len: usize, cache: &MeasurementCache) -> Self {
        let mut offsets = Vec::with_capacity(len + 1);
        let mut y = 0.0;
        for index in 0..len {
            offsets.push(y);
            y += cache.estimate(index);
        }
        offsets.push(y); // Final edge
        Self { offsets }
    }

    /// Number of rows laid out.
    pub fn len(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total_extent(&self) -> f64 {
        self.offsets.last().copied().unwrap_or(0.0)
    }

    /// Start offset of `index`; the total extent for `index >= len`.
    pub fn offset(&self, index: usize) -> f64 {
        self.offsets
            .get(index)
            .copied()
            .unwrap_or_else(|| self.total_extent())
    }

    pub fn size(&self, index: usize) -> f64 {
        if index >= self.len() {
            return 0.0;
        }
        self.offset(index + 1) - self.offset(index)
    }

    /// Set the size of one row, shifting every later offset.
    ///
    /// Returns the change in size (0 when unchanged or out of range).
    pub fn resize_row(&mut self, index: usize, size: f64) -> f64 {
        if index >= self.len() {
            return 0.0;
        }
        let delta = size - self.size(index);
        if delta.abs() <= f64::EPSILON {
            return 0.0;
        }
        for pos in self.offsets.iter_mut().skip(index + 1) {
            *pos += delta;
        }
        delta
    }

    /// Row whose extent contains `pos` (binary search).
    ///
    /// `None` when there are no rows or `pos` is at or past the end.
    pub fn row_at(&self, pos: f64) -> Option<usize> {
        let ends = self.offsets.get(1..)?;
        let index = ends.partition_point(|&end| end <= pos);
        (index < self.len()).then_some(index)
    }

    /// Rows to render for `viewport`, including overscan.
    ///
    /// The scroll offset is clamped first. An empty layout or a viewport with
    /// no extent gives an empty range whose paddings still add up to the
    /// total extent.
    pub fn compute(&self, viewport: &Viewport) -> VirtualRange {
        let len = self.len();
        let total_extent = self.total_extent();
        let mut vp = *viewport;
        vp.clamp_scroll(total_extent);
        let scroll = vp.scroll_offset;

        if len == 0 || vp.extent <= 0.0 {
            return VirtualRange {
                start: 0,
                end: 0,
                padding_top: 0.0,
                padding_bottom: total_extent,
                total_extent,
                scroll_offset: scroll,
            };
        }

        let first = self.row_at(scroll).unwrap_or(len - 1);
        let trailing_edge = scroll + vp.extent;
        let starts = self.offsets.get(..len).unwrap_or_default();
        let past_end = starts
            .partition_point(|&start| start < trailing_edge)
            .clamp(first + 1, len);

        let start = first.saturating_sub(vp.overscan);
        let end = past_end.saturating_add(vp.overscan).min(len);

        let padding_top = self.offset(start);
        VirtualRange {
            start,
            end,
            padding_top,
            padding_bottom: total_extent - self.offset(end),
            total_extent,
            scroll_offset: scroll,
        }
    }

    /// Position and size of each row in `range`.
    pub fn rows(&self, range: &VirtualRange) -> Vec<VirtualRow> {
        (range.start..range.end.min(self.len()))
            .map(|index| VirtualRow {
                index,
                start: self.offset(index),
                size: self.size(index),
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp
)]
mod tests {
    use super::*;

    fn uniform(len: usize, size: f64) -> Virtualizer {
        Virtualizer::new(len, &MeasurementCache::new(size, 1.0))
    }

    fn viewport(scroll: f64, extent: f64, overscan: usize) -> Viewport {
        Viewport {
            scroll_offset: scroll,
            extent,
            overscan,
        }
    }

    #[test]
    fn test_basic_layout() {
        let v = uniform(10, 35.0);
        assert_eq!(v.len(), 10);
        assert_eq!(v.total_extent(), 350.0);
        assert_eq!(v.offset(3), 105.0);
        assert_eq!(v.size(9), 35.0);
        assert_eq!(v.size(10), 0.0);
    }

    #[test]
    fn test_row_at() {
        let v = uniform(10, 20.0);
        assert_eq!(v.row_at(0.0), Some(0));
        assert_eq!(v.row_at(10.0), Some(0));
        assert_eq!(v.row_at(20.0), Some(1));
        assert_eq!(v.row_at(50.0), Some(2));
        assert_eq!(v.row_at(200.0), None);
        assert_eq!(Virtualizer::default().row_at(0.0), None);
    }

    #[test]
    fn test_initial_range() {
        let v = uniform(10, 35.0);
        let range = v.compute(&viewport(0.0, 100.0, 0));
        assert_eq!((range.start, range.end), (0, 3));
        assert_eq!(range.padding_top, 0.0);
        assert_eq!(range.padding_bottom, 245.0);
    }

    #[test]
    fn test_overscan_clamped_to_bounds() {
        let v = uniform(10, 35.0);
        let range = v.compute(&viewport(0.0, 100.0, 4));
        assert_eq!((range.start, range.end), (0, 7));
        let range = v.compute(&viewport(250.0, 100.0, 4));
        assert_eq!((range.start, range.end), (3, 10));
        assert_eq!(range.padding_bottom, 0.0);
    }

    #[test]
    fn test_scroll_clamped_before_range() {
        let v = uniform(10, 35.0);
        let range = v.compute(&viewport(10_000.0, 100.0, 0));
        assert_eq!(range.scroll_offset, 250.0);
        assert_eq!((range.start, range.end), (7, 10));
    }

    #[test]
    fn test_resize_row_shifts_tail() {
        let mut v = uniform(10, 35.0);
        assert_eq!(v.resize_row(0, 70.0), 35.0);
        assert_eq!(v.total_extent(), 385.0);
        assert_eq!(v.offset(1), 70.0);
        assert_eq!(v.offset(9), 350.0);
        assert_eq!(v.resize_row(0, 70.0), 0.0);
        assert_eq!(v.resize_row(42, 70.0), 0.0);
    }

    #[test]
    fn test_empty_and_zero_extent() {
        let v = Virtualizer::default();
        let range = v.compute(&viewport(30.0, 100.0, 2));
        assert!(range.is_empty());
        assert_eq!(range.total_extent, 0.0);
        assert_eq!(range.padding_top + range.padding_bottom, 0.0);

        let v = uniform(5, 10.0);
        let range = v.compute(&viewport(0.0, 0.0, 2));
        assert!(range.is_empty());
        assert_eq!(range.padding_bottom, 50.0);
    }

    #[test]
    fn test_rows_positions() {
        let v = uniform(10, 20.0);
        let range = v.compute(&viewport(30.0, 40.0, 0));
        let rows = v.rows(&range);
        let idx: Vec<usize> = rows.iter().map(|r| r.index).collect();
        assert_eq!(idx, vec![1, 2, 3]);
        assert_eq!(rows[0].start, 20.0);
        assert_eq!(rows[2].size, 20.0);
        assert!(range.contains(2));
        assert!(!range.contains(4));
    }
}
