//! Table instance: one dataset, its columns, and the filter/sort/viewport
//! state driving what gets rendered.
//!
//! Every setter recomputes synchronously before returning:
//! - dataset, filter changes: re-filter, re-sort, re-layout
//! - sort changes: re-sort, re-layout (the filtered rows are reused)
//! - scroll, resize, overscan: range only (two binary searches)
//! - row measurements: patch offsets after the row, range
//!
//! Re-layout discards all measurements, since a logical index no longer
//! refers to the same record once the order changes.

use log::{debug, trace, warn};
use serde::Serialize;

use crate::config::TableConfig;
use crate::error::Result;
use crate::filter::filter_rows;
use crate::layout::{Align, MeasurementCache, Viewport, VirtualRange, Virtualizer};
use crate::sort::sort_rows;
use crate::types::{
    Column, Columns, FilterState, Predicate, RowDataset, RowId, SortState,
    DEFAULT_ESTIMATED_SIZE,
};

/// Observable engine state. Recomputation happens inside each setter, so it
/// never shows up here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TablePhase {
    /// No rows after filtering
    Empty,
    /// Rows present and the rendered range is current
    Steady,
}

/// A row handed to the renderer.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedRow<'a, R> {
    /// Logical index
    pub index: usize,
    pub row_id: RowId,
    pub start: f64,
    pub size: f64,
    pub record: &'a R,
}

/// Everything the renderer needs for one paint: the rows to mount and the
/// two spacer sizes around them.
///
/// `padding_top + Σ row sizes + padding_bottom == total_extent`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame<'a, R> {
    pub rendered_rows: Vec<RenderedRow<'a, R>>,
    pub padding_top: f64,
    pub padding_bottom: f64,
    pub total_extent: f64,
    pub scroll_offset: f64,
}

pub struct Table<R> {
    dataset: RowDataset<R>,
    columns: Columns<R>,
    config: TableConfig,
    filter: FilterState,
    sort: SortState,
    /// Filter stage output, in dataset order
    filtered: Vec<RowId>,
    /// Sort stage output: the logical order
    ordered: Vec<RowId>,
    cache: MeasurementCache,
    layout: Virtualizer,
    viewport: Viewport,
    range: VirtualRange,
}

impl<R> Table<R> {
    /// Build a table, validating columns and configuration up front.
    pub fn new(
        dataset: RowDataset<R>,
        columns: Vec<Column<R>>,
        config: TableConfig,
    ) -> Result<Self> {
        config.validate()?;
        let columns = Columns::new(columns)?;
        let estimate = config
            .row_estimate
            .or_else(|| columns.row_estimate())
            .unwrap_or(DEFAULT_ESTIMATED_SIZE);

        let mut viewport = Viewport::new();
        viewport.overscan = Viewport::overscan_from(config.overscan);
        viewport.resize(config.viewport_extent, 0.0);

        let mut table = Self {
            dataset,
            columns,
            cache: MeasurementCache::new(estimate, config.min_row_size),
            config,
            filter: FilterState::new(),
            sort: SortState::none(),
            filtered: Vec::new(),
            ordered: Vec::new(),
            layout: Virtualizer::default(),
            viewport,
            range: Virtualizer::default().compute(&viewport),
        };
        table.refilter();
        Ok(table)
    }

    // ── Dataset ───────────────────────────────────────────────────────

    /// Swap in a new dataset. Filter, sort and scroll position reset; the
    /// viewport extent and overscan are kept.
    pub fn replace_dataset(&mut self, dataset: RowDataset<R>) {
        self.dataset = dataset;
        self.filter = FilterState::new();
        self.sort = SortState::none();
        self.viewport.scroll_offset = 0.0;
        self.refilter();
    }

    pub fn dataset(&self) -> &RowDataset<R> {
        &self.dataset
    }

    pub fn columns(&self) -> &Columns<R> {
        &self.columns
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    // ── Filtering ─────────────────────────────────────────────────────

    pub fn set_global_filter(&mut self, text: &str) {
        if self.filter.global_text == text {
            return;
        }
        self.filter.global_text = text.to_string();
        self.refilter();
    }

    /// Install or remove (`None`) the predicate for one column.
    pub fn set_column_filter(&mut self, column_id: &str, predicate: Option<Predicate>) {
        if !self.columns.contains(column_id) {
            warn!("Ignoring filter for unknown column {column_id}");
            return;
        }
        match predicate {
            Some(pred) => {
                self.filter
                    .column_predicates
                    .insert(column_id.to_string(), pred);
            }
            None => {
                if self.filter.column_predicates.remove(column_id).is_none() {
                    return;
                }
            }
        }
        self.refilter();
    }

    /// Replace the whole filter state in one recomputation.
    pub fn set_filter_state(&mut self, mut state: FilterState) {
        state.column_predicates.retain(|id, _| {
            let known = self.columns.contains(id);
            if !known {
                warn!("Dropping filter for unknown column {id}");
            }
            known
        });
        self.filter = state;
        self.refilter();
    }

    pub fn clear_filters(&mut self) {
        if self.filter.is_identity() {
            return;
        }
        self.set_filter_state(FilterState::new());
    }

    pub fn filter_state(&self) -> &FilterState {
        &self.filter
    }

    // ── Sorting ───────────────────────────────────────────────────────

    /// Advance the sort cycle for `column_id` (none → asc → desc → none);
    /// a different column starts at asc.
    pub fn toggle_sort(&mut self, column_id: &str) -> &SortState {
        if !self.columns.contains(column_id) {
            warn!("Ignoring sort toggle on unknown column {column_id}");
            return &self.sort;
        }
        self.sort = self.sort.toggled(column_id);
        self.resort();
        &self.sort
    }

    pub fn set_sort(&mut self, state: SortState) {
        if let Some(column_id) = &state.column {
            if !self.columns.contains(column_id) {
                warn!("Ignoring sort on unknown column {column_id}");
                return;
            }
        }
        if state == self.sort {
            return;
        }
        self.sort = state;
        self.resort();
    }

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    // ── Viewport ──────────────────────────────────────────────────────

    pub fn set_scroll_offset(&mut self, offset: f64) {
        self.viewport.set_scroll(offset, self.layout.total_extent());
        self.recompute_range();
    }

    pub fn scroll_by(&mut self, delta: f64) {
        self.viewport.scroll_by(delta, self.layout.total_extent());
        self.recompute_range();
    }

    /// Scroll so the row at logical `index` sits at `align`.
    pub fn scroll_to_row(&mut self, index: usize, align: Align) {
        if index >= self.len() {
            return;
        }
        self.viewport.scroll_to(
            self.layout.offset(index),
            self.layout.size(index),
            align,
            self.layout.total_extent(),
        );
        self.recompute_range();
    }

    pub fn set_viewport_extent(&mut self, extent: f64) {
        self.viewport.resize(extent, self.layout.total_extent());
        self.recompute_range();
    }

    /// Negative values mean no overscan.
    pub fn set_overscan(&mut self, overscan: i64) {
        self.viewport.overscan = Viewport::overscan_from(overscan);
        self.recompute_range();
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Logical index of the row under content offset `pos`.
    pub fn row_at_offset(&self, pos: f64) -> Option<usize> {
        self.layout.row_at(pos)
    }

    // ── Measurement ───────────────────────────────────────────────────

    /// Record the rendered size of the row at logical `index`.
    ///
    /// Safe to call repeatedly and out of order. When the row lies entirely
    /// above the scroll position, the scroll offset moves by the size change
    /// so the row under the viewport's top edge stays put.
    pub fn on_row_measured(&mut self, index: usize, size: f64) {
        if index >= self.len() {
            warn!(
                "Ignoring measurement for row {index}, only {} rows",
                self.len()
            );
            return;
        }
        let (size, _previous) = self.cache.record(index, size);
        let row_end_before = self.layout.offset(index + 1);
        let delta = self.layout.resize_row(index, size);
        if delta != 0.0 && row_end_before <= self.viewport.scroll_offset {
            self.viewport.scroll_offset += delta;
        }
        self.viewport.clamp_scroll(self.layout.total_extent());
        self.recompute_range();
    }

    pub fn is_measured(&self, index: usize) -> bool {
        self.cache.is_measured(index)
    }

    // ── Output ────────────────────────────────────────────────────────

    /// Number of rows after filtering.
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn phase(&self) -> TablePhase {
        if self.is_empty() {
            TablePhase::Empty
        } else {
            TablePhase::Steady
        }
    }

    pub fn total_extent(&self) -> f64 {
        self.layout.total_extent()
    }

    /// Range computed by the last recomputation.
    pub fn range(&self) -> &VirtualRange {
        &self.range
    }

    /// Row identities in logical (filtered + sorted) order.
    pub fn ordered_rows(&self) -> &[RowId] {
        &self.ordered
    }

    /// Records in logical order, independent of what is rendered.
    pub fn ordered_records(&self) -> impl Iterator<Item = &R> + '_ {
        self.ordered.iter().filter_map(|&id| self.dataset.get(id))
    }

    pub fn row_id_at(&self, index: usize) -> Option<RowId> {
        self.ordered.get(index).copied()
    }

    pub fn record_at(&self, index: usize) -> Option<&R> {
        self.row_id_at(index).and_then(|id| self.dataset.get(id))
    }

    /// Current logical index of a record.
    pub fn index_of(&self, row_id: RowId) -> Option<usize> {
        self.ordered.iter().position(|&id| id == row_id)
    }

    /// Renderer output for the current state.
    pub fn frame(&self) -> Frame<'_, R> {
        let rendered_rows = self
            .layout
            .rows(&self.range)
            .into_iter()
            .filter_map(|row| {
                let row_id = self.row_id_at(row.index)?;
                let record = self.dataset.get(row_id)?;
                Some(RenderedRow {
                    index: row.index,
                    row_id,
                    start: row.start,
                    size: row.size,
                    record,
                })
            })
            .collect();
        Frame {
            rendered_rows,
            padding_top: self.range.padding_top,
            padding_bottom: self.range.padding_bottom,
            total_extent: self.range.total_extent,
            scroll_offset: self.range.scroll_offset,
        }
    }

    // ── Recomputation ─────────────────────────────────────────────────

    fn refilter(&mut self) {
        self.filtered = filter_rows(&self.dataset, &self.columns, &self.filter);
        debug!(
            "Filtered {} of {} rows ({:?})",
            self.filtered.len(),
            self.dataset.len(),
            self.filter
        );
        self.resort();
    }

    fn resort(&mut self) {
        let (column, direction) = match self.sort.active() {
            Some((id, dir)) => (self.columns.get(id), Some(dir)),
            None => (None, None),
        };
        self.ordered = sort_rows(&self.dataset, &self.filtered, column, direction);
        debug!("Sorted {} rows by {:?}", self.ordered.len(), self.sort);
        self.relayout();
    }

    fn relayout(&mut self) {
        self.cache.clear();
        self.layout = Virtualizer::new(self.ordered.len(), &self.cache);
        self.viewport.clamp_scroll(self.layout.total_extent());
        self.recompute_range();
    }

    fn recompute_range(&mut self) {
        self.range = self.layout.compute(&self.viewport);
        self.viewport.scroll_offset = self.range.scroll_offset;
        trace!(
            "Range {}..{} at {} of {}",
            self.range.start,
            self.range.end,
            self.range.scroll_offset,
            self.range.total_extent
        );
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
    use crate::types::{SortDirection, Value};
    use std::rc::Rc;

    #[derive(Debug, PartialEq)]
    struct Row {
        n: f64,
    }

    fn table(len: usize) -> Table<Row> {
        #[allow(clippy::cast_precision_loss)]
        let rows = (0..len).map(|i| Row { n: i as f64 }).collect();
        Table::new(
            RowDataset::new(rows),
            vec![Column::new("n", |r: &Row| Value::Number(r.n))],
            TableConfig::default()
                .with_overscan(0)
                .with_viewport_extent(100.0),
        )
        .unwrap()
    }

    #[test]
    fn test_new_uses_column_estimate() {
        let t = table(10);
        assert_eq!(t.total_extent(), 350.0);
        assert_eq!(t.phase(), TablePhase::Steady);
        assert_eq!((t.range().start, t.range().end), (0, 3));
    }

    #[test]
    fn test_duplicate_columns_fail_construction() {
        let cols = vec![
            Column::new("n", |r: &Row| Value::Number(r.n)),
            Column::new("n", |r: &Row| Value::Number(r.n)),
        ];
        assert!(Table::new(RowDataset::empty(), cols, TableConfig::default()).is_err());
    }

    #[test]
    fn test_measure_above_scroll_compensates() {
        let mut t = table(10);
        t.set_scroll_offset(70.0);
        t.on_row_measured(0, 70.0);
        assert_eq!(t.viewport().scroll_offset, 105.0);
        // Row under the top edge is still row 2
        assert_eq!(t.range().start, 2);
    }

    #[test]
    fn test_measure_visible_row_does_not_shift() {
        let mut t = table(10);
        t.on_row_measured(1, 50.0);
        assert_eq!(t.viewport().scroll_offset, 0.0);
        assert_eq!(t.total_extent(), 365.0);
        assert!(t.is_measured(1));
    }

    #[test]
    fn test_measure_out_of_range_ignored() {
        let mut t = table(3);
        t.on_row_measured(3, 80.0);
        assert_eq!(t.total_extent(), 105.0);
    }

    #[test]
    fn test_sort_change_invalidates_measurements() {
        let mut t = table(10);
        t.on_row_measured(0, 70.0);
        t.toggle_sort("n");
        assert!(!t.is_measured(0));
        assert_eq!(t.total_extent(), 350.0);
    }

    #[test]
    fn test_filter_clamps_scroll() {
        let mut t = table(100);
        t.set_scroll_offset(3000.0);
        t.set_column_filter("n", Some(Rc::new(|v: &Value| v.as_f64().is_some_and(|n| n < 5.0))));
        assert_eq!(t.len(), 5);
        assert_eq!(t.viewport().scroll_offset, 75.0);
        t.set_column_filter("n", None);
        assert_eq!(t.len(), 100);
    }

    #[test]
    fn test_unknown_column_ignored() {
        let mut t = table(4);
        assert_eq!(t.toggle_sort("missing"), &SortState::none());
        t.set_column_filter("missing", Some(Rc::new(|_: &Value| false)));
        assert_eq!(t.len(), 4);
        t.set_sort(SortState::asc("missing"));
        assert_eq!(t.sort_state(), &SortState::none());
    }

    #[test]
    fn test_replace_dataset_resets_state() {
        let mut t = table(10);
        t.set_global_filter("1");
        t.toggle_sort("n");
        t.set_scroll_offset(20.0);
        t.replace_dataset(RowDataset::new(vec![Row { n: 9.0 }, Row { n: 8.0 }]));
        assert!(t.filter_state().is_identity());
        assert_eq!(t.sort_state(), &SortState::none());
        assert_eq!(t.viewport().scroll_offset, 0.0);
        assert_eq!(t.record_at(0), Some(&Row { n: 9.0 }));
    }

    #[test]
    fn test_scroll_to_row() {
        let mut t = table(100);
        t.scroll_to_row(50, Align::Start);
        assert_eq!(t.viewport().scroll_offset, 1750.0);
        assert_eq!(t.range().start, 50);
        t.scroll_to_row(500, Align::Start);
        assert_eq!(t.viewport().scroll_offset, 1750.0);
    }

    #[test]
    fn test_index_of_follows_sort() {
        let mut t = table(5);
        t.set_sort(SortState {
            column: Some("n".to_string()),
            direction: Some(SortDirection::Desc),
        });
        assert_eq!(t.index_of(RowId(4)), Some(0));
        assert_eq!(t.row_at_offset(40.0), Some(1));
    }

    #[test]
    fn test_empty_phase() {
        let mut t = table(3);
        t.set_global_filter("zzz");
        assert_eq!(t.phase(), TablePhase::Empty);
        let frame = t.frame();
        assert!(frame.rendered_rows.is_empty());
        assert_eq!(frame.total_extent, 0.0);
        t.clear_filters();
        assert_eq!(t.len(), 3);
    }
}
