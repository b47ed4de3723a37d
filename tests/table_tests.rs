//! Table pipeline tests
//!
//! Filter, sort and virtualization behaviour observed through the public
//! `Table` API, including the end-to-end replication scenario.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use simview::filter::{filter_rows, parse_condition};
use simview::sort::sort_rows;
use simview::{
    Align, Column, Columns, FilterState, Replication, RowDataset, RowId, SortDirection,
    SortState, Table, TableConfig, TablePhase, Value,
};
use std::cell::Cell;
use std::rc::Rc;
use test_case::test_case;

#[derive(Debug, Clone, PartialEq)]
struct Item {
    name: String,
    group: Option<u32>,
    score: f64,
}

fn items(n: usize, seed: u64) -> Vec<Item> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| Item {
            name: format!("item-{i}"),
            group: if rng.random_range(0..10) == 0 {
                None
            } else {
                Some(rng.random_range(0..5))
            },
            score: rng.random_range(-100.0..100.0),
        })
        .collect()
}

fn item_columns() -> Vec<Column<Item>> {
    vec![
        Column::new("name", |r: &Item| Value::from(r.name.as_str())),
        Column::new("group", |r: &Item| Value::from(r.group.map(f64::from))),
        Column::new("score", |r: &Item| Value::Number(r.score)).precision(2),
    ]
}

fn item_table(n: usize, config: TableConfig) -> Table<Item> {
    Table::new(RowDataset::new(items(n, 42)), item_columns(), config).unwrap()
}

fn assert_conserved(t: &Table<Item>) {
    let frame = t.frame();
    let rendered: f64 = frame.rendered_rows.iter().map(|r| r.size).sum();
    let sum = frame.padding_top + rendered + frame.padding_bottom;
    assert!(
        (sum - frame.total_extent).abs() < 1e-6,
        "{} + {} + {} != {}",
        frame.padding_top,
        rendered,
        frame.padding_bottom,
        frame.total_extent
    );
}

// ============================================================================
// Conservation
// ============================================================================

#[test_case(0, 0.0, 400.0, 3 ; "empty")]
#[test_case(1, 0.0, 400.0, 3 ; "single row")]
#[test_case(500, 0.0, 400.0, 0 ; "top no overscan")]
#[test_case(500, 5_000.0, 400.0, 3 ; "middle")]
#[test_case(500, 1e9, 400.0, 3 ; "past the end")]
#[test_case(500, 123.4, 0.0, 3 ; "zero extent")]
#[test_case(500, 777.7, 10_000.0, 5 ; "viewport taller than content")]
fn test_conservation(n: usize, scroll: f64, extent: f64, overscan: i64) {
    let mut t = item_table(
        n,
        TableConfig::default()
            .with_overscan(overscan)
            .with_viewport_extent(extent),
    );
    t.set_scroll_offset(scroll);
    assert_conserved(&t);

    // Measure whatever is rendered with whole-number sizes, then move around
    let mut rng = StdRng::seed_from_u64(n as u64);
    for _ in 0..5 {
        let indices: Vec<usize> = t.frame().rendered_rows.iter().map(|r| r.index).collect();
        for index in indices {
            t.on_row_measured(index, f64::from(rng.random_range(10u32..90)));
            assert_conserved(&t);
        }
        t.scroll_by(f64::from(rng.random_range(0u32..600)));
        assert_conserved(&t);
    }

    t.set_global_filter("1");
    assert_conserved(&t);
    t.toggle_sort("score");
    assert_conserved(&t);
}

// ============================================================================
// Filter monotonicity
// ============================================================================

#[test_case(""; "identity")]
#[test_case("item-1"; "prefix")]
#[test_case("ITEM-99"; "case insensitive")]
#[test_case("-"; "every row")]
#[test_case("no such text"; "nothing")]
fn test_filter_never_grows(query: &str) {
    let ds = RowDataset::new(items(300, 7));
    let cols = Columns::new(item_columns()).unwrap();
    let state = FilterState::new()
        .with_global_text(query)
        .with_predicate("score", |v| v.as_f64().is_some_and(|s| s > -50.0));
    let out = filter_rows(&ds, &cols, &state);
    assert!(out.len() <= ds.len());
    assert!(out.windows(2).all(|w| w[0] < w[1]), "dataset order kept");
}

#[test]
fn test_identity_filter_returns_input() {
    let ds = RowDataset::new(items(300, 7));
    let cols = Columns::new(item_columns()).unwrap();
    let out = filter_rows(&ds, &cols, &FilterState::new());
    let expected: Vec<RowId> = (0..300).map(RowId).collect();
    assert_eq!(out, expected);
}

// ============================================================================
// Sort idempotence, stability and cycle
// ============================================================================

#[test_case(SortDirection::Asc)]
#[test_case(SortDirection::Desc)]
fn test_sort_idempotent_and_stable(direction: SortDirection) {
    let ds = RowDataset::new(items(400, 11));
    let cols = Columns::new(item_columns()).unwrap();
    let group = cols.get("group").unwrap();
    let all: Vec<RowId> = (0..ds.len()).map(RowId).collect();

    let once = sort_rows(&ds, &all, Some(group), Some(direction));
    let twice = sort_rows(&ds, &once, Some(group), Some(direction));
    assert_eq!(once, twice);

    // Equal groups keep dataset order; missing groups come last
    for pair in once.windows(2) {
        let a = ds.get(pair[0]).unwrap().group;
        let b = ds.get(pair[1]).unwrap().group;
        match (a, b) {
            (Some(x), Some(y)) if x == y => assert!(pair[0] < pair[1]),
            (Some(x), Some(y)) => match direction {
                SortDirection::Asc => assert!(x < y),
                SortDirection::Desc => assert!(x > y),
            },
            (None, None) => assert!(pair[0] < pair[1]),
            (None, Some(_)) => panic!("missing value sorted before a present one"),
            (Some(_), None) => {}
        }
    }
}

#[test]
fn test_sort_cycle() {
    let mut t = item_table(50, TableConfig::default().with_viewport_extent(300.0));
    let original = t.ordered_rows().to_vec();

    assert_eq!(t.toggle_sort("score"), &SortState::asc("score"));
    let scores: Vec<f64> = t.ordered_records().map(|r| r.score).collect();
    assert!(scores.windows(2).all(|w| w[0] <= w[1]));

    assert_eq!(t.toggle_sort("score"), &SortState::desc("score"));
    let scores: Vec<f64> = t.ordered_records().map(|r| r.score).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));

    assert_eq!(t.toggle_sort("score"), &SortState::none());
    assert_eq!(t.ordered_rows(), original.as_slice());
}

#[test]
fn test_sort_other_column_restarts_at_asc() {
    let mut t = item_table(20, TableConfig::default());
    t.toggle_sort("score");
    t.toggle_sort("score");
    assert_eq!(t.toggle_sort("name"), &SortState::asc("name"));
}

// ============================================================================
// Range boundedness
// ============================================================================

#[test_case(200.0, 0 ; "no overscan")]
#[test_case(200.0, 3 ; "overscan 3")]
#[test_case(555.5, 10 ; "odd extent")]
fn test_range_bounded(extent: f64, overscan: i64) {
    let min_row_size = 20.0;
    let config = TableConfig {
        min_row_size,
        ..TableConfig::default()
    }
    .with_overscan(overscan)
    .with_viewport_extent(extent);
    let mut t = item_table(1_000, config);
    let bound = (extent / min_row_size).ceil() as usize + 1 + 2 * overscan as usize;

    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..200 {
        let scroll = rng.random_range(0.0..t.total_extent());
        t.set_scroll_offset(scroll);
        let range = *t.range();
        assert!(range.len() <= bound, "{} rows > {bound}", range.len());
        assert!(range.end <= t.len());

        // Shrink some rendered rows towards the minimum (or below it)
        let index = rng.random_range(range.start..range.end);
        t.on_row_measured(index, rng.random_range(-5.0..40.0));
    }
}

#[test]
fn test_range_exact_bound_when_aligned() {
    let config = TableConfig {
        min_row_size: 35.0,
        ..TableConfig::default()
    }
    .with_overscan(2)
    .with_viewport_extent(350.0);
    let mut t = item_table(100, config);
    for row in [0usize, 10, 40, 90] {
        t.set_scroll_offset(35.0 * row as f64);
        assert!(t.range().len() <= 10 + 4);
    }
}

// ============================================================================
// Re-measurement stability
// ============================================================================

fn ten_rows() -> Table<Item> {
    Table::new(
        RowDataset::new(items(10, 1)),
        item_columns(),
        TableConfig::default()
            .with_overscan(0)
            .with_row_estimate(35.0)
            .with_viewport_extent(100.0),
    )
    .unwrap()
}

#[test]
fn test_remeasure_first_row() {
    let mut t = ten_rows();
    let indices: Vec<usize> = t.frame().rendered_rows.iter().map(|r| r.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    assert_eq!(t.total_extent(), 350.0);

    t.on_row_measured(0, 70.0);
    assert_eq!(t.total_extent(), 385.0);

    t.set_scroll_offset(70.0);
    let frame = t.frame();
    assert_eq!(frame.padding_top, 70.0);
    assert_eq!(frame.rendered_rows[0].index, 1);
}

#[test]
fn test_remeasure_is_idempotent_and_order_free() {
    let mut a = ten_rows();
    let mut b = ten_rows();
    for (index, size) in [(3, 50.0), (1, 20.0), (3, 50.0), (0, 70.0)] {
        a.on_row_measured(index, size);
    }
    for (index, size) in [(0, 70.0), (3, 50.0), (1, 20.0)] {
        b.on_row_measured(index, size);
    }
    assert_eq!(a.total_extent(), b.total_extent());
    assert_eq!(a.total_extent(), 70.0 + 20.0 + 35.0 + 50.0 + 6.0 * 35.0);
}

#[test]
fn test_remeasure_above_viewport_keeps_anchor() {
    let mut t = ten_rows();
    t.set_scroll_offset(140.0);
    let anchor = t.row_at_offset(t.viewport().scroll_offset).unwrap();
    assert_eq!(anchor, 4);

    t.on_row_measured(1, 80.0);
    assert_eq!(t.viewport().scroll_offset, 185.0);
    assert_eq!(t.row_at_offset(t.viewport().scroll_offset), Some(anchor));
}

#[test]
fn test_collapsed_measurement_clamped() {
    let mut t = ten_rows();
    t.on_row_measured(0, 0.0);
    t.on_row_measured(1, -40.0);
    assert_eq!(t.total_extent(), 2.0 + 8.0 * 35.0);
    assert_conserved(&t);
}

// ============================================================================
// Empty dataset
// ============================================================================

#[test_case(0.0, 0.0)]
#[test_case(0.0, 500.0)]
#[test_case(300.0, 500.0)]
#[test_case(-50.0, -1.0)]
fn test_empty_dataset(scroll: f64, extent: f64) {
    let mut t = item_table(0, TableConfig::default().with_viewport_extent(extent));
    t.set_scroll_offset(scroll);
    let frame = t.frame();
    assert_eq!(t.phase(), TablePhase::Empty);
    assert_eq!(frame.total_extent, 0.0);
    assert!(frame.rendered_rows.is_empty());
    assert_eq!(frame.padding_top, 0.0);
    assert_eq!(frame.padding_bottom, 0.0);
    assert_eq!(frame.scroll_offset, 0.0);
}

// ============================================================================
// Scroll-only events
// ============================================================================

#[test]
fn test_scroll_keeps_logical_order() {
    let mut t = item_table(1_000, TableConfig::default().with_viewport_extent(400.0));
    t.toggle_sort("score");
    let order = t.ordered_rows().to_vec();
    for offset in [0.0, 1_000.0, 20_000.0, 5.5] {
        t.set_scroll_offset(offset);
        assert_eq!(t.ordered_rows(), order.as_slice());
    }
}

#[test]
fn test_rendered_rows_follow_logical_order() {
    let mut t = item_table(1_000, TableConfig::default().with_viewport_extent(400.0));
    t.toggle_sort("name");
    t.set_scroll_offset(3_000.0);
    let frame = t.frame();
    for row in &frame.rendered_rows {
        assert_eq!(t.row_id_at(row.index), Some(row.row_id));
        assert_eq!(t.record_at(row.index), Some(row.record));
    }
    let starts: Vec<f64> = frame.rendered_rows.iter().map(|r| r.start).collect();
    assert!(starts.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(starts[0], frame.padding_top);
}

#[test]
fn test_viewport_events_skip_filter_and_sort() {
    let compared = Rc::new(Cell::new(0usize));
    let tested = Rc::new(Cell::new(0usize));

    let counter = Rc::clone(&compared);
    let columns = vec![
        Column::new("name", |r: &Item| Value::from(r.name.as_str())),
        Column::new("score", |r: &Item| Value::Number(r.score)).comparator(move |a, b| {
            counter.set(counter.get() + 1);
            a.natural_cmp(b)
        }),
    ];
    let mut t = Table::new(
        RowDataset::new(items(500, 42)),
        columns,
        TableConfig::default().with_viewport_extent(400.0),
    )
    .unwrap();

    let counter = Rc::clone(&tested);
    t.set_column_filter(
        "score",
        Some(Rc::new(move |v: &Value| {
            counter.set(counter.get() + 1);
            v.as_f64().is_some_and(|s| s > -50.0)
        })),
    );
    t.toggle_sort("score");
    assert!(tested.get() > 0);
    assert!(compared.get() > 0);
    let order = t.ordered_rows().to_vec();
    let (tests_before, compares_before) = (tested.get(), compared.get());

    t.set_scroll_offset(2_000.0);
    t.scroll_by(-350.0);
    t.scroll_to_row(100, Align::Center);
    t.set_viewport_extent(900.0);
    t.set_overscan(7);
    t.on_row_measured(3, 80.0);
    t.on_row_measured(60, 12.0);
    let _ = t.frame();

    assert_eq!(tested.get(), tests_before);
    assert_eq!(compared.get(), compares_before);
    assert_eq!(t.ordered_rows(), order.as_slice());
}

// ============================================================================
// End-to-end: replications
// ============================================================================

/// Effect size on a 0.001 grid over [-1, 1]; distinct for `i < 2001`.
fn fixture_effect(i: usize) -> f64 {
    ((i * 7919) % 2001) as f64 / 1000.0 - 1.0
}

fn seeded_replications(n: usize, seed: u64) -> Vec<Replication> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let d = fixture_effect(i);
            let p: f64 = rng.random_range(0.0001..1.0);
            Replication {
                simulation_id: Some(i + 1),
                p_value: p,
                effect_size: d,
                confidence_interval: (d - 0.5, d + 0.5),
                s_value: -p.log2(),
                significant: Some(p < 0.05),
            }
        })
        .collect()
}

#[test]
fn test_replications_end_to_end() {
    let rows = seeded_replications(1_000, 2024);

    let mut t = Table::new(
        RowDataset::new(rows),
        Replication::columns(),
        TableConfig::default().with_viewport_extent(600.0),
    )
    .unwrap();
    assert_eq!(t.len(), 1_000);

    let (column, predicate) = parse_condition("effect_size>0").unwrap();
    t.set_column_filter(&column, Some(predicate));
    assert_eq!(t.len(), 504);
    assert!((400..=600).contains(&t.len()));

    t.toggle_sort("effect_size");
    let frame = t.frame();
    assert_eq!(frame.scroll_offset, 0.0);
    assert_eq!(frame.rendered_rows[0].index, 0);
    assert_eq!(frame.rendered_rows[0].record.effect_size, 1001.0 / 1000.0 - 1.0);
    assert_eq!(frame.rendered_rows[0].record.simulation_id, Some(719));
}

#[test]
fn test_replications_custom_predicate_and_text() {
    let mut t = Table::new(
        RowDataset::new(seeded_replications(200, 5)),
        Replication::columns(),
        TableConfig::default().with_viewport_extent(300.0),
    )
    .unwrap();
    t.set_column_filter(
        "significant",
        Some(Rc::new(|v: &Value| v.as_bool() == Some(true))),
    );
    assert!(t.ordered_records().all(|r| r.significant == Some(true)));
    let significant = t.len();

    t.set_global_filter("true");
    assert_eq!(t.len(), significant);
    t.clear_filters();
    assert_eq!(t.len(), 200);
}
