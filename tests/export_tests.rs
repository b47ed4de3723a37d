//! Export tests
//!
//! CSV and JSON output always covers the full filtered + sorted order,
//! independent of what is currently rendered.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use simview::export::{to_csv, to_json, write_csv};
use simview::filter::parse_condition;
use simview::{
    load_replications, load_run, PairSummary, Replication, RowDataset, Table, TableConfig,
};

const REPLICATIONS: &str = r#"[
    {"p_value": 0.0312, "effect_size": 0.61, "confidence_interval": [0.05, 1.17], "s_value": 5.0, "significant": true},
    {"p_value": 0.41, "effect_size": -0.16, "confidence_interval": [-0.71, 0.39], "s_value": 1.29, "significant": false},
    {"p_value": 0.0041, "effect_size": 0.83, "confidence_interval": [0.27, 1.39], "s_value": 7.93, "significant": true},
    {"p_value": 0.77, "effect_size": 0.05, "confidence_interval": [-0.5, 0.6], "s_value": 0.38, "significant": false}
]"#;

fn replication_table(viewport: f64) -> Table<Replication> {
    Table::new(
        RowDataset::new(load_replications(REPLICATIONS).unwrap()),
        Replication::columns(),
        TableConfig::default()
            .with_overscan(0)
            .with_viewport_extent(viewport),
    )
    .unwrap()
}

#[test]
fn test_replication_csv_header() {
    let csv = to_csv(&replication_table(400.0)).unwrap();
    assert_eq!(
        csv.lines().next().unwrap(),
        "simulation_id,p_value,effect_size,ci_lower,ci_upper,s_value,significant"
    );
}

#[test]
fn test_replication_csv_rows() {
    let csv = to_csv(&replication_table(400.0)).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[1], "1,0.0312,0.61,0.05,1.17,5,true");
    assert_eq!(lines[2], "2,0.41,-0.16,-0.71,0.39,1.29,false");
}

#[test]
fn test_export_ignores_virtualization_window() {
    // Viewport fits a single row, export still has every row
    let mut t = replication_table(10.0);
    assert_eq!(t.range().len(), 1);
    t.set_scroll_offset(50.0);
    let csv = to_csv(&t).unwrap();
    assert_eq!(csv.lines().count(), 1 + 4);
}

#[test]
fn test_export_follows_filter_and_sort() {
    let mut t = replication_table(400.0);
    let (column, predicate) = parse_condition("significant=true").unwrap();
    t.set_column_filter(&column, Some(predicate));
    t.toggle_sort("p_value");

    let csv = to_csv(&t).unwrap();
    let ids: Vec<&str> = csv
        .lines()
        .skip(1)
        .map(|l| l.split(',').next().unwrap())
        .collect();
    assert_eq!(ids, vec!["3", "1"]);
}

#[test]
fn test_write_csv_to_writer() {
    let t = replication_table(400.0);
    let mut out = Vec::new();
    write_csv(&t, &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), to_csv(&t).unwrap());
}

#[test]
fn test_json_export_roundtrips_records() {
    let mut t = replication_table(400.0);
    t.toggle_sort("effect_size");
    t.toggle_sort("effect_size");
    let json = to_json(&t).unwrap();
    let back: Vec<Replication> = serde_json::from_str(&json).unwrap();
    assert_eq!(back.len(), 4);
    assert_eq!(back[0].simulation_id, Some(3));
    assert_eq!(back[3].simulation_id, Some(2));
}

#[test]
fn test_pair_summary_csv() {
    let run = load_run(
        r#"{
        "individual_results": [],
        "significant_count": 412,
        "total_count": 1000,
        "mean_effect_size": 0.5,
        "effect_size_ci": [0.1, 0.9],
        "ci_coverage": 0.95,
        "mean_ci_width": 0.8
    }"#,
    )
    .unwrap();
    let t = Table::new(
        RowDataset::new(vec![PairSummary::from_run("control vs treated", &run)]),
        PairSummary::columns(),
        TableConfig::default(),
    )
    .unwrap();
    let csv = to_csv(&t).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "pair,significant_count,total_count,power,mean_effect_size,\
effect_size_ci_lower,effect_size_ci_upper,ci_coverage,mean_ci_width"
    );
    assert_eq!(
        lines[1],
        "control vs treated,412,1000,0.412,0.5,0.1,0.9,0.95,0.8"
    );
}
