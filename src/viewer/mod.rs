//! WASM-exported table view for replications.
//!
//! The host page owns the DOM: it mounts `frame().renderedRows` between two
//! spacer elements sized `paddingTop` / `paddingBottom`, reports each mounted
//! row's height through `on_row_measured`, and forwards scroll and resize
//! events. Every call recomputes synchronously, so the next `frame()` is
//! always current.

use js_sys::Function;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

use crate::config::TableConfig;
use crate::export;
use crate::filter::{parse_condition, range_predicate};
use crate::layout::Align;
use crate::table::Table;
use crate::types::{Predicate, Replication, ReplicationInput, RowDataset, Value};

/// Table of simulation replications driven from JavaScript.
#[wasm_bindgen]
pub struct ReplicationTableView {
    table: Table<Replication>,
}

#[wasm_bindgen]
impl ReplicationTableView {
    /// Create a view from an array of replications (or an aggregated results
    /// object) and an optional config object.
    #[wasm_bindgen(constructor)]
    pub fn new(results: JsValue, config: JsValue) -> Result<ReplicationTableView, JsValue> {
        console_error_panic_hook::set_once();

        let rows = replications_from_js(results)?;
        let config = if config.is_undefined() || config.is_null() {
            TableConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid config: {e}")))?
        };
        let table = Table::new(RowDataset::new(rows), Replication::columns(), config)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(ReplicationTableView { table })
    }

    /// Replace the loaded replications. Filters, sort and scroll reset.
    pub fn load(&mut self, results: JsValue) -> Result<(), JsValue> {
        let rows = replications_from_js(results)?;
        self.table.replace_dataset(RowDataset::new(rows));
        Ok(())
    }

    pub fn set_global_filter(&mut self, text: &str) {
        self.table.set_global_filter(text);
    }

    /// Install a JS predicate `(value) => boolean` for a column, or clear it
    /// with `null`. A predicate that throws rejects the row.
    pub fn set_column_filter(&mut self, column_id: &str, predicate: Option<Function>) {
        let predicate = predicate.map(|f| -> Predicate {
            Rc::new(move |value: &Value| {
                let arg = serde_wasm_bindgen::to_value(value).unwrap_or(JsValue::UNDEFINED);
                f.call1(&JsValue::NULL, &arg)
                    .map(|r| r.is_truthy())
                    .unwrap_or(false)
            })
        });
        self.table.set_column_filter(column_id, predicate);
    }

    /// Keep rows whose column value lies in `[min, max]` (either bound optional).
    pub fn set_column_range(&mut self, column_id: &str, min: Option<f64>, max: Option<f64>) {
        if min.is_none() && max.is_none() {
            self.table.set_column_filter(column_id, None);
        } else {
            self.table
                .set_column_filter(column_id, Some(range_predicate(min, max)));
        }
    }

    /// Apply a condition such as `effect_size>0` or `significant=true`.
    pub fn set_column_condition(&mut self, expr: &str) -> Result<(), JsValue> {
        let (column, predicate) =
            parse_condition(expr).map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.table.set_column_filter(&column, Some(predicate));
        Ok(())
    }

    pub fn clear_filters(&mut self) {
        self.table.clear_filters();
    }

    /// Cycle the sort on a column; returns the new `{column, direction}`.
    pub fn toggle_sort(&mut self, column_id: &str) -> JsValue {
        let state = self.table.toggle_sort(column_id);
        serde_wasm_bindgen::to_value(state).unwrap_or(JsValue::NULL)
    }

    pub fn set_scroll_offset(&mut self, offset: f64) {
        self.table.set_scroll_offset(offset);
    }

    pub fn scroll_by(&mut self, delta: f64) {
        self.table.scroll_by(delta);
    }

    /// Scroll a logical row into view. `align` is "start", "center" or "end".
    pub fn scroll_to_row(&mut self, index: usize, align: &str) {
        let align = match align {
            "center" => Align::Center,
            "end" => Align::End,
            _ => Align::Start,
        };
        self.table.scroll_to_row(index, align);
    }

    pub fn set_viewport_extent(&mut self, extent: f64) {
        self.table.set_viewport_extent(extent);
    }

    pub fn set_overscan(&mut self, overscan: i32) {
        self.table.set_overscan(i64::from(overscan));
    }

    /// Report the rendered height of the row at logical `index`.
    pub fn on_row_measured(&mut self, index: usize, size: f64) {
        self.table.on_row_measured(index, size);
    }

    /// Renderer output: `{renderedRows, paddingTop, paddingBottom, totalExtent, scrollOffset}`.
    pub fn frame(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.table.frame())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
    }

    /// Column ids and header labels, in display order.
    pub fn columns(&self) -> Result<JsValue, JsValue> {
        let headers: Vec<(&str, &str)> = self
            .table
            .columns()
            .iter()
            .map(|c| (c.id(), c.header()))
            .collect();
        serde_wasm_bindgen::to_value(&headers)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
    }

    /// CSV of every filtered + sorted row.
    pub fn export_csv(&self) -> Result<String, JsValue> {
        export::to_csv(&self.table).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// JSON array of every filtered + sorted row.
    pub fn export_json(&self) -> Result<String, JsValue> {
        export::to_json(&self.table).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn row_count(&self) -> usize {
        self.table.len()
    }

    pub fn total_extent(&self) -> f64 {
        self.table.total_extent()
    }

    pub fn scroll_offset(&self) -> f64 {
        self.table.viewport().scroll_offset
    }
}

fn replications_from_js(results: JsValue) -> Result<Vec<Replication>, JsValue> {
    let input: ReplicationInput = serde_wasm_bindgen::from_value(results)
        .map_err(|e| JsValue::from_str(&format!("Invalid results: {e}")))?;
    Ok(input.into_rows())
}
