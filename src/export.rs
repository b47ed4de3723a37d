//! CSV and JSON export of a table's logical row order.
//!
//! Export always covers every filtered + sorted row, never just the rendered
//! window. Columns declared as intervals are split into `<id>_lower` and
//! `<id>_upper`, whatever rows are currently visible.

use serde::Serialize;
use std::io::Write;

use crate::error::Result;
use crate::table::Table;
use crate::types::Value;

/// Write the table as CSV to `out`.
pub fn write_csv<R, W: Write>(table: &Table<R>, out: &mut W) -> Result<()> {
    let mut header = Vec::new();
    for col in table.columns() {
        if col.is_interval() {
            header.push(format!("{}_lower", col.id()));
            header.push(format!("{}_upper", col.id()));
        } else {
            header.push(col.id().to_string());
        }
    }
    write_line(out, &header)?;

    let mut fields = Vec::with_capacity(header.len());
    for record in table.ordered_records() {
        fields.clear();
        for col in table.columns() {
            match (col.value(record), col.is_interval()) {
                (Value::Interval(lo, hi), true) => {
                    fields.push(Value::Number(lo).to_string());
                    fields.push(Value::Number(hi).to_string());
                }
                (other, true) => {
                    fields.push(other.to_string());
                    fields.push(String::new());
                }
                (other, false) => fields.push(other.to_string()),
            }
        }
        write_line(out, &fields)?;
    }
    Ok(())
}

/// Render the table as a CSV string.
pub fn to_csv<R>(table: &Table<R>) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(table, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Render the table's records, in logical order, as a JSON array.
pub fn to_json<R: Serialize>(table: &Table<R>) -> Result<String> {
    let records: Vec<&R> = table.ordered_records().collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

fn write_line<W: Write>(out: &mut W, fields: &[String]) -> Result<()> {
    let line = fields
        .iter()
        .map(|f| escape_field(f))
        .collect::<Vec<_>>()
        .join(",");
    writeln!(out, "{line}")?;
    Ok(())
}

/// Quote a field if it contains a separator, quote or line break.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
