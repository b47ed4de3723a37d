//! Filter stage.
//!
//! Applies the global substring query and the per-column predicates to a
//! dataset, producing an order-preserving list of row identities.

use std::rc::Rc;

use crate::error::{Result, SimviewError};
use crate::types::{
    cmp_numbers, parse_flag, Columns, FilterState, Predicate, RowDataset, RowId, Value,
};

/// Filter `dataset` down to the rows matching `state`, in dataset order.
///
/// A row matches when every column predicate accepts its column's value and,
/// if the global query is non-empty, at least one searchable column's
/// displayed text contains the query case-insensitively. Predicates keyed by
/// an unknown column id reject nothing.
///
/// Pure: identical inputs always give an identical result.
pub fn filter_rows<R>(
    dataset: &RowDataset<R>,
    columns: &Columns<R>,
    state: &FilterState,
) -> Vec<RowId> {
    if state.is_identity() {
        return dataset.iter().map(|(id, _)| id).collect();
    }

    let needle = state.global_text.to_lowercase();
    let predicates: Vec<_> = state
        .column_predicates
        .iter()
        .filter_map(|(id, pred)| columns.get(id).map(|col| (col, pred)))
        .collect();

    dataset
        .iter()
        .filter(|(_, record)| {
            predicates
                .iter()
                .all(|(col, pred)| pred(&col.value(record)))
        })
        .filter(|(_, record)| needle.is_empty() || matches_text(columns, *record, &needle))
        .map(|(id, _)| id)
        .collect()
}

/// True if any searchable column's displayed text contains `needle`.
///
/// `needle` must already be lowercase.
fn matches_text<R>(columns: &Columns<R>, record: &R, needle: &str) -> bool {
    columns
        .iter()
        .filter(|col| col.is_searchable())
        .any(|col| col.display(record).to_lowercase().contains(needle))
}

/// Comparison operators accepted by [`parse_condition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CompareOp {
    fn from_prefix(s: &str) -> Option<(Self, usize)> {
        const OPS: [(&str, CompareOp); 6] = [
            (">=", CompareOp::Ge),
            ("<=", CompareOp::Le),
            ("!=", CompareOp::Ne),
            (">", CompareOp::Gt),
            ("<", CompareOp::Lt),
            ("=", CompareOp::Eq),
        ];
        OPS.iter()
            .find(|(token, _)| s.starts_with(token))
            .map(|&(token, op)| (op, token.len()))
    }

    fn holds(self, ord: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::{Equal, Greater, Less};
        match self {
            CompareOp::Lt => ord == Less,
            CompareOp::Le => ord != Greater,
            CompareOp::Gt => ord == Greater,
            CompareOp::Ge => ord != Less,
            CompareOp::Eq => ord == Equal,
            CompareOp::Ne => ord != Equal,
        }
    }
}

/// Inclusive numeric range predicate; an open bound is unbounded.
///
/// Values with no numeric view (text, missing, NaN) are rejected.
pub fn range_predicate(min: Option<f64>, max: Option<f64>) -> Predicate {
    Rc::new(move |value: &Value| {
        value.as_f64().is_some_and(|n| {
            min.map_or(true, |lo| n >= lo) && max.map_or(true, |hi| n <= hi)
        })
    })
}

/// Parse a `column<op>value` condition such as `effect_size>0`,
/// `p_value<=0.05` or `significant=true`.
///
/// Numbers compare numerically (booleans count as 0/1), `true`/`false`
/// compare as booleans, anything else is a case-insensitive text match and
/// only supports `=` and `!=`.
pub fn parse_condition(expr: &str) -> Result<(String, Predicate)> {
    let split = expr
        .find(['<', '>', '=', '!'])
        .ok_or_else(|| SimviewError::Parse(format!("no operator in condition: {expr}")))?;
    let (column, rest) = expr.split_at(split);
    let column = column.trim();
    if column.is_empty() {
        return Err(SimviewError::Parse(format!("no column in condition: {expr}")));
    }
    let (op, op_len) = CompareOp::from_prefix(rest)
        .ok_or_else(|| SimviewError::Parse(format!("bad operator in condition: {expr}")))?;
    let operand = rest.get(op_len..).unwrap_or_default().trim().to_string();
    if operand.is_empty() {
        return Err(SimviewError::Parse(format!("no value in condition: {expr}")));
    }

    let predicate: Predicate = if let Ok(target) = operand.parse::<f64>() {
        Rc::new(move |value: &Value| {
            value
                .as_f64()
                .is_some_and(|n| op.holds(cmp_numbers(n, target)))
        })
    } else if let Ok(flag) = parse_flag(&operand) {
        Rc::new(move |value: &Value| value.as_bool().is_some_and(|b| op.holds(b.cmp(&flag))))
    } else if matches!(op, CompareOp::Eq | CompareOp::Ne) {
        let needle = operand.to_lowercase();
        Rc::new(move |value: &Value| {
            let equal = value.to_string().to_lowercase() == needle;
            equal == (op == CompareOp::Eq)
        })
    } else {
        return Err(SimviewError::Parse(format!(
            "ordering needs a number: {expr}"
        )));
    };
    Ok((column.to_string(), predicate))
}
