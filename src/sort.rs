//! Sort stage.
//!
//! Orders the filtered rows by at most one column. Values are read once per
//! row and sorted with a stable sort, so equal keys keep their filtered order.
//! Missing values (absent, NaN, infinite) always sort after present ones, in
//! both directions.

use std::cmp::Ordering;

use crate::types::{Column, RowDataset, RowId, SortDirection, Value};

/// Compare two values for `direction`, keeping missing values last.
///
/// `custom` replaces the natural ordering for present values.
pub fn compare_values(
    a: &Value,
    b: &Value,
    direction: SortDirection,
    custom: Option<&dyn Fn(&Value, &Value) -> Ordering>,
) -> Ordering {
    match (a.is_missing(), b.is_missing()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ord = match custom {
                Some(cmp) => cmp(a, b),
                None => a.natural_cmp(b),
            };
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        }
    }
}

/// Sort `rows` by `column` in `direction`.
///
/// `None` for either argument returns the rows unchanged. Row ids that do not
/// resolve in `dataset` are treated as missing.
pub fn sort_rows<R>(
    dataset: &RowDataset<R>,
    rows: &[RowId],
    column: Option<&Column<R>>,
    direction: Option<SortDirection>,
) -> Vec<RowId> {
    let (Some(column), Some(direction)) = (column, direction) else {
        return rows.to_vec();
    };

    let mut keyed: Vec<(Value, RowId)> = rows
        .iter()
        .map(|&id| {
            let value = dataset
                .get(id)
                .map_or(Value::Missing, |record| column.value(record));
            (value, id)
        })
        .collect();

    let custom = column.custom_comparator().map(|c| c.as_ref());
    keyed.sort_by(|(a, _), (b, _)| compare_values(a, b, direction, custom));
    keyed.into_iter().map(|(_, id)| id).collect()
}
