use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use super::Value;
use crate::error::{Result, SimviewError};

/// Reads one field out of a record.
pub type Accessor<R> = Rc<dyn Fn(&R) -> Value>;

/// Orders two present values of one column (ascending).
pub type Comparator = Rc<dyn Fn(&Value, &Value) -> Ordering>;

/// Boolean test over a column's value.
pub type Predicate = Rc<dyn Fn(&Value) -> bool>;

/// Default row size estimate used by the standard column sets.
pub const DEFAULT_ESTIMATED_SIZE: f64 = 35.0;

/// Column descriptor: how to read, order and size one field of `R`.
///
/// Accessors are resolved when the descriptor is built, so the engine never
/// looks fields up by name at render time.
pub struct Column<R> {
    id: String,
    label: String,
    accessor: Accessor<R>,
    comparator: Option<Comparator>,
    estimated_size: f64,
    precision: Option<usize>,
    searchable: bool,
    interval: bool,
}

impl<R> Column<R> {
    pub fn new<F>(id: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&R) -> Value + 'static,
    {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            accessor: Rc::new(accessor),
            comparator: None,
            estimated_size: DEFAULT_ESTIMATED_SIZE,
            precision: None,
            searchable: true,
            interval: false,
        }
    }

    /// Header text shown to the user (defaults to the id).
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Replace the default value ordering for this column.
    #[must_use]
    pub fn comparator<F>(mut self, cmp: F) -> Self
    where
        F: Fn(&Value, &Value) -> Ordering + 'static,
    {
        self.comparator = Some(Rc::new(cmp));
        self
    }

    #[must_use]
    pub fn estimated_size(mut self, size: f64) -> Self {
        self.estimated_size = size;
        self
    }

    /// Fixed number of decimals for displayed numbers.
    #[must_use]
    pub fn precision(mut self, decimals: usize) -> Self {
        self.precision = Some(decimals);
        self
    }

    /// Exclude this column from the global text filter.
    #[must_use]
    pub fn hidden_from_search(mut self) -> Self {
        self.searchable = false;
        self
    }

    /// Values are `[lower, upper]` pairs; flat exports give this column two
    /// fields, `<id>_lower` and `<id>_upper`.
    #[must_use]
    pub fn interval(mut self) -> Self {
        self.interval = true;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn header(&self) -> &str {
        &self.label
    }

    pub fn get_estimated_size(&self) -> f64 {
        self.estimated_size
    }

    pub fn get_precision(&self) -> Option<usize> {
        self.precision
    }

    pub fn is_searchable(&self) -> bool {
        self.searchable
    }

    pub fn is_interval(&self) -> bool {
        self.interval
    }

    pub fn custom_comparator(&self) -> Option<&Comparator> {
        self.comparator.as_ref()
    }

    /// Read this column's value from a record.
    pub fn value(&self, record: &R) -> Value {
        (self.accessor)(record)
    }

    /// Displayed string form of this column's value.
    pub fn display(&self, record: &R) -> String {
        self.value(record).display(self.precision)
    }
}

impl<R> Clone for Column<R> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            label: self.label.clone(),
            accessor: Rc::clone(&self.accessor),
            comparator: self.comparator.as_ref().map(Rc::clone),
            estimated_size: self.estimated_size,
            precision: self.precision,
            searchable: self.searchable,
            interval: self.interval,
        }
    }
}

impl<R> fmt::Debug for Column<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("custom_comparator", &self.comparator.is_some())
            .field("estimated_size", &self.estimated_size)
            .field("precision", &self.precision)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

/// Validated, ordered set of column descriptors for one table instance.
pub struct Columns<R> {
    columns: Vec<Column<R>>,
}

impl<R> Columns<R> {
    /// Check ids are unique and estimates are finite and positive.
    pub fn new(columns: Vec<Column<R>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for col in &columns {
            if !seen.insert(col.id.as_str()) {
                return Err(SimviewError::DuplicateColumn(col.id.clone()));
            }
            if !col.estimated_size.is_finite() || col.estimated_size <= 0.0 {
                return Err(SimviewError::InvalidEstimate {
                    column: col.id.clone(),
                    value: col.estimated_size,
                });
            }
        }
        Ok(Self { columns })
    }

    pub fn get(&self, id: &str) -> Option<&Column<R>> {
        self.columns.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Column<R>> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Tallest column estimate, used as the default row estimate.
    pub fn row_estimate(&self) -> Option<f64> {
        self.columns
            .iter()
            .map(|c| c.estimated_size)
            .reduce(f64::max)
    }
}

impl<'a, R> IntoIterator for &'a Columns<R> {
    type Item = &'a Column<R>;
    type IntoIter = std::slice::Iter<'a, Column<R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

impl<R> fmt::Debug for Columns<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.columns.iter()).finish()
    }
}
