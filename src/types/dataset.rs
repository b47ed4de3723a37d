use serde::Serialize;
use std::rc::Rc;

/// Stable identity of a record: its position in the dataset it was loaded with.
///
/// Filtering and sorting move records around the logical order but never
/// change their `RowId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RowId(pub usize);

/// Immutable, ordered collection of records for one table instance.
///
/// Cloning is cheap and shares the underlying records.
#[derive(Debug)]
pub struct RowDataset<R> {
    records: Rc<[R]>,
}

impl<R> RowDataset<R> {
    pub fn new(records: Vec<R>) -> Self {
        Self {
            records: records.into(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn get(&self, id: RowId) -> Option<&R> {
        self.records.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    /// Records paired with their identities, in dataset order.
    pub fn iter(&self) -> impl Iterator<Item = (RowId, &R)> {
        self.records.iter().enumerate().map(|(i, r)| (RowId(i), r))
    }

    /// True when both handles share the same underlying records.
    pub fn same_as(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.records, &other.records)
    }
}

impl<R> Clone for RowDataset<R> {
    fn clone(&self) -> Self {
        Self {
            records: Rc::clone(&self.records),
        }
    }
}

impl<R> From<Vec<R>> for RowDataset<R> {
    fn from(records: Vec<R>) -> Self {
        Self::new(records)
    }
}
