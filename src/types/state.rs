use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use super::{Predicate, Value};

/// Global substring query plus per-column predicates.
///
/// An empty query and no predicates is the identity filter.
#[derive(Clone, Default)]
pub struct FilterState {
    pub global_text: String,
    pub column_predicates: BTreeMap<String, Predicate>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_global_text(mut self, text: impl Into<String>) -> Self {
        self.global_text = text.into();
        self
    }

    #[must_use]
    pub fn with_predicate<F>(mut self, column_id: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + 'static,
    {
        self.column_predicates
            .insert(column_id.into(), Rc::new(predicate));
        self
    }

    /// True when this state keeps every record.
    pub fn is_identity(&self) -> bool {
        self.global_text.is_empty() && self.column_predicates.is_empty()
    }
}

impl fmt::Debug for FilterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterState")
            .field("global_text", &self.global_text)
            .field(
                "column_predicates",
                &self.column_predicates.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Active sort column and direction. `column == None` keeps natural order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortState {
    pub column: Option<String>,
    pub direction: Option<SortDirection>,
}

impl SortState {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: Some(column.into()),
            direction: Some(SortDirection::Asc),
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: Some(column.into()),
            direction: Some(SortDirection::Desc),
        }
    }

    /// The column and direction actually in effect, if any.
    pub fn active(&self) -> Option<(&str, SortDirection)> {
        match (&self.column, self.direction) {
            (Some(col), Some(dir)) => Some((col.as_str(), dir)),
            _ => None,
        }
    }

    /// Next state after the user toggles `column_id`.
    ///
    /// Repeated toggles on one column cycle none → asc → desc → none;
    /// toggling a different column starts at asc.
    #[must_use]
    pub fn toggled(&self, column_id: &str) -> Self {
        match self.active() {
            Some((col, SortDirection::Asc)) if col == column_id => Self::desc(column_id),
            Some((col, SortDirection::Desc)) if col == column_id => Self::none(),
            _ => Self::asc(column_id),
        }
    }
}
