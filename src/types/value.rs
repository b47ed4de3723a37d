use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// A single field value read out of a record by a column accessor.
///
/// Records are closed, statically typed structs; a [`Value`] is the uniform
/// view the filter, sort and export stages work with.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    Bool(bool),
    /// Fixed-length numeric pair such as a confidence interval `[lower, upper]`
    Interval(f64, f64),
    /// Absent field (renders empty, sorts last)
    Missing,
}

impl Value {
    /// True for absent values and for numbers that cannot be ordered.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Number(n) => !n.is_finite(),
            Value::Interval(lo, hi) => !lo.is_finite() || !hi.is_finite(),
            Value::Text(_) | Value::Bool(_) => false,
        }
    }

    /// Numeric view used by range predicates. Booleans map to 0/1.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render with an optional fixed number of decimals.
    pub fn display(&self, precision: Option<usize>) -> String {
        match (self, precision) {
            _ if self.is_missing() => String::new(),
            (Value::Number(n), Some(p)) => format!("{n:.p$}"),
            (Value::Interval(lo, hi), Some(p)) => format!("[{lo:.p$}, {hi:.p$}]"),
            _ => self.to_string(),
        }
    }

    /// Rank used when two values of different kinds meet in one column.
    fn kind_rank(&self) -> u8 {
        match self {
            Value::Bool(_) => 0,
            Value::Number(_) => 1,
            Value::Interval(..) => 2,
            Value::Text(_) => 3,
            Value::Missing => 4,
        }
    }

    /// Natural ordering of two present values.
    ///
    /// Numbers compare numerically, text case-insensitively, booleans as 0/1
    /// and intervals by lower then upper bound. Missing handling lives in
    /// [`crate::sort`], not here.
    pub fn natural_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => cmp_numbers(*a, *b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => cmp_case_insensitive(a, b),
            (Value::Interval(a_lo, a_hi), Value::Interval(b_lo, b_hi)) => {
                cmp_numbers(*a_lo, *b_lo).then_with(|| cmp_numbers(*a_hi, *b_hi))
            }
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }
}

/// Numeric order with `-0.0 == 0.0`.
pub(crate) fn cmp_numbers(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

fn cmp_case_insensitive(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().flat_map(char::to_lowercase);
    let mut right = b.chars().flat_map(char::to_lowercase);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => match x.cmp(&y) {
                Ordering::Equal => {}
                ord => return ord,
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_missing() {
            return Ok(());
        }
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Interval(lo, hi) => write!(f, "[{lo}, {hi}]"),
            Value::Missing => Ok(()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<usize> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<(f64, f64)> for Value {
    fn from((lo, hi): (f64, f64)) -> Self {
        Value::Interval(lo, hi)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Missing, Into::into)
    }
}
