//! Cell values and the shared total-order comparator
//!
//! Every cell in the store holds a `Value`. All ordering in the crate —
//! index entries, binary probes, residual filters — goes through the one
//! total order defined here: absent (`Null`) sorts after every defined
//! value, numbers compare numerically across `Int`/`Float`, strings
//! lexicographically, and remaining cross-kind pairs order by kind rank.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::data::Row;

/// A scalar cell value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    /// Absent / null; sorts after all defined values
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    /// Check whether this is the absent value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view for `Int`/`Float`, `None` otherwise
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Value::Bool(_) => 0,
            Value::Int(_) | Value::Float(_) => 1,
            Value::Str(_) => 2,
            Value::Null => 3,
        }
    }
}

/// Total order over cell values: equal values (including two absents)
/// compare equal; absent sorts greatest; numbers compare numerically
/// across `Int`/`Float`; anything else orders by kind rank.
pub fn compare(l: &Value, r: &Value) -> Ordering {
    match (l, r) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Str(a), Value::Str(b)) => a.cmp(b),
        (Value::Int(_), Value::Float(_))
        | (Value::Float(_), Value::Int(_))
        | (Value::Float(_), Value::Float(_)) => {
            let fa = l.as_f64().unwrap_or(0.0);
            let fb = r.as_f64().unwrap_or(0.0);
            fa.partial_cmp(&fb).unwrap_or(Ordering::Equal)
        }
        _ => l.kind_rank().cmp(&r.kind_rank()),
    }
}

/// Build a comparator that projects both sides through a named column
/// before comparing.
pub fn pluck(column: &str) -> impl Fn(&Row, &Row) -> Ordering + '_ {
    move |l, r| compare(l.get(column), r.get(column))
}

/// Build a comparator that projects only the left side through a named
/// column; the right side is a bare value.
pub fn pluck_left(column: &str) -> impl Fn(&Row, &Value) -> Ordering + '_ {
    move |l, r| compare(l.get(column), r)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        compare(self, other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(compare(self, other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(self, other)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Str(v) => write!(f, "{}", v),
        }
    }
}
