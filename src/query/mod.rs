//! Query construction, planning, and execution
//!
//! A query is a conjunction of `(column, operator, operand)` criteria.
//! The planner costs every access path (full scan plus each index) and
//! the executor walks the winner, filtering whatever the index could not
//! satisfy.

mod builder;
mod executor;
mod planner;

pub use builder::Query;
pub use planner::AccessPlan;

pub(crate) use executor::filter_residual;
pub(crate) use planner::plan;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::data::{compare, Value, ValueRange, ValueSet};
use crate::{Result, RowdexError};

// ============================================================================
// Operator grammar
// ============================================================================

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    LessThan,
    LessEqual,
    Equal,
    NotEqual,
    GreaterEqual,
    GreaterThan,
    Between,
    In,
}

impl Operator {
    /// Parse from string, case-insensitive
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "<" => Some(Operator::LessThan),
            "<=" => Some(Operator::LessEqual),
            "==" => Some(Operator::Equal),
            "!=" => Some(Operator::NotEqual),
            ">=" => Some(Operator::GreaterEqual),
            ">" => Some(Operator::GreaterThan),
            "between" => Some(Operator::Between),
            "in" => Some(Operator::In),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::LessThan => "<",
            Operator::LessEqual => "<=",
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::GreaterEqual => ">=",
            Operator::GreaterThan => ">",
            Operator::Between => "between",
            Operator::In => "in",
        }
    }

    fn takes_scalar(&self) -> bool {
        matches!(
            self,
            Operator::LessThan
                | Operator::LessEqual
                | Operator::Equal
                | Operator::NotEqual
                | Operator::GreaterEqual
                | Operator::GreaterThan
        )
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Operands
// ============================================================================

/// The right-hand side of a criterion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Operand {
    Value(Value),
    Set(ValueSet),
    Range(ValueRange),
}

impl From<Value> for Operand {
    fn from(v: Value) -> Self {
        Operand::Value(v)
    }
}

impl From<bool> for Operand {
    fn from(v: bool) -> Self {
        Operand::Value(v.into())
    }
}

impl From<i64> for Operand {
    fn from(v: i64) -> Self {
        Operand::Value(v.into())
    }
}

impl From<i32> for Operand {
    fn from(v: i32) -> Self {
        Operand::Value(v.into())
    }
}

impl From<f64> for Operand {
    fn from(v: f64) -> Self {
        Operand::Value(v.into())
    }
}

impl From<&str> for Operand {
    fn from(v: &str) -> Self {
        Operand::Value(v.into())
    }
}

impl From<String> for Operand {
    fn from(v: String) -> Self {
        Operand::Value(v.into())
    }
}

impl From<ValueSet> for Operand {
    fn from(v: ValueSet) -> Self {
        Operand::Set(v)
    }
}

impl From<Vec<Value>> for Operand {
    fn from(v: Vec<Value>) -> Self {
        Operand::Set(ValueSet::of(v))
    }
}

impl From<ValueRange> for Operand {
    fn from(v: ValueRange) -> Self {
        Operand::Range(v)
    }
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Value(v) => write!(f, "{}", v),
            Operand::Set(s) => {
                write!(f, "(")?;
                for (i, v) in s.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, ")")
            }
            Operand::Range(r) => write!(
                f,
                "[{}, {}{}",
                r.start(),
                r.end(),
                if r.is_exclusive() { ")" } else { "]" }
            ),
        }
    }
}

// ============================================================================
// Criteria
// ============================================================================

/// A single `(column, operator, operand)` predicate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Criterion {
    column: String,
    op: Operator,
    operand: Operand,
}

impl Criterion {
    /// Parse the operator and check it against the operand shape:
    /// `between` wants a range, `in` wants a set, everything else wants
    /// a scalar.
    pub fn new(column: impl Into<String>, op: &str, operand: impl Into<Operand>) -> Result<Self> {
        let parsed =
            Operator::parse(op).ok_or_else(|| RowdexError::UnknownOperator(op.to_string()))?;
        let operand = operand.into();
        match (parsed, &operand) {
            (Operator::Between, Operand::Range(_)) => {}
            (Operator::Between, _) => {
                return Err(RowdexError::UnknownOperator(
                    "between requires a range operand".to_string(),
                ));
            }
            (Operator::In, Operand::Set(_)) => {}
            (Operator::In, _) => {
                return Err(RowdexError::UnknownOperator(
                    "in requires a set operand".to_string(),
                ));
            }
            (op, Operand::Value(_)) if op.takes_scalar() => {}
            (op, _) => {
                return Err(RowdexError::UnknownOperator(format!(
                    "operator {} takes a scalar operand",
                    op
                )));
            }
        }
        Ok(Self {
            column: column.into(),
            op: parsed,
            operand,
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn op(&self) -> Operator {
        self.op
    }

    pub fn operand(&self) -> &Operand {
        &self.operand
    }

    /// Cost of evaluating this criterion against one row: one comparison,
    /// plus one more for `between`, plus one per extra `in` element.
    pub(crate) fn eval_cost(&self) -> f64 {
        let extra = match (&self.op, &self.operand) {
            (Operator::Between, _) => 1.0,
            (Operator::In, Operand::Set(set)) => set.len().saturating_sub(1) as f64,
            _ => 0.0,
        };
        1.0 + extra
    }

    /// Evaluate against one cell value
    pub(crate) fn matches_value(&self, value: &Value) -> bool {
        match (&self.op, &self.operand) {
            (Operator::Between, Operand::Range(range)) => range.contains(value),
            (Operator::In, Operand::Set(set)) => set.contains(value),
            (op, Operand::Value(target)) => {
                let ordering = compare(value, target);
                match op {
                    Operator::LessThan => ordering == Ordering::Less,
                    Operator::LessEqual => ordering != Ordering::Greater,
                    Operator::Equal => ordering == Ordering::Equal,
                    Operator::NotEqual => ordering != Ordering::Equal,
                    Operator::GreaterEqual => ordering != Ordering::Less,
                    Operator::GreaterThan => ordering == Ordering::Greater,
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

impl std::fmt::Display for Criterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.column, self.op, self.operand)
    }
}
