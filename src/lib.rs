//! Rowdex — in-memory multi-indexed tabular store
//!
//! Manages a homogeneous collection of rows over a fixed set of named
//! columns, maintains multi-column ordered indexes over those rows, and
//! answers conjunctive selection queries by picking the cheapest access
//! path (table scan or index) through a cost model, then filtering the
//! residual predicates.

pub mod data;
pub mod index;
pub mod query;
pub mod table;

// Re-export main types
pub use data::{compare, pluck, pluck_left, Row, RowId, Value, ValueRange, ValueSet};
pub use index::{Index, IndexSnapshot};
pub use query::{AccessPlan, Criterion, Operand, Operator, Query};
pub use table::{EventSink, LogSink, Table, TableEvent};

/// Store error type
#[derive(Debug, thiserror::Error)]
pub enum RowdexError {
    #[error("invalid columns: {0}")]
    InvalidColumns(String),

    #[error("unknown operator: {0}")]
    UnknownOperator(String),

    #[error("wrong table: {0}")]
    WrongTable(String),

    #[error("table has been dropped")]
    TableDropped,

    #[error("index has been dropped: {0}")]
    IndexDropped(String),

    #[error("index corruption: {0}")]
    IndexCorruption(String),
}

pub type Result<T> = std::result::Result<T, RowdexError>;
