//! Row records and their identity
//!
//! A row maps column names to cell values; a column with no cell reads as
//! `Null`. Canonical rows are owned by the table. Rows handed to callers
//! are clones carrying a back-reference (`RowOrigin`) that locates the
//! canonical row, verifies table identity, and holds the cell snapshot the
//! clone was taken from — that snapshot is what `update` diffs against to
//! find changed columns.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::data::Value;

/// Row ID type: a stable identity token, unique per table, never reused
pub type RowId = u64;

static NULL: Value = Value::Null;

/// Back-reference carried by cloned rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowOrigin {
    pub(crate) table_id: u64,
    pub(crate) row_id: RowId,
    /// Canonical cell state at clone time
    pub(crate) snapshot: AHashMap<String, Value>,
}

/// One record: a mapping from column name to cell value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Row {
    cells: AHashMap<String, Value>,
    origin: Option<RowOrigin>,
}

impl Row {
    /// Create an empty row (every column reads as `Null`)
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from `(column, value)` pairs
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            cells: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            origin: None,
        }
    }

    /// Read a cell; absent columns read as `Null`
    pub fn get(&self, column: &str) -> &Value {
        self.cells.get(column).unwrap_or(&NULL)
    }

    /// Write a cell in place
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.cells.insert(column.into(), value.into());
    }

    /// Column names with a defined cell
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(|k| k.as_str())
    }

    /// Whether this row carries a table back-reference
    pub fn is_clone(&self) -> bool {
        self.origin.is_some()
    }

    pub(crate) fn cells(&self) -> &AHashMap<String, Value> {
        &self.cells
    }

    pub(crate) fn into_cells(self) -> AHashMap<String, Value> {
        self.cells
    }

    pub(crate) fn origin(&self) -> Option<&RowOrigin> {
        self.origin.as_ref()
    }

    pub(crate) fn with_origin(
        cells: AHashMap<String, Value>,
        table_id: u64,
        row_id: RowId,
    ) -> Self {
        let snapshot = cells.clone();
        Self {
            cells,
            origin: Some(RowOrigin { table_id, row_id, snapshot }),
        }
    }

    /// Re-point the back-reference snapshot at the current cells, so a
    /// later `update` diffs against this state.
    pub(crate) fn refresh_snapshot(&mut self) {
        if let Some(origin) = self.origin.as_mut() {
            origin.snapshot = self.cells.clone();
        }
    }

    /// Columns whose current cell differs from the origin snapshot,
    /// restricted to `columns`. Rows without an origin report no changes.
    pub(crate) fn changed_columns(&self, columns: &[String]) -> Vec<String> {
        let Some(origin) = self.origin.as_ref() else {
            return Vec::new();
        };
        columns
            .iter()
            .filter(|col| {
                let now = self.cells.get(col.as_str()).unwrap_or(&NULL);
                let then = origin.snapshot.get(col.as_str()).unwrap_or(&NULL);
                now != then
            })
            .cloned()
            .collect()
    }
}
