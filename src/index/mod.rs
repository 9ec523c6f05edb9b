//! Multi-level ordered index
//!
//! An index is parameterised by an ordered list of column names. Each
//! level is a sorted run of entries keyed by one column's values; an
//! entry carries the count of rows under it (`size`), the inclusive
//! prefix count within its level (`subtotal`), and either a nested level
//! for the next column or the row ids sharing the full key path. Levels
//! also carry `total`, the sum of their entries' sizes.
//!
//! Supports:
//! - Bulk build from a row slice
//! - Incremental merge-add / merge-remove
//! - Binary probe in O(log N)
//! - Structural validation of every invariant

mod build;
mod merge;
mod search;
mod validate;

use serde::{Deserialize, Serialize};

use crate::data::{RowId, Value};
use crate::table::store::RowStore;
use crate::{Result, RowdexError};

pub(crate) use search::{probe, Probe};

// ============================================================================
// Tree structure
// ============================================================================

/// A sorted run of entries at one level, plus the level's row total
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Level {
    pub(crate) entries: Vec<Entry>,
    pub(crate) total: usize,
}

impl Level {
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn last_subtotal(&self) -> usize {
        self.entries.last().map(|e| e.subtotal).unwrap_or(0)
    }
}

/// One key value at one level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub(crate) value: Value,
    pub(crate) size: usize,
    pub(crate) subtotal: usize,
    pub(crate) down: Node,
}

impl Entry {
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Count of rows whose key matches this entry's value at this level
    pub fn size(&self) -> usize {
        self.size
    }

    /// Inclusive prefix sum of sizes up to and including this entry
    pub fn subtotal(&self) -> usize {
        self.subtotal
    }

    pub fn down(&self) -> &Node {
        &self.down
    }
}

/// What an entry holds underneath: a nested level for the next indexed
/// column, or the canonical row ids at the leaf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Node {
    Branch(Level),
    Rows(Vec<RowId>),
}

/// Read-only view of an index for renderers
#[derive(Debug, Clone, Serialize)]
pub struct IndexSnapshot {
    pub signature: String,
    pub columns: Vec<String>,
    pub root: Level,
}

// ============================================================================
// Index
// ============================================================================

/// One multi-level ordered index over a table's rows
#[derive(Debug)]
pub struct Index {
    columns: Vec<String>,
    signature: String,
    /// `None` once dropped
    root: Option<Level>,
}

impl Index {
    pub(crate) fn new(columns: Vec<String>) -> Self {
        let signature = Self::signature_of(&columns);
        Self {
            columns,
            signature,
            root: Some(Level::default()),
        }
    }

    /// The bracketed comma-joined column list identifying an index
    pub(crate) fn signature_of(columns: &[String]) -> String {
        format!("[{}]", columns.join(","))
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn is_dropped(&self) -> bool {
        self.root.is_none()
    }

    pub(crate) fn root(&self) -> Result<&Level> {
        self.root
            .as_ref()
            .ok_or_else(|| RowdexError::IndexDropped(self.signature.clone()))
    }

    /// Read-only structure view for renderers
    pub fn snapshot(&self) -> Result<IndexSnapshot> {
        Ok(IndexSnapshot {
            signature: self.signature.clone(),
            columns: self.columns.clone(),
            root: self.root()?.clone(),
        })
    }

    /// Rebuild the whole tree from every row in the store
    pub(crate) fn rebuild(&mut self, store: &RowStore) -> Result<()> {
        if self.root.is_none() {
            return Err(RowdexError::IndexDropped(self.signature.clone()));
        }
        let ids: Vec<RowId> = store.ids().collect();
        self.root = Some(build::build_level(store, &ids, &self.columns));
        Ok(())
    }

    /// Ingest newly inserted rows
    pub(crate) fn merge_add(&mut self, store: &RowStore, ids: &[RowId]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let right = build::build_level(store, ids, &self.columns);
        let signature = self.signature.clone();
        let left = self.root_mut()?;
        merge::merge_add_level(left, right, &signature)
    }

    /// Withdraw rows that are being removed; their canonical cells must
    /// still be present in the store when this runs.
    pub(crate) fn merge_remove(&mut self, store: &RowStore, ids: &[RowId]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let right = build::build_level(store, ids, &self.columns);
        let signature = self.signature.clone();
        let left = self.root_mut()?;
        merge::merge_remove_level(left, right, &signature)
    }

    /// Every row id reachable through the leaves, in tree order
    pub(crate) fn row_ids(&self) -> Result<Vec<RowId>> {
        fn collect(node: &Node, out: &mut Vec<RowId>) {
            match node {
                Node::Rows(rows) => out.extend(rows),
                Node::Branch(level) => {
                    for entry in &level.entries {
                        collect(&entry.down, out);
                    }
                }
            }
        }
        let mut out = Vec::new();
        for entry in &self.root()?.entries {
            collect(&entry.down, &mut out);
        }
        Ok(out)
    }

    /// Clear the nested structure; all later operations on this index
    /// fail with `IndexDropped`.
    pub(crate) fn drop_structure(&mut self) {
        self.root = None;
    }

    fn root_mut(&mut self) -> Result<&mut Level> {
        self.root
            .as_mut()
            .ok_or_else(|| RowdexError::IndexDropped(self.signature.clone()))
    }
}
