//! Table — owns the rows and indexes, coordinates every operation
//!
//! A table is created with a fixed list of column names, mutated through
//! insert/update/remove, queried through `find_where`, and finally
//! dropped. Mutations flow to the row store first and then into every
//! index via merge; queries go through the planner to the executor.

mod events;
pub(crate) mod store;

pub use events::{EventSink, LogSink, TableEvent};

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::data::{Row, RowId};
use crate::index::Index;
use crate::query::{filter_residual, plan, AccessPlan, Criterion, Operand, Query};
use crate::table::store::RowStore;
use crate::{Result, RowdexError};

static NEXT_TABLE_ID: AtomicU64 = AtomicU64::new(1);

static COLUMN_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$").expect("column name pattern"));

/// An in-memory table over a fixed column set
pub struct Table {
    id: u64,
    columns: Vec<String>,
    store: RowStore,
    indexes: Vec<Index>,
    verbose: bool,
    paranoia: bool,
    sink: Box<dyn EventSink>,
    live: bool,
}

impl Table {
    /// Create a table over the given column names. Fails when the list
    /// is empty, has duplicates, or contains a syntactically illegal
    /// name.
    pub fn new<S, I>(columns: I) -> Result<Self>
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            return Err(RowdexError::InvalidColumns("column list is empty".to_string()));
        }
        for (i, column) in columns.iter().enumerate() {
            if !COLUMN_NAME.is_match(column) {
                return Err(RowdexError::InvalidColumns(format!(
                    "illegal column name: {:?}",
                    column
                )));
            }
            if columns[..i].contains(column) {
                return Err(RowdexError::InvalidColumns(format!(
                    "duplicate column name: {}",
                    column
                )));
            }
        }

        let id = NEXT_TABLE_ID.fetch_add(1, AtomicOrdering::Relaxed);
        Ok(Self {
            id,
            columns,
            store: RowStore::new(id),
            indexes: Vec::new(),
            verbose: false,
            paranoia: false,
            sink: Box::new(LogSink),
            live: true,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Insert rows and return their clones. Rows already carrying a
    /// table back-reference are skipped (re-insert guard).
    pub fn insert(&mut self, rows: Vec<Row>) -> Result<Vec<Row>> {
        self.ensure_live()?;
        let rows: Vec<Row> = rows.into_iter().filter(|r| !r.is_clone()).collect();
        for row in &rows {
            self.check_row_columns(row)?;
        }

        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            ids.push(self.store.insert(row.into_cells()));
        }
        for index in &mut self.indexes {
            index.merge_add(&self.store, &ids)?;
        }
        if self.paranoia {
            self.validate_index()?;
        }
        self.emit(TableEvent::Insert { count: ids.len() });
        Ok(ids.iter().filter_map(|id| self.store.clone_row(*id)).collect())
    }

    /// Apply caller edits made on clones. Each clone's cells are diffed
    /// against its snapshot; unchanged rows are a no-op, otherwise every
    /// index touching a changed column is merge-removed under the old
    /// cells and merge-added under the new ones. The clone's snapshot is
    /// refreshed so it can be edited and updated again.
    pub fn update(&mut self, rows: &mut [Row]) -> Result<()> {
        self.ensure_live()?;
        for row in rows.iter_mut() {
            let row_id = self.resolve(row)?;
            self.check_row_columns(row)?;
            let changed = row.changed_columns(&self.columns);
            if changed.is_empty() {
                continue;
            }

            let affected: Vec<usize> = self
                .indexes
                .iter()
                .enumerate()
                .filter(|(_, index)| index.columns().iter().any(|c| changed.contains(c)))
                .map(|(i, _)| i)
                .collect();

            for i in &affected {
                self.indexes[*i].merge_remove(&self.store, &[row_id])?;
            }
            if self.paranoia {
                for i in &affected {
                    self.indexes[*i].validate()?;
                }
            }
            self.store.overwrite(row_id, row.cells().clone());
            for i in &affected {
                self.indexes[*i].merge_add(&self.store, &[row_id])?;
            }

            row.refresh_snapshot();
            self.emit(TableEvent::Update { row_id, changed });
        }
        if self.paranoia {
            self.validate_index()?;
        }
        Ok(())
    }

    /// Remove the canonical rows behind the given clones
    pub fn remove(&mut self, rows: &[Row]) -> Result<()> {
        self.ensure_live()?;
        let mut ids: Vec<RowId> = Vec::with_capacity(rows.len());
        for row in rows {
            let id = self.resolve(row)?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        for index in &mut self.indexes {
            index.merge_remove(&self.store, &ids)?;
        }
        for id in &ids {
            self.store.swap_remove(*id);
        }
        if self.paranoia {
            self.validate_index()?;
        }
        for id in ids {
            self.emit(TableEvent::Remove { row_id: id });
        }
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Start a conjunctive query
    pub fn find_where(
        &self,
        column: &str,
        op: &str,
        operand: impl Into<Operand>,
    ) -> Result<Query<'_>> {
        self.ensure_live()?;
        Query::new(self).and(column, op, operand)
    }

    /// Clones of every row, in position order
    pub fn get_rows(&self) -> Result<Vec<Row>> {
        self.ensure_live()?;
        Ok(self
            .store
            .ids()
            .filter_map(|id| self.store.clone_row(id))
            .collect())
    }

    pub fn get_count(&self) -> Result<usize> {
        self.ensure_live()?;
        Ok(self.store.len())
    }

    /// Fresh snapshot of the canonical row behind a clone
    pub fn refresh(&self, row: &Row) -> Result<Row> {
        self.ensure_live()?;
        let id = self.resolve(row)?;
        self.store.clone_row(id).ok_or_else(|| {
            RowdexError::WrongTable(format!("row {} is no longer present", id))
        })
    }

    // ========================================================================
    // Indexes
    // ========================================================================

    /// Create an index over the given columns, or return the existing
    /// one when the signature is already present.
    pub fn ensure_index(&mut self, columns: &[&str]) -> Result<&Index> {
        self.ensure_live()?;
        if columns.is_empty() {
            return Err(RowdexError::InvalidColumns(
                "an index needs at least one column".to_string(),
            ));
        }
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        for (i, column) in columns.iter().enumerate() {
            self.check_column(column)?;
            if columns[..i].contains(column) {
                return Err(RowdexError::InvalidColumns(format!(
                    "duplicate index column: {}",
                    column
                )));
            }
        }

        let signature = Index::signature_of(&columns);
        if let Some(pos) = self.indexes.iter().position(|i| i.signature() == signature) {
            return Ok(&self.indexes[pos]);
        }

        let mut index = Index::new(columns);
        index.rebuild(&self.store)?;
        if self.paranoia {
            index.validate()?;
        }
        self.emit(TableEvent::IndexBuilt {
            signature,
            rows: self.store.len(),
        });
        self.indexes.push(index);
        let last = self.indexes.len() - 1;
        Ok(&self.indexes[last])
    }

    /// Current index signatures, each as its column list
    pub fn index_signatures(&self) -> Vec<Vec<String>> {
        self.indexes
            .iter()
            .map(|i| i.columns().to_vec())
            .collect()
    }

    /// Drop the index with this exact column list
    pub fn drop_index(&mut self, columns: &[&str]) -> Result<()> {
        self.ensure_live()?;
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        let signature = Index::signature_of(&columns);
        let Some(pos) = self.indexes.iter().position(|i| i.signature() == signature) else {
            return Err(RowdexError::IndexDropped(signature));
        };
        let mut index = self.indexes.remove(pos);
        index.drop_structure();
        self.emit(TableEvent::IndexDropped { signature });
        Ok(())
    }

    /// Validate every index: the structural invariants plus agreement
    /// between leaf row ids and the row store.
    pub fn validate_index(&self) -> Result<()> {
        self.ensure_live()?;
        let mut store_ids: Vec<RowId> = self.store.ids().collect();
        store_ids.sort_unstable();
        for index in &self.indexes {
            index.validate()?;
            let mut leaf_ids = index.row_ids()?;
            leaf_ids.sort_unstable();
            if leaf_ids != store_ids {
                return Err(RowdexError::IndexCorruption(format!(
                    "{}: leaf rows disagree with the row store",
                    index.signature()
                )));
            }
        }
        Ok(())
    }

    // ========================================================================
    // Modes and lifecycle
    // ========================================================================

    /// Check every index after each mutation when on
    pub fn paranoia(&mut self, on: bool) {
        self.paranoia = on;
    }

    pub fn is_paranoid(&self) -> bool {
        self.paranoia
    }

    /// Emit operation events to the sink when on
    pub fn verbose(&mut self, on: bool) {
        self.verbose = on;
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Replace the event sink
    pub fn set_event_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sink = sink;
    }

    /// Drop the table: release rows, drop every index depth-first, and
    /// make all further operations fail with `TableDropped`.
    pub fn drop(&mut self) {
        if !self.live {
            return;
        }
        self.emit(TableEvent::Dropped);
        self.live = false;
        for index in &mut self.indexes {
            index.drop_structure();
        }
        self.indexes.clear();
        self.store.clear();
    }

    pub fn is_dropped(&self) -> bool {
        !self.live
    }

    // ========================================================================
    // Internals
    // ========================================================================

    pub(crate) fn plan_for(&self, criteria: &[Criterion]) -> Result<AccessPlan> {
        self.ensure_live()?;
        plan(&self.store, &self.indexes, criteria)
    }

    pub(crate) fn run_query(&self, criteria: &[Criterion]) -> Result<Vec<Row>> {
        self.ensure_live()?;
        let chosen = plan(&self.store, &self.indexes, criteria)?;
        let mut ids: Vec<RowId> = match &chosen.signature {
            None => self.store.ids().collect(),
            Some(signature) => {
                let index = self
                    .indexes
                    .iter()
                    .find(|i| i.signature() == signature.as_str())
                    .ok_or_else(|| RowdexError::IndexDropped(signature.clone()))?;
                index.reduce(&chosen.criteria_used)?
            }
        };
        filter_residual(&self.store, &mut ids, &chosen.criteria_unused);

        let rows: Vec<Row> = ids.iter().filter_map(|id| self.store.clone_row(*id)).collect();
        self.emit(TableEvent::Query {
            criteria: criteria.iter().map(ToString::to_string).collect(),
            signature: chosen.signature.clone(),
            cost: chosen.cost,
            matched: rows.len(),
        });
        Ok(rows)
    }

    pub(crate) fn check_column(&self, column: &str) -> Result<()> {
        if self.columns.iter().any(|c| c.as_str() == column) {
            Ok(())
        } else {
            Err(RowdexError::InvalidColumns(format!("unknown column: {}", column)))
        }
    }

    fn check_row_columns(&self, row: &Row) -> Result<()> {
        for column in row.columns() {
            self.check_column(column)?;
        }
        Ok(())
    }

    /// Resolve a clone's back-reference to a live canonical row
    fn resolve(&self, row: &Row) -> Result<RowId> {
        let Some(origin) = row.origin() else {
            return Err(RowdexError::WrongTable(
                "row carries no table back-reference".to_string(),
            ));
        };
        if origin.table_id != self.id {
            return Err(RowdexError::WrongTable(format!(
                "row belongs to table {}, not table {}",
                origin.table_id, self.id
            )));
        }
        if !self.store.contains(origin.row_id) {
            return Err(RowdexError::WrongTable(format!(
                "row {} is no longer present",
                origin.row_id
            )));
        }
        Ok(origin.row_id)
    }

    fn ensure_live(&self) -> Result<()> {
        if self.live {
            Ok(())
        } else {
            Err(RowdexError::TableDropped)
        }
    }

    fn emit(&self, event: TableEvent) {
        if self.verbose {
            self.sink.emit(&event);
        }
    }
}
