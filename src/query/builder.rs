//! Conjunctive query builder
//!
//! `table.find_where(...)` starts a query; `.and(...)` conjoins further
//! criteria. Column membership and the operator grammar are validated
//! eagerly, so a malformed predicate fails at build time rather than
//! during execution.

use crate::data::Row;
use crate::query::{AccessPlan, Criterion, Operand};
use crate::table::Table;
use crate::Result;

/// A query under construction; borrows its table
pub struct Query<'a> {
    table: &'a Table,
    criteria: Vec<Criterion>,
}

impl<'a> std::fmt::Debug for Query<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("criteria", &self.criteria)
            .finish()
    }
}

impl<'a> Query<'a> {
    pub(crate) fn new(table: &'a Table) -> Self {
        Self {
            table,
            criteria: Vec::new(),
        }
    }

    /// Conjoin one more criterion
    pub fn and(mut self, column: &str, op: &str, operand: impl Into<Operand>) -> Result<Self> {
        self.table.check_column(column)?;
        self.criteria.push(Criterion::new(column, op, operand)?);
        Ok(self)
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    /// The winning access plan, without executing
    pub fn explain(&self) -> Result<AccessPlan> {
        self.table.plan_for(&self.criteria)
    }

    /// Execute: reduce through the cheapest access path, filter the
    /// residual criteria, and return clones.
    pub fn get_rows(&self) -> Result<Vec<Row>> {
        self.table.run_query(&self.criteria)
    }
}
