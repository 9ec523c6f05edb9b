//! Query executor — index reduction and residual filtering
//!
//! The winning plan's used criteria walk the real index with the same
//! per-column, per-operator logic the cost model used, but collecting
//! entry slices instead of counts. Remaining levels flatten into a row
//! id list, and whatever criteria the index could not satisfy run as a
//! linear filter against the canonical cells.

use crate::data::RowId;
use crate::index::{probe, Entry, Index, Level, Node};
use crate::query::{Criterion, Operand, Operator};
use crate::table::store::RowStore;
use crate::{Result, RowdexError};

impl Index {
    /// Walk the tree with the plan's used criteria (in descent order)
    /// and produce the candidate row ids.
    pub(crate) fn reduce(&self, criteria: &[Criterion]) -> Result<Vec<RowId>> {
        let root = self.root()?;
        let mut frontier: Vec<&Level> = vec![root];
        let mut selected: Vec<&Entry> = Vec::new();

        for (depth, criterion) in criteria.iter().enumerate() {
            selected.clear();
            for level in &frontier {
                select_entries(level, criterion, &mut selected)?;
            }
            if depth + 1 < criteria.len() {
                frontier.clear();
                for entry in &selected {
                    match entry.down() {
                        Node::Branch(sub) => frontier.push(sub),
                        Node::Rows(_) => {
                            return Err(RowdexError::IndexCorruption(format!(
                                "{}: ran out of levels while criteria remain",
                                self.signature()
                            )));
                        }
                    }
                }
            }
        }

        let mut ids = Vec::new();
        if criteria.is_empty() {
            flatten_level(root, &mut ids);
        } else {
            for entry in &selected {
                flatten_node(entry.down(), &mut ids);
            }
        }
        Ok(ids)
    }
}

/// Collect the entries of one level matching one criterion
fn select_entries<'a>(
    level: &'a Level,
    criterion: &Criterion,
    out: &mut Vec<&'a Entry>,
) -> Result<()> {
    let entries = level.entries();
    match (criterion.op(), criterion.operand()) {
        (Operator::Equal, Operand::Value(value)) => {
            let p = probe(entries, value);
            if p.exact {
                out.push(&entries[p.pos]);
            }
        }
        (Operator::NotEqual, Operand::Value(value)) => {
            let p = probe(entries, value);
            for (i, entry) in entries.iter().enumerate() {
                if !(p.exact && i == p.pos) {
                    out.push(entry);
                }
            }
        }
        (Operator::LessThan, Operand::Value(value)) => {
            let p = probe(entries, value);
            out.extend(&entries[..p.pos]);
        }
        (Operator::LessEqual, Operand::Value(value)) => {
            let p = probe(entries, value);
            out.extend(&entries[..p.pos + p.exact as usize]);
        }
        (Operator::GreaterEqual, Operand::Value(value)) => {
            let p = probe(entries, value);
            out.extend(&entries[p.pos..]);
        }
        (Operator::GreaterThan, Operand::Value(value)) => {
            let p = probe(entries, value);
            out.extend(&entries[p.pos + p.exact as usize..]);
        }
        (Operator::Between, Operand::Range(range)) => {
            let lo = probe(entries, range.start());
            let hi = probe(entries, range.end());
            let begin = lo.pos;
            let end = hi.pos + (hi.exact && !range.is_exclusive()) as usize;
            out.extend(&entries[begin..end.max(begin)]);
        }
        (Operator::In, Operand::Set(set)) => {
            for value in set.distinct() {
                let p = probe(entries, &value);
                if p.exact {
                    out.push(&entries[p.pos]);
                }
            }
        }
        (op, _) => {
            return Err(RowdexError::UnknownOperator(format!(
                "operator {} cannot drive an index walk with this operand",
                op
            )));
        }
    }
    Ok(())
}

fn flatten_node(node: &Node, out: &mut Vec<RowId>) {
    match node {
        Node::Rows(rows) => out.extend(rows),
        Node::Branch(level) => flatten_level(level, out),
    }
}

fn flatten_level(level: &Level, out: &mut Vec<RowId>) {
    for entry in level.entries() {
        flatten_node(entry.down(), out);
    }
}

/// Apply residual criteria as a linear filter over canonical cells
pub(crate) fn filter_residual(store: &RowStore, ids: &mut Vec<RowId>, criteria: &[Criterion]) {
    if criteria.is_empty() {
        return;
    }
    ids.retain(|id| {
        criteria
            .iter()
            .all(|c| c.matches_value(store.value_of(*id, c.column())))
    });
}
