//! Bulk construction of index levels
//!
//! Sorts the rows by the level's column, groups runs of equal values into
//! entries with running subtotals, and recurses over the remaining
//! columns for each group. The sort is stable, so leaf row lists keep
//! the store's insertion order within a key.

use std::cmp::Ordering;

use crate::data::{compare, RowId};
use crate::table::store::RowStore;

use super::{Entry, Level, Node};

/// Build one level (and everything beneath it) over `ids`, keyed by
/// `columns[0]`.
pub(crate) fn build_level(store: &RowStore, ids: &[RowId], columns: &[String]) -> Level {
    let Some((first, rest)) = columns.split_first() else {
        return Level::default();
    };

    let mut sorted: Vec<RowId> = ids.to_vec();
    sorted.sort_by(|a, b| compare(store.value_of(*a, first), store.value_of(*b, first)));

    let mut level = Level::default();
    let mut run_start = 0;
    for i in 1..=sorted.len() {
        let boundary = i == sorted.len()
            || compare(
                store.value_of(sorted[i], first),
                store.value_of(sorted[run_start], first),
            ) != Ordering::Equal;
        if !boundary {
            continue;
        }

        let group = &sorted[run_start..i];
        let value = store.value_of(group[0], first).clone();
        let size = group.len();
        let down = if rest.is_empty() {
            Node::Rows(group.to_vec())
        } else {
            Node::Branch(build_level(store, group, rest))
        };
        let subtotal = level.last_subtotal() + size;
        level.entries.push(Entry { value, size, subtotal, down });
        run_start = i;
    }
    level.total = level.last_subtotal();
    level
}
