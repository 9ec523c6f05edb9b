//! Structural validation
//!
//! Re-checks every invariant the merge algorithms are supposed to
//! preserve: strict ordering, positive sizes, size/total agreement
//! between a branch entry and its nested level, and subtotal prefix
//! sums. The error message names the key path where the check failed.

use std::cmp::Ordering;

use crate::data::compare;
use crate::{Result, RowdexError};

use super::{Index, Level, Node};

impl Index {
    /// Verify the whole tree; cheap enough to run after every mutation
    /// in paranoia mode.
    pub fn validate(&self) -> Result<()> {
        let root = self.root()?;
        validate_level(root, self.columns(), 0, self.signature())
    }
}

fn validate_level(level: &Level, columns: &[String], depth: usize, path: &str) -> Result<()> {
    let leaf = depth + 1 == columns.len();
    let mut running = 0;

    for (i, entry) in level.entries.iter().enumerate() {
        let here = format!("{}/{}={}", path, columns[depth], entry.value);

        if i > 0 && compare(&level.entries[i - 1].value, &entry.value) != Ordering::Less {
            return Err(corrupt(&here, "entries not strictly sorted"));
        }
        if entry.size == 0 {
            return Err(corrupt(&here, "entry has size 0"));
        }

        match &entry.down {
            Node::Rows(rows) => {
                if !leaf {
                    return Err(corrupt(&here, "row list above the leaf level"));
                }
                if rows.len() != entry.size {
                    return Err(corrupt(
                        &here,
                        &format!("size {} != row count {}", entry.size, rows.len()),
                    ));
                }
            }
            Node::Branch(sub) => {
                if leaf {
                    return Err(corrupt(&here, "nested level at the leaf"));
                }
                if sub.total != entry.size {
                    return Err(corrupt(
                        &here,
                        &format!("size {} != nested total {}", entry.size, sub.total),
                    ));
                }
                validate_level(sub, columns, depth + 1, &here)?;
            }
        }

        running += entry.size;
        if entry.subtotal != running {
            return Err(corrupt(
                &here,
                &format!("subtotal {} != prefix sum {}", entry.subtotal, running),
            ));
        }
    }

    if level.total != running {
        return Err(corrupt(
            path,
            &format!("level total {} != sum of sizes {}", level.total, running),
        ));
    }
    Ok(())
}

fn corrupt(path: &str, what: &str) -> RowdexError {
    RowdexError::IndexCorruption(format!("{}: {}", path, what))
}
