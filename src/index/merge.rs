//! Incremental merge of a freshly built right-hand tree into the live
//! left-hand tree
//!
//! Both sides share the same column shape, so the merge descends in
//! lockstep: two cursors walk each level comparing key values. Adding,
//! the right side contributes new entries and grows matching ones;
//! removing, every right key must find its left counterpart or the index
//! is corrupt. Subtotals are patched in the same pass so prefix sums stay
//! valid without a rebuild.

use std::cmp::Ordering;

use crate::data::compare;
use crate::{Result, RowdexError};

use super::{Level, Node};

/// Merge `right` (built from newly inserted rows) into `left`.
pub(crate) fn merge_add_level(left: &mut Level, right: Level, signature: &str) -> Result<()> {
    let mut li = 0;
    let mut rit = right.entries.into_iter().peekable();
    // Rows contributed by right-side entries merged before the cursor;
    // every surviving left entry's subtotal shifts up by this much.
    let mut inserted = 0;

    loop {
        match (li < left.entries.len(), rit.peek()) {
            (true, Some(re)) => match compare(&left.entries[li].value, &re.value) {
                Ordering::Less => {
                    left.entries[li].subtotal += inserted;
                    li += 1;
                }
                Ordering::Greater => {
                    let Some(mut entry) = rit.next() else { break };
                    inserted += entry.size;
                    let preceding = if li == 0 {
                        0
                    } else {
                        left.entries[li - 1].subtotal
                    };
                    entry.subtotal = preceding + entry.size;
                    left.entries.insert(li, entry);
                    li += 1;
                }
                Ordering::Equal => {
                    let Some(re) = rit.next() else { break };
                    let le = &mut left.entries[li];
                    match (&mut le.down, re.down) {
                        (Node::Branch(lsub), Node::Branch(rsub)) => {
                            merge_add_level(lsub, rsub, signature)?;
                        }
                        (Node::Rows(lrows), Node::Rows(rrows)) => {
                            lrows.extend(rrows);
                        }
                        _ => {
                            return Err(shape_mismatch(signature, &le.value));
                        }
                    }
                    le.size += re.size;
                    le.subtotal += inserted + re.size;
                    inserted += re.size;
                    li += 1;
                }
            },
            (true, None) => {
                left.entries[li].subtotal += inserted;
                li += 1;
            }
            (false, Some(_)) => {
                let Some(mut entry) = rit.next() else { break };
                inserted += entry.size;
                entry.subtotal = left.last_subtotal() + entry.size;
                left.entries.push(entry);
                // Step past the pushed entry, or the next iteration treats
                // it as a surviving left entry and shifts it again.
                li += 1;
            }
            (false, None) => break,
        }
    }

    left.total += right.total;
    // Insertions cannot perturb order here, but the sorted invariant is
    // cheap to restate and the sort is stable.
    left.entries.sort_by(|a, b| compare(&a.value, &b.value));
    Ok(())
}

/// Merge-subtract `right` (built from the rows being removed) out of
/// `left`. A right-side key with no left counterpart means the index no
/// longer reflects the row store.
pub(crate) fn merge_remove_level(left: &mut Level, right: Level, signature: &str) -> Result<()> {
    let mut li = 0;
    let mut rit = right.entries.into_iter().peekable();
    // Rows already subtracted before the cursor.
    let mut removed = 0;

    loop {
        match (li < left.entries.len(), rit.peek()) {
            (true, Some(re)) => match compare(&left.entries[li].value, &re.value) {
                Ordering::Less => {
                    left.entries[li].subtotal = checked_shrink(
                        left.entries[li].subtotal,
                        removed,
                        signature,
                        &left.entries[li].value,
                    )?;
                    li += 1;
                }
                Ordering::Greater => {
                    return Err(missing_key(signature, &re.value));
                }
                Ordering::Equal => {
                    let Some(re) = rit.next() else { break };
                    let le = &mut left.entries[li];
                    match (&mut le.down, re.down) {
                        (Node::Branch(lsub), Node::Branch(rsub)) => {
                            merge_remove_level(lsub, rsub, signature)?;
                        }
                        (Node::Rows(lrows), Node::Rows(rrows)) => {
                            for victim in rrows {
                                // Walk in reverse so positions stay valid
                                // while deleting in place.
                                let found = (0..lrows.len()).rev().find(|&i| lrows[i] == victim);
                                match found {
                                    Some(i) => {
                                        lrows.remove(i);
                                    }
                                    None => {
                                        return Err(missing_key(signature, &le.value));
                                    }
                                }
                            }
                        }
                        _ => {
                            return Err(shape_mismatch(signature, &le.value));
                        }
                    }
                    le.size = checked_shrink(le.size, re.size, signature, &le.value)?;
                    le.subtotal =
                        checked_shrink(le.subtotal, removed + re.size, signature, &le.value)?;
                    removed += re.size;
                    if le.size == 0 {
                        left.entries.remove(li);
                    } else {
                        li += 1;
                    }
                }
            },
            (true, None) => {
                left.entries[li].subtotal = checked_shrink(
                    left.entries[li].subtotal,
                    removed,
                    signature,
                    &left.entries[li].value,
                )?;
                li += 1;
            }
            (false, Some(re)) => {
                return Err(missing_key(signature, &re.value));
            }
            (false, None) => break,
        }
    }

    left.total = left
        .total
        .checked_sub(right.total)
        .ok_or_else(|| RowdexError::IndexCorruption(format!(
            "{}: removal total {} exceeds level total {}",
            signature, right.total, left.total
        )))?;
    Ok(())
}

fn checked_shrink(
    current: usize,
    by: usize,
    signature: &str,
    value: &crate::data::Value,
) -> Result<usize> {
    current.checked_sub(by).ok_or_else(|| {
        RowdexError::IndexCorruption(format!(
            "{}: count underflow at key {}",
            signature, value
        ))
    })
}

fn missing_key(signature: &str, value: &crate::data::Value) -> RowdexError {
    RowdexError::IndexCorruption(format!(
        "{}: key {} scheduled for removal is not present",
        signature, value
    ))
}

fn shape_mismatch(signature: &str, value: &crate::data::Value) -> RowdexError {
    RowdexError::IndexCorruption(format!(
        "{}: leaf/branch shape mismatch at key {}",
        signature, value
    ))
}
