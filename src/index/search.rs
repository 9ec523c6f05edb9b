//! Binary probe over a sorted entry run
//!
//! Returns an insertion-point/exact-match pair instead of the source's
//! half-integer convention: `exact` means `entries[pos]` compares equal
//! to the needle; otherwise `pos` counts the entries ordered before it,
//! so the needle falls between `pos − 1` and `pos`.

use std::cmp::Ordering;

use crate::data::{compare, Value};

use super::Entry;

/// Result of a binary probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Probe {
    /// Matching position when `exact`, insertion point (in `0..=len`)
    /// otherwise
    pub(crate) pos: usize,
    pub(crate) exact: bool,
}

impl Probe {
    /// The position on the half-integer scale the planner's arithmetic
    /// uses: the match index, or insertion point − 0.5.
    pub(crate) fn half_index(&self) -> f64 {
        if self.exact {
            self.pos as f64
        } else {
            self.pos as f64 - 0.5
        }
    }
}

/// Locate `value` in a sorted entry run. Bounds start one outside the
/// run on each side and the window narrows by midpoint comparison until
/// adjacent.
pub(crate) fn probe(entries: &[Entry], value: &Value) -> Probe {
    let mut lower: isize = -1;
    let mut upper: isize = entries.len() as isize;
    while upper - lower > 1 {
        let mid = (lower + upper) / 2;
        match compare(&entries[mid as usize].value, value) {
            Ordering::Less => lower = mid,
            _ => upper = mid,
        }
    }
    let pos = upper as usize;
    let exact = pos < entries.len() && compare(&entries[pos].value, value) == Ordering::Equal;
    Probe { pos, exact }
}
