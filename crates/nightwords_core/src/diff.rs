//! Identity-aware list diffing.
//!
//! # Responsibility
//! - Compute the edit script that turns one ordered sequence into another.
//! - Match rows by identity key; use content only to decide rebinding.
//!
//! # Invariants
//! - Keys are unique within each input sequence (`DiffError::DuplicateKey`
//!   otherwise).
//! - A key present on both sides is never emitted as remove + insert.
//! - Rows on the longest common subsequence of keys never move; every other
//!   surviving row moves exactly once.
//! - Ops are emitted in apply order: removes (descending), moves (new
//!   order), inserts (ascending), updates (ascending). Each index refers to
//!   the list as left by the preceding op.
//! - Output depends only on the inputs.

use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::hash::Hash;

/// Row identity and content comparison used by [`diff`].
pub trait Diffable {
    type Key: Eq + Hash + Clone;

    /// Stable identity. Two rows are the same row iff their keys are equal.
    fn key(&self) -> Self::Key;

    /// Whether two rows with the same key render identically.
    fn same_content(&self, other: &Self) -> bool;
}

/// One edit step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffOp {
    /// Remove the row at `at`.
    Remove { at: usize },
    /// Remove the row at `from`, then insert it at `to`.
    Move { from: usize, to: usize },
    /// Insert `new[index]` at `index`.
    Insert { index: usize },
    /// Replace the row at `index` with `new[index]`.
    Update { index: usize },
}

/// Per-kind op totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffCounts {
    pub removed: usize,
    pub moved: usize,
    pub inserted: usize,
    pub updated: usize,
}

/// Which input held a duplicate key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffSide {
    Old,
    New,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffError {
    DuplicateKey { side: DiffSide, index: usize },
}

impl Display for DiffError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateKey { side, index } => {
                let side = match side {
                    DiffSide::Old => "old",
                    DiffSide::New => "new",
                };
                write!(f, "duplicate row key in {side} sequence at index {index}")
            }
        }
    }
}

impl Error for DiffError {}

/// Ordered edit script produced by [`diff`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    ops: Vec<DiffOp>,
}

impl DiffResult {
    pub fn ops(&self) -> &[DiffOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn counts(&self) -> DiffCounts {
        let mut counts = DiffCounts::default();
        for op in &self.ops {
            match op {
                DiffOp::Remove { .. } => counts.removed += 1,
                DiffOp::Move { .. } => counts.moved += 1,
                DiffOp::Insert { .. } => counts.inserted += 1,
                DiffOp::Update { .. } => counts.updated += 1,
            }
        }
        counts
    }

    /// Replays the script on `rows`, pulling inserted and updated values
    /// from `new`.
    ///
    /// # Panics
    /// Panics when `rows` and `new` are not the sequences this result was
    /// computed from.
    pub fn apply<T: Clone>(&self, rows: &mut Vec<T>, new: &[T]) {
        for op in &self.ops {
            match *op {
                DiffOp::Remove { at } => {
                    rows.remove(at);
                }
                DiffOp::Move { from, to } => {
                    let row = rows.remove(from);
                    rows.insert(to, row);
                }
                DiffOp::Insert { index } => rows.insert(index, new[index].clone()),
                DiffOp::Update { index } => rows[index] = new[index].clone(),
            }
        }
    }
}

impl<'a> IntoIterator for &'a DiffResult {
    type Item = &'a DiffOp;
    type IntoIter = std::slice::Iter<'a, DiffOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

/// Computes the edit script from `old` to `new`.
///
/// # Errors
/// Returns `DiffError::DuplicateKey` when either side repeats a key.
pub fn diff<T: Diffable>(old: &[T], new: &[T]) -> Result<DiffResult, DiffError> {
    let old_positions = index_keys(old, DiffSide::Old)?;
    let new_positions = index_keys(new, DiffSide::New)?;
    let mut ops = Vec::new();

    for (at, row) in old.iter().enumerate().rev() {
        if !new_positions.contains_key(&row.key()) {
            ops.push(DiffOp::Remove { at });
        }
    }

    // Surviving rows in current order, each tagged by its target position.
    let mut working: Vec<usize> = old
        .iter()
        .filter_map(|row| new_positions.get(&row.key()).copied())
        .collect();
    let stable = longest_increasing(&working, new.len());

    let mut previous: Option<usize> = None;
    for (target, row) in new.iter().enumerate() {
        if !old_positions.contains_key(&row.key()) {
            continue;
        }
        if !stable[target] {
            let from = position_of(&working, target);
            working.remove(from);
            let to = previous.map_or(0, |anchor| position_of(&working, anchor) + 1);
            working.insert(to, target);
            if from != to {
                ops.push(DiffOp::Move { from, to });
            }
        }
        previous = Some(target);
    }

    for (index, row) in new.iter().enumerate() {
        if !old_positions.contains_key(&row.key()) {
            ops.push(DiffOp::Insert { index });
        }
    }

    for (index, row) in new.iter().enumerate() {
        if let Some(&old_index) = old_positions.get(&row.key()) {
            if !old[old_index].same_content(row) {
                ops.push(DiffOp::Update { index });
            }
        }
    }

    Ok(DiffResult { ops })
}

fn index_keys<T: Diffable>(
    rows: &[T],
    side: DiffSide,
) -> Result<HashMap<T::Key, usize>, DiffError> {
    let mut positions = HashMap::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        if positions.insert(row.key(), index).is_some() {
            return Err(DiffError::DuplicateKey { side, index });
        }
    }
    Ok(positions)
}

// `working` always holds every surviving target exactly once.
fn position_of(working: &[usize], target: usize) -> usize {
    working
        .iter()
        .position(|&value| value == target)
        .unwrap_or(working.len())
}

/// Marks the targets on one longest increasing subsequence of `sequence`.
///
/// Patience sorting: each value lands on the leftmost pile whose top is not
/// smaller, remembering the top of the pile to its left.
fn longest_increasing(sequence: &[usize], universe: usize) -> Vec<bool> {
    let mut tops: Vec<usize> = Vec::new();
    let mut back_links: Vec<Option<usize>> = vec![None; sequence.len()];

    for (i, &value) in sequence.iter().enumerate() {
        let pile = tops.partition_point(|&top| sequence[top] < value);
        if pile > 0 {
            back_links[i] = Some(tops[pile - 1]);
        }
        if pile == tops.len() {
            tops.push(i);
        } else {
            tops[pile] = i;
        }
    }

    let mut on_sequence = vec![false; universe];
    let mut cursor = tops.last().copied();
    while let Some(i) = cursor {
        on_sequence[sequence[i]] = true;
        cursor = back_links[i];
    }
    on_sequence
}

#[cfg(test)]
mod tests {
    use super::{diff, longest_increasing, DiffOp, Diffable};

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Row(u32, &'static str);

    impl Diffable for Row {
        type Key = u32;

        fn key(&self) -> u32 {
            self.0
        }

        fn same_content(&self, other: &Self) -> bool {
            self.1 == other.1
        }
    }

    #[test]
    fn longest_increasing_marks_expected_targets() {
        let marks = longest_increasing(&[3, 0, 1, 2], 4);
        assert_eq!(marks, vec![true, true, true, false]);
    }

    #[test]
    fn rotation_costs_a_single_move() {
        let old = vec![Row(1, "a"), Row(2, "b"), Row(3, "c"), Row(4, "d")];
        let new = vec![Row(2, "b"), Row(3, "c"), Row(4, "d"), Row(1, "a")];

        let result = diff(&old, &new).unwrap();
        assert_eq!(result.ops(), &[DiffOp::Move { from: 0, to: 3 }]);
    }

    #[test]
    fn content_change_is_update_not_reinsert() {
        let old = vec![Row(1, "a"), Row(2, "b")];
        let new = vec![Row(1, "a"), Row(2, "B")];

        let result = diff(&old, &new).unwrap();
        assert_eq!(result.ops(), &[DiffOp::Update { index: 1 }]);
    }
}
