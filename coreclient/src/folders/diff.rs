// SPDX-FileCopyrightText: 2026 Plume Labs <hello@plume.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Minimal-diff computation between two display lists
//!
//! The presentation layer keeps a live indexed view of the folder screen;
//! instead of rebinding the whole list on every change, it applies the edit
//! script computed here. The script is correct when applied in emission order
//! and near-minimal; exact minimality is not a goal.

/// A single edit applied to a live indexed view.
///
/// Indices refer to the state of the view after all preceding ops of the same
/// script have been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp<T> {
    Insert { at: usize, item: T },
    Remove { at: usize },
    Move { from: usize, to: usize },
    Update { at: usize, item: T },
}

/// Identity and content equality of display rows.
///
/// `same_identity` decides whether two rows are the same logical row (and
/// thus eligible for a move or in-place update); `same_content` decides
/// whether a row with unchanged identity needs an update. Each row kind
/// defines its own predicates.
pub trait DiffEntry {
    fn same_identity(&self, other: &Self) -> bool;
    fn same_content(&self, other: &Self) -> bool;
}

/// [`diff_with`] using the predicates of [`DiffEntry`].
pub fn diff<T: DiffEntry + Clone>(old: &[T], new: &[T]) -> Vec<EditOp<T>> {
    diff_with(old, new, T::same_identity, T::same_content)
}

/// Computes an edit script transforming `old` into `new`.
///
/// Pure and deterministic. Applying the script in emission order (see
/// [`apply_edits`]) reproduces `new` exactly, including rows with duplicated
/// identities.
pub fn diff_with<T: Clone>(
    old: &[T],
    new: &[T],
    same_identity: impl Fn(&T, &T) -> bool,
    same_content: impl Fn(&T, &T) -> bool,
) -> Vec<EditOp<T>> {
    let mut ops = Vec::new();
    let mut work: Vec<&T> = old.iter().collect();

    // Drop rows without a counterpart in the new list, back to front so that
    // the indices of earlier removals stay valid.
    for index in (0..work.len()).rev() {
        if !new.iter().any(|item| same_identity(work[index], item)) {
            work.remove(index);
            ops.push(EditOp::Remove { at: index });
        }
    }

    // Walk the target list; at each position the wanted row is either already
    // in place, found further down and moved up, or missing and inserted.
    for (target, item) in new.iter().enumerate() {
        let found = (target..work.len()).find(|&index| same_identity(work[index], item));
        match found {
            Some(from) if from == target => {
                if !same_content(work[target], item) {
                    work[target] = item;
                    ops.push(EditOp::Update {
                        at: target,
                        item: item.clone(),
                    });
                }
            }
            Some(from) => {
                let row = work.remove(from);
                work.insert(target, item);
                ops.push(EditOp::Move { from, to: target });
                if !same_content(row, item) {
                    ops.push(EditOp::Update {
                        at: target,
                        item: item.clone(),
                    });
                }
            }
            None => {
                work.insert(target, item);
                ops.push(EditOp::Insert {
                    at: target,
                    item: item.clone(),
                });
            }
        }
    }

    // Surplus rows with duplicated identities may remain past the end.
    for index in (new.len()..work.len()).rev() {
        ops.push(EditOp::Remove { at: index });
    }

    ops
}

/// Applies an edit script produced by [`diff_with`] to an indexed view.
pub fn apply_edits<T: Clone>(items: &mut Vec<T>, ops: &[EditOp<T>]) {
    for op in ops {
        match op {
            EditOp::Insert { at, item } => items.insert(*at, item.clone()),
            EditOp::Remove { at } => {
                items.remove(*at);
            }
            EditOp::Move { from, to } => {
                let item = items.remove(*from);
                items.insert(*to, item);
            }
            EditOp::Update { at, item } => items[*at] = item.clone(),
        }
    }
}
