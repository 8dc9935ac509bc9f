// SPDX-FileCopyrightText: 2026 Plume Labs <hello@plume.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Drag-reorder validation
//!
//! A [`DragSession`] tracks one drag gesture over the display list. It only
//! knows the current row order through the [`DragRow`] oracle and the user's
//! capabilities through [`ReorderCapabilities`]; it owns no view state.
//! Committing folds the final on-screen order back into the semantic
//! `(folder ids, main position, archive position)` form the snapshot uses.

use plumecommon::identifiers::{FolderId, FolderRef};
use thiserror::Error;

use super::reconcile::FolderListEntry;

/// Oracle over display rows: which rows belong to the folder group.
pub trait DragRow {
    /// `Some` for folder rows (the two fixed lists and user folders), `None`
    /// for everything else.
    fn folder_ref(&self) -> Option<FolderRef>;
}

impl DragRow for FolderListEntry {
    fn folder_ref(&self) -> Option<FolderRef> {
        Some(self.folder_ref())
    }
}

/// Capability flags consulted by the drag state machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReorderCapabilities {
    /// Entitled users may move the main list away from the top.
    pub can_move_main: bool,
    /// Relaxed rule letting the archive row pass rows that are otherwise not
    /// valid drop targets.
    pub allow_archive_anywhere: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReorderError {
    #[error("row is not a reorderable folder row")]
    NotAFolderRow,
    #[error("moving the main list requires entitlement")]
    MainNotMovable,
    #[error("a drag is already in progress")]
    AlreadyDragging,
}

/// Result of walking a committed drag order back into semantic form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderCommit {
    /// User-defined folder ids in their new relative order.
    pub folder_ids: Vec<FolderId>,
    pub main_position: u32,
    /// `u32::MAX` when archive ended up past the last folder, so it stays at
    /// the end as folders are added later.
    pub archive_position: u32,
}

/// An in-progress drag over a display list.
///
/// `Idle -> Dragging -> Committed | Cancelled`: [`DragSession::begin`] is the
/// `Idle -> Dragging` transition, [`DragSession::commit`] consumes the
/// session, and dropping it without committing is the cancellation.
#[derive(Debug, Clone)]
pub struct DragSession<T> {
    rows: Vec<T>,
    /// Index range of the folder group within `rows`.
    first: usize,
    last: usize,
    /// Current index of the dragged row.
    source: usize,
}

impl<T: DragRow + Clone> DragSession<T> {
    /// Starts a drag on the row at `index`.
    ///
    /// Only folder rows are draggable, and the main row only for entitled
    /// users; a rejected begin leaves the gesture unstarted so the caller can
    /// show an error indicator instead.
    pub fn begin(
        rows: &[T],
        index: usize,
        capabilities: ReorderCapabilities,
    ) -> Result<Self, ReorderError> {
        let folder_ref = rows
            .get(index)
            .and_then(DragRow::folder_ref)
            .ok_or(ReorderError::NotAFolderRow)?;
        if folder_ref.is_main() && !capabilities.can_move_main {
            return Err(ReorderError::MainNotMovable);
        }
        let first = rows
            .iter()
            .position(|row| row.folder_ref().is_some())
            .ok_or(ReorderError::NotAFolderRow)?;
        let last = rows
            .iter()
            .rposition(|row| row.folder_ref().is_some())
            .ok_or(ReorderError::NotAFolderRow)?;
        Ok(Self {
            rows: rows.to_vec(),
            first,
            last,
            source: index,
        })
    }

    /// Current row order of the session.
    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    /// Proposes moving the dragged row from `from` to `target`.
    ///
    /// `from` must be the dragged row's current index. Targets outside the
    /// folder group, or rows the dragged row may not pass, reject the move as
    /// a no-op.
    pub fn move_to(
        &mut self,
        from: usize,
        target: usize,
        capabilities: ReorderCapabilities,
    ) -> bool {
        if from != self.source || target < self.first || target > self.last {
            return false;
        }
        let Some(source_ref) = self.rows[self.source].folder_ref() else {
            return false;
        };
        let Some(target_ref) = self.rows[target].folder_ref() else {
            return false;
        };
        let target_movable = !target_ref.is_main() || capabilities.can_move_main;
        if !target_movable && !(capabilities.allow_archive_anywhere && source_ref.is_archive()) {
            return false;
        }
        let row = self.rows.remove(self.source);
        self.rows.insert(target, row);
        self.source = target;
        true
    }

    /// Commits the drag, folding the on-screen order back into semantic form.
    ///
    /// Main's stored position is decremented by one when it ended up after
    /// archive, since archive does not occupy a slot in the server-side
    /// order. A non-zero main position without entitlement is rejected; the
    /// caller restores the previous order from its snapshot.
    pub fn commit(self, capabilities: ReorderCapabilities) -> Result<ReorderCommit, ReorderError> {
        let mut folder_ids = Vec::new();
        let mut main_position = 0u32;
        let mut archive_position = 0u32;
        let mut walk_position = 0u32;
        for row in &self.rows[self.first..=self.last] {
            let Some(folder_ref) = row.folder_ref() else {
                continue;
            };
            match folder_ref {
                FolderRef::Main => main_position = walk_position,
                FolderRef::Archive => archive_position = walk_position,
                FolderRef::User(id) => folder_ids.push(id),
            }
            walk_position += 1;
        }
        if main_position > archive_position {
            main_position -= 1;
        }
        if archive_position as usize > folder_ids.len() {
            archive_position = u32::MAX;
        }
        if main_position != 0 && !capabilities.can_move_main {
            return Err(ReorderError::MainNotMovable);
        }
        Ok(ReorderCommit {
            folder_ids,
            main_position,
            archive_position,
        })
    }
}
