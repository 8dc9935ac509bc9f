// SPDX-FileCopyrightText: 2026 Plume Labs <hello@plume.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Canonical linear ordering of the folder list
//!
//! The server owns the relative order of the user-defined folders; the
//! positions of the two fixed lists are persisted separately and may be stale
//! relative to the folder list (folders added or removed by other sessions).
//! [`reconcile`] merges the three into a single presentation order.

use plumecommon::identifiers::FolderRef;
use thiserror::Error;

use super::{FolderInfo, FolderSnapshot};

/// A row of the reconciled folder group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderListEntry {
    Main,
    Archive,
    Folder(FolderInfo),
}

impl FolderListEntry {
    pub fn folder_ref(&self) -> FolderRef {
        match self {
            Self::Main => FolderRef::Main,
            Self::Archive => FolderRef::Archive,
            Self::Folder(info) => FolderRef::User(info.id),
        }
    }
}

/// Violation of the slot-walk invariant.
///
/// Clamping guarantees that the two pseudo-folders land on distinct slots,
/// leaving exactly one slot per folder; hitting either variant is a defect in
/// this module, not bad input. Callers keep their last good list and
/// resynchronize instead of displaying a corrupted order.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("no folder left to fill slot {slot}")]
    SlotUnderflow { slot: usize },
    #[error("slot walk ended with {left} folders left over")]
    FoldersLeftOver { left: usize },
}

/// Computes the presentation order of the folder group.
///
/// `main_position` is clamped to `[0, folders.len()]` and `archive_position`
/// to `[0, folders.len() + 1]`. If both positions coincide, archive keeps the
/// contested slot and main moves one slot past it; main never silently
/// disappears.
pub fn reconcile(
    folders: &[FolderInfo],
    main_position: u32,
    archive_position: u32,
) -> Result<Vec<FolderListEntry>, ReconcileError> {
    let slot_count = folders.len() + 2;
    let mut main_position = (main_position as usize).min(folders.len());
    let archive_position = (archive_position as usize).min(slot_count - 1);
    if main_position == archive_position {
        main_position += 1;
    }

    let mut entries = Vec::with_capacity(slot_count);
    let mut pending = folders.iter();
    for slot in 0..slot_count {
        if slot == main_position {
            entries.push(FolderListEntry::Main);
        } else if slot == archive_position {
            entries.push(FolderListEntry::Archive);
        } else {
            let folder = pending
                .next()
                .ok_or(ReconcileError::SlotUnderflow { slot })?;
            entries.push(FolderListEntry::Folder(folder.clone()));
        }
    }
    let left = pending.len();
    if left > 0 {
        return Err(ReconcileError::FoldersLeftOver { left });
    }
    Ok(entries)
}

/// [`reconcile`] over a [`FolderSnapshot`].
pub fn reconcile_snapshot(
    snapshot: &FolderSnapshot,
) -> Result<Vec<FolderListEntry>, ReconcileError> {
    reconcile(
        &snapshot.folders,
        snapshot.main_position,
        snapshot.archive_position,
    )
}
