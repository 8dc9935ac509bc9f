// SPDX-FileCopyrightText: 2026 Plume Labs <hello@plume.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Chat folder model and the engine operating on it
//!
//! A [`FolderSnapshot`] combines the server-defined folder list with the two
//! independently persisted pseudo-folder positions. [`reconcile`] turns a
//! snapshot into the single linear presentation order, [`diff_with`] computes
//! the edit script between two presentation orders, and [`DragSession`]
//! validates drag-reorder gestures and folds a committed order back into
//! snapshot form.

use plumecommon::identifiers::{ChatId, FolderId};
use serde::{Deserialize, Serialize};

mod client;
mod diff;
mod reconcile;
mod reorder;

pub use client::{
    FolderList, FolderListUpdate, FolderRequestError, FolderSettings, FoldersClient,
    FoldersResult, MemoryFolderSettings,
};
pub use diff::{DiffEntry, EditOp, apply_edits, diff, diff_with};
pub use reconcile::{FolderListEntry, ReconcileError, reconcile, reconcile_snapshot};
pub use reorder::{DragRow, DragSession, ReorderCapabilities, ReorderCommit, ReorderError};

/// Summary of a user-defined folder as delivered by the server folder list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderInfo {
    pub id: FolderId,
    pub title: String,
    pub icon: Option<String>,
}

/// Full editable definition of a folder.
///
/// This is the payload of create/edit requests and of recommended folder
/// suggestions. The inclusion rules select chats by kind, the exclusion rules
/// remove chats by state; explicit chat id lists override both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderDefinition {
    pub title: String,
    pub icon: Option<String>,
    pub pinned_chat_ids: Vec<ChatId>,
    pub included_chat_ids: Vec<ChatId>,
    pub excluded_chat_ids: Vec<ChatId>,
    pub include_contacts: bool,
    pub include_non_contacts: bool,
    pub include_bots: bool,
    pub include_groups: bool,
    pub include_channels: bool,
    pub exclude_muted: bool,
    pub exclude_read: bool,
    pub exclude_archived: bool,
}

/// The folder set as fed to the reconciler.
///
/// `main_position` and `archive_position` are persisted independently of the
/// folder list and may be stale relative to it; [`reconcile`] clamps them into
/// range before use. `u32::MAX` is a legal archive position meaning "keep at
/// the end".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderSnapshot {
    pub folders: Vec<FolderInfo>,
    pub main_position: u32,
    pub archive_position: u32,
}

impl FolderSnapshot {
    /// Combines the server-owned folder list with the locally persisted
    /// archive position.
    pub fn new(list: FolderList, archive_position: u32) -> Self {
        Self {
            folders: list.folders,
            main_position: list.main_position,
            archive_position,
        }
    }
}

/// A folder suggestion, sourced independently of the folder list.
///
/// Suggestions carry no stable id; they are identified by the title of their
/// definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedFolder {
    pub definition: FolderDefinition,
    pub description: String,
}

/// Folder creation limits of the current account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreationLimit {
    /// Number of folders the account currently has.
    pub current: u32,
    /// Maximum applying to this account.
    pub max: u32,
    /// Maximum an entitled account would get.
    pub entitled_max: u32,
}

impl CreationLimit {
    pub fn can_create(&self) -> bool {
        self.current < self.max
    }

    /// Whether the account has the raised limits of an entitled account.
    ///
    /// Entitlement is not reported separately by the backend; an account
    /// whose own maximum has reached the entitled maximum is entitled.
    pub fn is_entitled(&self) -> bool {
        self.max >= self.entitled_max
    }
}
