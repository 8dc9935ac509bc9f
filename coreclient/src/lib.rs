// SPDX-FileCopyrightText: 2026 Plume Labs <hello@plume.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Folder-list logic of the plume client
//!
//! This crate owns the ordering and reconciliation engine behind the folder
//! management screen: the canonical interleaving of user-defined folders with
//! the two fixed lists, the minimal-diff machinery used to patch the displayed
//! list, and the drag-reorder state machine. The remote messaging client and
//! the locally persisted preferences are reached through the [`folders`]
//! trait boundaries only.

pub mod folders;

pub use folders::{
    CreationLimit, FolderDefinition, FolderInfo, FolderList, FolderSnapshot, RecommendedFolder,
};
