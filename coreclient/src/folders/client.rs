// SPDX-FileCopyrightText: 2026 Plume Labs <hello@plume.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Boundaries to the external messaging client and the local preferences
//!
//! All folder business logic lives on this side of [`FoldersClient`]; the
//! trait only serializes requests and surfaces the server's verdict.

use std::collections::HashSet;

use parking_lot::Mutex;
use plumecommon::identifiers::{FolderId, FolderRef};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_stream::Stream;

use super::{CreationLimit, FolderDefinition, FolderInfo, RecommendedFolder};

/// The result type of a failable [`FoldersClient`] request.
pub type FoldersResult<T> = Result<T, FolderRequestError>;

/// Errors surfaced by the remote messaging client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FolderRequestError {
    /// The server refused the operation, e.g. an entitlement limit or a
    /// malformed definition.
    #[error("request rejected: {reason}")]
    Rejected { reason: String },
    /// The referenced folder no longer exists server-side. The local
    /// snapshot is already stale when this shows up.
    #[error("folder not found")]
    NotFound,
    /// The request never reached the server.
    #[error("network error: {0}")]
    Network(String),
}

/// Folder list together with the server-owned main list position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderList {
    pub folders: Vec<FolderInfo>,
    pub main_position: u32,
}

/// Push notification about a folder-list change made by another session.
pub type FolderListUpdate = FolderList;

/// Request boundary to the external messaging client.
///
/// All requests are asynchronous and may be in flight concurrently; no
/// ordering between independent operations is guaranteed. Completion
/// handlers are responsible for re-validating staleness before applying a
/// result.
#[allow(async_fn_in_trait, reason = "trait is only used in the workspace")]
#[trait_variant::make(Send)]
pub trait FoldersClient {
    async fn list_folders(&self) -> FoldersResult<FolderList>;

    async fn folder_definition(&self, id: FolderId) -> FoldersResult<FolderDefinition>;

    /// Creates a folder; the server assigns the id.
    async fn create_folder(&self, definition: FolderDefinition) -> FoldersResult<FolderId>;

    async fn edit_folder(&self, id: FolderId, definition: FolderDefinition) -> FoldersResult<()>;

    async fn delete_folder(&self, id: FolderId) -> FoldersResult<()>;

    /// Persists a new relative order of the user-defined folders together
    /// with the main list position.
    async fn reorder_folders(
        &self,
        folder_ids: Vec<FolderId>,
        main_position: u32,
    ) -> FoldersResult<()>;

    async fn recommended_folders(&self) -> FoldersResult<Vec<RecommendedFolder>>;

    async fn creation_limit(&self) -> FoldersResult<CreationLimit>;

    /// Subscribes to folder-list changes pushed from other sessions.
    fn subscribe(&self) -> impl Stream<Item = FolderListUpdate> + Send + Unpin;
}

/// Locally persisted folder preferences.
///
/// Storage is owned by the embedding application; the engine only needs
/// synchronous get/set access. The archive position lives here rather than
/// on the server, which knows nothing about the archive pseudo-folder.
pub trait FolderSettings: Send + Sync {
    fn archive_position(&self) -> u32;

    fn set_archive_position(&self, position: u32);

    fn is_enabled(&self, folder: FolderRef) -> bool;

    fn set_enabled(&self, folder: FolderRef, enabled: bool);
}

/// In-memory [`FolderSettings`]; folders are enabled until toggled off.
#[derive(Debug)]
pub struct MemoryFolderSettings {
    inner: Mutex<SettingsState>,
}

#[derive(Debug)]
struct SettingsState {
    archive_position: u32,
    disabled: HashSet<FolderRef>,
}

impl MemoryFolderSettings {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SettingsState {
                // right after main at the top of the list
                archive_position: 1,
                disabled: HashSet::new(),
            }),
        }
    }
}

impl Default for MemoryFolderSettings {
    fn default() -> Self {
        Self::new()
    }
}

impl FolderSettings for MemoryFolderSettings {
    fn archive_position(&self) -> u32 {
        self.inner.lock().archive_position
    }

    fn set_archive_position(&self, position: u32) {
        self.inner.lock().archive_position = position;
    }

    fn is_enabled(&self, folder: FolderRef) -> bool {
        !self.inner.lock().disabled.contains(&folder)
    }

    fn set_enabled(&self, folder: FolderRef, enabled: bool) {
        let mut inner = self.inner.lock();
        if enabled {
            inner.disabled.remove(&folder);
        } else {
            inner.disabled.insert(folder);
        }
    }
}
