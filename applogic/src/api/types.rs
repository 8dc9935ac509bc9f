// SPDX-FileCopyrightText: 2026 Plume Labs <hello@plume.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use plumecommon::identifiers::{FolderId, FolderRef};
use plumecoreclient::folders::{
    CreationLimit, DiffEntry, DragRow, FolderDefinition, FolderListEntry, RecommendedFolder,
};

/// A row of the folder management display list.
///
/// The folder group (the two fixed lists interleaved with the user folders)
/// comes first, followed by the create-folder action row and the recommended
/// folder suggestions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiListEntry {
    MainFolder {
        enabled: bool,
    },
    ArchiveFolder {
        enabled: bool,
    },
    UserFolder {
        id: FolderId,
        title: String,
        enabled: bool,
    },
    CreateFolderRow {
        can_create: bool,
    },
    RecommendedFolder(UiRecommendedFolder),
}

impl UiListEntry {
    pub fn folder_ref(&self) -> Option<FolderRef> {
        match self {
            Self::MainFolder { .. } => Some(FolderRef::Main),
            Self::ArchiveFolder { .. } => Some(FolderRef::Archive),
            Self::UserFolder { id, .. } => Some(FolderRef::User(*id)),
            Self::CreateFolderRow { .. } | Self::RecommendedFolder(_) => None,
        }
    }

    /// Flips the toggle state of a folder row; `false` for other rows.
    pub(crate) fn set_enabled(&mut self, value: bool) -> bool {
        match self {
            Self::MainFolder { enabled }
            | Self::ArchiveFolder { enabled }
            | Self::UserFolder { enabled, .. } => {
                *enabled = value;
                true
            }
            Self::CreateFolderRow { .. } | Self::RecommendedFolder(_) => false,
        }
    }

    pub(crate) fn from_folder_entry(entry: FolderListEntry, enabled: bool) -> Self {
        match entry {
            FolderListEntry::Main => Self::MainFolder { enabled },
            FolderListEntry::Archive => Self::ArchiveFolder { enabled },
            FolderListEntry::Folder(info) => Self::UserFolder {
                id: info.id,
                title: info.title,
                enabled,
            },
        }
    }
}

impl DragRow for UiListEntry {
    fn folder_ref(&self) -> Option<FolderRef> {
        self.folder_ref()
    }
}

impl DiffEntry for UiListEntry {
    fn same_identity(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::MainFolder { .. }, Self::MainFolder { .. }) => true,
            (Self::ArchiveFolder { .. }, Self::ArchiveFolder { .. }) => true,
            (Self::UserFolder { id: a, .. }, Self::UserFolder { id: b, .. }) => a == b,
            (Self::CreateFolderRow { .. }, Self::CreateFolderRow { .. }) => true,
            // suggestions have no stable id; the title is the identity
            (Self::RecommendedFolder(a), Self::RecommendedFolder(b)) => a.title == b.title,
            _ => false,
        }
    }

    fn same_content(&self, other: &Self) -> bool {
        match (self, other) {
            // toggle state changes go through a targeted update instead of
            // the diff, so they must not register as content changes here
            (Self::MainFolder { .. }, Self::MainFolder { .. }) => true,
            (Self::ArchiveFolder { .. }, Self::ArchiveFolder { .. }) => true,
            (Self::UserFolder { title: a, .. }, Self::UserFolder { title: b, .. }) => a == b,
            (
                Self::CreateFolderRow { can_create: a },
                Self::CreateFolderRow { can_create: b },
            ) => a == b,
            (Self::RecommendedFolder(a), Self::RecommendedFolder(b)) => {
                a.title == b.title && a.icon == b.icon && a.description == b.description
            }
            _ => false,
        }
    }
}

/// Data of a recommended folder row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiRecommendedFolder {
    pub title: String,
    pub icon: Option<String>,
    pub description: String,
    /// The definition used when the suggestion is promoted to a folder.
    pub definition: FolderDefinition,
}

impl From<RecommendedFolder> for UiRecommendedFolder {
    fn from(recommended: RecommendedFolder) -> Self {
        Self {
            title: recommended.definition.title.clone(),
            icon: recommended.definition.icon.clone(),
            description: recommended.description,
            definition: recommended.definition,
        }
    }
}

/// Folder creation limits of the current account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiCreationLimit {
    pub current: u32,
    pub max: u32,
    pub entitled_max: u32,
}

impl From<CreationLimit> for UiCreationLimit {
    fn from(limit: CreationLimit) -> Self {
        Self {
            current: limit.current,
            max: limit.max,
            entitled_max: limit.entitled_max,
        }
    }
}
