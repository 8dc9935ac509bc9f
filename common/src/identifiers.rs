// SPDX-FileCopyrightText: 2026 Plume Labs <hello@plume.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::fmt;

use serde::{Deserialize, Serialize};

/// Server-assigned identifier of a user-defined chat folder.
///
/// Real folder ids are always non-negative. The two fixed lists (main and
/// archive) are not folders and carry no id; they are referred to via the
/// dedicated [`FolderRef`] variants instead of reserved id values.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::From,
    derive_more::Display,
)]
pub struct FolderId(pub i32);

/// Opaque identifier of a chat, as assigned by the messaging backend.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::From,
    derive_more::Display,
)]
pub struct ChatId(pub i64);

/// A reference to a row of the folder list.
///
/// The main and archive lists behave like folders in the UI (they have a
/// position and can be toggled), but are not backed by a server-side folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FolderRef {
    Main,
    Archive,
    User(FolderId),
}

impl FolderRef {
    pub fn is_main(&self) -> bool {
        matches!(self, Self::Main)
    }

    pub fn is_archive(&self) -> bool {
        matches!(self, Self::Archive)
    }

    /// Returns the folder id for user-defined folders, `None` for the two
    /// fixed lists.
    pub fn user_id(&self) -> Option<FolderId> {
        match self {
            Self::Main | Self::Archive => None,
            Self::User(id) => Some(*id),
        }
    }
}

impl From<FolderId> for FolderRef {
    fn from(id: FolderId) -> Self {
        Self::User(id)
    }
}

impl fmt::Display for FolderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main => write!(f, "main"),
            Self::Archive => write!(f, "archive"),
            Self::User(id) => write!(f, "folder:{id}"),
        }
    }
}
