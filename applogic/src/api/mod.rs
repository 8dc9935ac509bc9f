// SPDX-FileCopyrightText: 2026 Plume Labs <hello@plume.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Folder management API exposed to the presentation layer

pub mod folder_list_cubit;
pub mod types;
