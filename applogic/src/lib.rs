// SPDX-FileCopyrightText: 2026 Plume Labs <hello@plume.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Multi-platform client application logic

pub mod api;
pub mod logging;

pub(crate) mod util;
