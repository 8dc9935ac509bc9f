// SPDX-FileCopyrightText: 2026 Plume Labs <hello@plume.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

mod cubit_core;

pub(crate) use cubit_core::{Cubit, CubitCore};
