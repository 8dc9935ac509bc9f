// SPDX-FileCopyrightText: 2026 Plume Labs <hello@plume.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::sync::Once;

use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{
    EnvFilter, fmt, layer::SubscriberExt, registry, util::SubscriberInitExt,
};

static INIT_LOGGER_ONCE: Once = Once::new();

/// Initializes the global logger. Repeated calls are no-ops.
pub fn init_logger() {
    INIT_LOGGER_ONCE.call_once(|| {
        let default_level = if cfg!(debug_assertions) {
            LevelFilter::INFO
        } else {
            LevelFilter::WARN
        };
        let env_filter = EnvFilter::builder()
            .with_default_directive(default_level.into())
            .from_env_lossy();
        registry().with(env_filter).with(fmt::layer()).init();
        info!("init_logger");
    });
}
