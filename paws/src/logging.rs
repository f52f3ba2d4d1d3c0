//! Logging setup for hosts
//!
//! The library only emits `tracing` events. Hosts that want them on stderr call
//! `init_logging` once at startup; `RUST_LOG` overrides the given filter.

use std::sync::Once;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

static INIT: Once = Once::new();

fn env_filter(fallback: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback.unwrap_or(DEFAULT_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install a stderr subscriber. Later calls, or a host that already set a
/// global subscriber, leave the existing one in place.
#[uniffi::export]
pub fn init_logging(filter: Option<String>) {
    INIT.call_once(|| {
        let layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_thread_ids(false)
            .compact();

        let installed = tracing_subscriber::registry()
            .with(env_filter(filter.as_deref()))
            .with(layer)
            .try_init()
            .is_ok();

        if installed {
            tracing::info!(event_type = "panel_lifecycle", action = "logging_initialized", "Logging initialized");
        }
    });
}
