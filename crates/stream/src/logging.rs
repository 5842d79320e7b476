//! Tracing initialization
//!
//! Respects `RUST_LOG` (e.g. `RUST_LOG=cambist_stream=debug`); falls back to
//! `default_directive` when it is unset or invalid.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the global subscriber. Returns `false` if one was already set.
pub fn init_tracing(default_directive: &str) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(env_filter)
        .try_init()
        .is_ok()
}
