//! Structured logging setup (§4.9). Initialization mirrors the teacher's
//! pattern: a single global subscriber, env-filter configurable, writing
//! JSON lines to stdout.

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `default_level` is used when
/// `RUST_LOG` is unset.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .json()
        .init();
}
