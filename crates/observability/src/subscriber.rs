//! Tracing subscriber initialization.
//!
//! Ledger runs log one JSON object per line. The filter comes from
//! `RUST_LOG` when set, e.g. `RUST_LOG=catledger_accounting=debug` to see
//! every posting batch.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the JSON subscriber with the default filter.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    init_with(DEFAULT_FILTER);
}

/// Install the JSON subscriber, falling back to `default` when `RUST_LOG`
/// is not usable. Returns whether this call installed it.
pub fn init_with(default: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default))
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init()
        .is_ok()
}

/// Human-readable output captured by the test harness.
pub fn init_for_tests() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter("warn"))
        .with_test_writer()
        .try_init();
}
