//! Process-wide tracing setup for ledger runs.

/// Subscriber configuration (filters, formatting).
pub mod subscriber;

pub use subscriber::{DEFAULT_FILTER, init, init_for_tests, init_with};
