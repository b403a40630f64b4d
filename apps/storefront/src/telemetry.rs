//! Tracing bootstrap.

use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=forma=trace` - Show trace for forma crates only
/// - Default: `default_filter` (normally `FORMA_LOG_FILTER`)
///
/// Logs go to stderr; stdout carries command replies.
///
/// Safe to call more than once; later calls leave the first subscriber
/// in place and return `false`.
pub fn init_tracing(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
