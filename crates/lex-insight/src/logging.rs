//! Tracing subscriber setup for binaries and tests that embed the library.
//!
//! The library itself only emits `tracing` events; installing a subscriber
//! is the host's choice.

use tracing_subscriber::EnvFilter;

/// Install a formatting subscriber filtered by `RUST_LOG`, or by
/// `default_filter` (e.g. `"info"` or `"lex_insight=debug"`) when `RUST_LOG`
/// is unset or invalid.
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_tracing(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_rejected() {
        init_tracing("warn");
        assert!(!init_tracing("debug"));
    }
}
