//! Logging setup

use tracing_subscriber::EnvFilter;

/// Target of critical log lines: failures that stop the node
pub const CRITICAL: &str = "critical";

/// Filter directive for a `--log-level` value:
/// 0 nothing, 1 critical, 2 errors, 3 warnings, 4 info and above
pub fn level_directive(level: u8) -> &'static str {
    match level {
        0 => "off",
        1 => "off,critical=error",
        2 => "error",
        3 => "warn",
        _ => "info",
    }
}

/// Install the global subscriber. `RUST_LOG`, when set, wins over `level`.
pub fn init(level: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .init();
}
