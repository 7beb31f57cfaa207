//! Timing helpers for pipeline steps

use std::time::Instant;
use tracing::debug;

/// Run `op`, logging how long `step` took for `profile`
pub(crate) fn timed<T>(profile: &str, step: &'static str, op: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let out = op();
    debug!(
        profile,
        step,
        elapsed_us = start.elapsed().as_micros() as u64,
        "pipeline step finished"
    );
    out
}
