//! Tracing subscriber setup for programs that embed the calculators.
//!
//! The library only emits events: `trace!` for each calculation, `debug!`
//! when a registry is built or a criterion is evaluated, and `warn!` when the
//! Rabkin spline is asked for a rate outside its knot domain. Nothing is
//! printed until the host installs a subscriber, either its own or one of
//! the helpers below. A subscriber that is already installed is left alone.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a compact stderr subscriber at `info`, overridable with `RUST_LOG`
pub fn init() {
    init_with_level("info")
}

/// Same as [`init`] with a caller-chosen default filter such as `"qtc_core=debug"`
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

/// Route every event to the test harness output
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("trace"))
        .try_init();
}
