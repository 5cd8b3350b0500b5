use std::sync::Once;

use env_logger::Builder;
use log::LevelFilter;

static INIT: Once = Once::new();

/// Default filters: Info overall, with the per-node list tracing held at Warn
fn builder() -> Builder {
    let mut builder = Builder::new();

    builder
        .filter_level(LevelFilter::Info)
        .filter_module("chaintable::list", LevelFilter::Warn)
        .format_timestamp_millis();

    builder
}

/// Install the process-wide logger (overridable through `RUST_LOG`)
///
/// Safe to call more than once; only the first call has any effect.
pub fn initialize_logger() {
    // Use call_once_force to recover if an earlier initialization attempt panicked.
    INIT.call_once_force(|_| {
        let mut builder = builder();
        builder.parse_default_env();

        // Avoid panicking if the logger was already initialized elsewhere.
        let _ = builder.try_init();
    });
}
