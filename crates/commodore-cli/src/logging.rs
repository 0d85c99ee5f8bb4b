//! Logging initialization

use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// Logs go to stderr so stdout carries only the extraction result.
/// `RUST_LOG` takes precedence over the `--debug` flag.
pub fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(debug)
        .try_init();
}
