//! Tracing setup shared by the liftlog binaries.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter: our crates at `info`, dependencies at `warn`
const DEFAULT_FILTER: &str = "warn,liftlog_core=info,liftlog=info";

/// Initialize logging with the default filter
///
/// `RUST_LOG` takes precedence when set.
pub fn init() {
    init_with_filter(DEFAULT_FILTER)
}

/// Initialize logging for a CLI run
///
/// `verbose` raises our own crates to `debug`, which includes one line per
/// API request.
pub fn init_for_cli(verbose: bool) {
    if verbose {
        init_with_filter("warn,liftlog_core=debug,liftlog=debug")
    } else {
        init()
    }
}

/// Initialize logging with a specific default filter directive
pub fn init_with_filter(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // Logs go to stderr so command output stays pipeable
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .try_init();
}

/// Initialize logging for testing (captures logs for test output)
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
