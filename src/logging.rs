//! Diagnostic output for checks
//!
//! Stdout belongs to the monitoring system, which reads exactly one summary
//! line from it, so diagnostics go to stderr. `RUST_LOG` wins over `-v`.

use tracing_subscriber::EnvFilter;

/// The log level for a number of `-v` flags
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "error",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the stderr logger; only the first call in a process has effect
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for(verbosity)));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
