//! Logging initialization for the uplink daemon.
//!
//! All daemon components log through `tracing`; the binary initializes a
//! single fmt subscriber here. `RUST_LOG` takes precedence over the
//! configured default level.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the logging system for the daemon.
///
/// Sets up a `tracing` fmt subscriber on stderr with the level taken from
/// `RUST_LOG` when set, otherwise from the provided default.
///
/// # Arguments
///
/// * `level` - Default log level (trace, debug, info, warn, error)
///
/// # Example
///
/// ```ignore
/// init_logging("info");
/// tracing::info!("Daemon started");
/// ```
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(parse_level(level).to_string()));

    // try_init: the binary calls this once, tests may race on a global subscriber
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
