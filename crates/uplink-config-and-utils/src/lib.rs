//! Core types, configuration, and utilities for the uplink daemon.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{Config, DEFAULT_LOG_LEVEL, DEFAULT_PROBE_HOST, DEFAULT_PROBE_PORT};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
