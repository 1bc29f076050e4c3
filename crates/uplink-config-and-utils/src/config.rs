//! Configuration management for the uplink daemon.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use url::Url;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default collector endpoint (can be overridden at compile time via COLLECTOR_URL env var).
pub const DEFAULT_COLLECTOR_URL: &str = match option_env!("COLLECTOR_URL") {
    Some(url) => url,
    None => "http://localhost:8080/ingest",
};

/// Default host probed to decide whether the network path is up.
pub const DEFAULT_PROBE_HOST: &str = "8.8.8.8";

/// Default port probed on the probe host (DNS).
pub const DEFAULT_PROBE_PORT: u16 = 53;

/// Main daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Collector endpoint URL readings are POSTed to.
    #[serde(default = "default_collector_url")]
    pub collector_url: String,
    /// Statically configured headers sent with every delivery (auth tokens etc.).
    #[serde(default)]
    pub auth_headers: HashMap<String, String>,
    /// Seconds the dispatcher sleeps between reachability checks.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Seconds the dispatcher sleeps between consecutive successful sends.
    #[serde(default = "default_send_delay_secs")]
    pub send_delay_secs: u64,
    /// Host used for the cheap reachability probe.
    #[serde(default = "default_probe_host")]
    pub probe_host: String,
    /// Port used for the reachability probe.
    #[serde(default = "default_probe_port")]
    pub probe_port: u16,
    /// Seconds before a probe connection attempt is abandoned.
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
    /// Per-request timeout in seconds for one delivery attempt.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Delivery attempts the client makes for one record before giving up.
    #[serde(default = "default_max_send_attempts")]
    pub max_send_attempts: u32,
    /// Fixed delay in seconds between delivery attempts for the same record.
    #[serde(default = "default_send_retry_delay_secs")]
    pub send_retry_delay_secs: u64,
    /// Number of failed delivery rounds after which the head record is parked
    /// in the dead-letter table. `None` retries the head forever.
    #[serde(default)]
    pub max_delivery_failures: Option<u32>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_collector_url() -> String {
    DEFAULT_COLLECTOR_URL.to_string()
}

fn default_poll_interval_secs() -> u64 {
    1
}

fn default_send_delay_secs() -> u64 {
    1
}

fn default_probe_host() -> String {
    DEFAULT_PROBE_HOST.to_string()
}

fn default_probe_port() -> u16 {
    DEFAULT_PROBE_PORT
}

fn default_probe_timeout_secs() -> u64 {
    3
}

fn default_request_timeout_secs() -> u64 {
    5
}

fn default_max_send_attempts() -> u32 {
    5
}

fn default_send_retry_delay_secs() -> u64 {
    3
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            collector_url: default_collector_url(),
            auth_headers: HashMap::new(),
            poll_interval_secs: default_poll_interval_secs(),
            send_delay_secs: default_send_delay_secs(),
            probe_host: default_probe_host(),
            probe_port: default_probe_port(),
            probe_timeout_secs: default_probe_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            max_send_attempts: default_max_send_attempts(),
            send_retry_delay_secs: default_send_retry_delay_secs(),
            max_delivery_failures: None,
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from the config file, falling back to defaults.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the config file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let config_path = paths.config_file();
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    /// Override configuration from environment variables.
    fn load_from_env(&mut self) {
        if let Ok(log_level) = std::env::var("UPLINK_LOG_LEVEL") {
            self.log_level = log_level;
        }
        if let Ok(url) = std::env::var("UPLINK_COLLECTOR_URL") {
            self.collector_url = url;
        }
    }

    /// Get the collector URL as a parsed URL.
    pub fn collector_url(&self) -> CoreResult<Url> {
        Url::parse(&self.collector_url).map_err(CoreError::from)
    }
}
