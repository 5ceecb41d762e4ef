//! Application configuration loaded from environment variables.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Backend ===
    /// Base URL of the picks API, including the version prefix.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Request timeout in milliseconds.
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,

    // === Refresh ===
    /// Seconds between live odds polls in `watch` mode.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    // === Logging ===
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Log output format: `text` or `json`.
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

fn default_api_base_url() -> String {
    "http://localhost:8000/api/v1".to_string()
}

fn default_http_timeout_ms() -> u64 {
    10_000
}

fn default_poll_interval() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            http_timeout_ms: default_http_timeout_ms(),
            poll_interval_secs: default_poll_interval(),
            rust_log: default_log_level(),
            log_format: default_log_format(),
            verbose: false,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.api_base_url.is_empty() {
            return Err("API_BASE_URL is required".to_string());
        }

        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err("API_BASE_URL must start with http:// or https://".to_string());
        }

        if self.http_timeout_ms == 0 {
            return Err("HTTP_TIMEOUT_MS must be greater than 0".to_string());
        }

        if self.poll_interval_secs == 0 {
            return Err("POLL_INTERVAL_SECS must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }

    /// Whether logs should be emitted as JSON lines.
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}
