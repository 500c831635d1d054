//! Client configuration
//!
//! # Environment variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | POS_BASE_URL | http://localhost:3000 | POS API base URL |
//! | POS_TOKEN | (none) | Bearer token |
//! | POS_TIMEOUT_SECS | 30 | HTTP request timeout |
//! | POS_DATA_DIR | ./data | Directory for `client_state.json` |
//! | POS_LOG_LEVEL | info | Default log filter when `RUST_LOG` is unset |
//! | POS_LOG_JSON | false | JSON log output |
//! | POS_STOCK_VERSIONING | true | Discard stock events older than the last applied version |

use std::path::PathBuf;

/// Client configuration for connecting to the POS API
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL (e.g., "http://localhost:3000")
    pub base_url: String,

    /// Bearer token for authentication
    pub token: Option<String>,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Directory holding the client storage file
    pub data_dir: PathBuf,

    /// Default log level
    pub log_level: String,

    /// Emit JSON logs
    pub log_json: bool,

    /// Per-key stock event versioning
    pub stock_versioning: bool,
}

impl ClientConfig {
    /// Create a new client configuration
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: 30,
            data_dir: PathBuf::from("./data"),
            log_level: "info".to_string(),
            log_json: false,
            stock_versioning: true,
        }
    }

    /// Load from environment variables (after reading `.env`, if present)
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        let defaults = Self::default();

        Self {
            base_url: std::env::var("POS_BASE_URL").unwrap_or(defaults.base_url),
            token: std::env::var("POS_TOKEN").ok().filter(|t| !t.is_empty()),
            timeout: std::env::var("POS_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout),
            data_dir: std::env::var("POS_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            log_level: std::env::var("POS_LOG_LEVEL").unwrap_or(defaults.log_level),
            log_json: std::env::var("POS_LOG_JSON")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.log_json),
            stock_versioning: std::env::var("POS_STOCK_VERSIONING")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.stock_versioning),
        }
    }

    /// Set the bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Set the data directory
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Set logging options
    pub fn with_logging(mut self, level: impl Into<String>, json: bool) -> Self {
        self.log_level = level.into();
        self.log_json = json;
        self
    }

    /// Enable or disable stock event versioning
    pub fn with_stock_versioning(mut self, enabled: bool) -> Self {
        self.stock_versioning = enabled;
        self
    }

    /// Create an HTTP client from this configuration
    pub fn build_http_client(&self) -> crate::ClientResult<crate::HttpClient> {
        crate::HttpClient::new(self)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:3000")
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
