use crate::search::SearchConfig;
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Search engine connection
    #[serde(default)]
    pub engine: EngineConfig,

    /// Index and query tuning
    #[serde(default)]
    pub search: SearchConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());
        Self::load_from(&config_path)
    }

    /// Load configuration layering embedded defaults, `path` and `TODO_SEARCH__*` variables
    pub fn load_from(path: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(path).required(false))
            // Override with environment variables (prefix: TODO_SEARCH)
            .add_source(
                config::Environment::with_prefix("TODO_SEARCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base URL of the Elasticsearch/OpenSearch cluster
    #[serde(default = "default_engine_url")]
    pub url: String,

    /// Basic auth user
    pub username: Option<String>,

    /// Basic auth password
    pub password: Option<String>,

    /// Request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url: default_engine_url(),
            username: None,
            password: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

fn default_engine_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}
