//! Configuration management for the Libris service
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml, config.yaml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Relational database configuration (Postgres)
    pub database: DatabaseConfig,

    /// Document store configuration (MongoDB)
    pub docstore: DocStoreConfig,

    /// Image host configuration
    pub images: ImageHostConfig,

    /// Rate limiting configuration
    pub rate_limit: RateLimitConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,

    /// Aggregate reconciliation configuration
    pub reconcile: ReconcileConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Deployment environment (development, production)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Maximum request body size in bytes (multipart uploads included)
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Postgres connection URL
    pub url: String,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DocStoreConfig {
    /// MongoDB connection URL
    pub url: String,

    /// Database holding the metadata and review collections
    #[serde(default = "default_docstore_database")]
    pub database: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImageHostConfig {
    /// Cloud name (tenant) at the image host
    pub cloud_name: String,

    /// API key
    pub api_key: String,

    /// API secret used for request signing
    pub api_secret: String,

    /// API base URL
    #[serde(default = "default_image_api_base")]
    pub api_base: String,

    /// Root folder for uploaded assets
    #[serde(default = "default_image_folder")]
    pub root_folder: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Enable rate limiting on the GraphQL endpoint
    #[serde(default = "default_rate_limit_enabled")]
    pub enabled: bool,

    /// Maximum requests per window
    #[serde(default = "default_rate_limit_max")]
    pub max_requests: u32,

    /// Window length in seconds
    #[serde(default = "default_rate_limit_window")]
    pub window_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReconcileConfig {
    /// Enable the periodic aggregate reconciliation task
    #[serde(default = "default_reconcile_enabled")]
    pub enabled: bool,

    /// Seconds between reconciliation passes
    #[serde(default = "default_reconcile_interval")]
    pub interval_secs: u64,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 4000 }
fn default_environment() -> String { "development".to_string() }
fn default_body_limit() -> usize { 50 * 1024 * 1024 }
fn default_max_connections() -> u32 { 50 }
fn default_min_connections() -> u32 { 5 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_docstore_database() -> String { "libris_metadata".to_string() }
fn default_image_api_base() -> String { "https://api.cloudinary.com/v1_1".to_string() }
fn default_image_folder() -> String { "libris".to_string() }
fn default_rate_limit_enabled() -> bool { true }
fn default_rate_limit_max() -> u32 { 100 }
fn default_rate_limit_window() -> u64 { 900 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { false }
fn default_service_name() -> String { "libris".to_string() }
fn default_reconcile_enabled() -> bool { true }
fn default_reconcile_interval() -> u64 { 300 }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__SERVER__PORT=4001
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        config.try_deserialize()
    }

    /// Whether the service runs in development mode
    pub fn is_development(&self) -> bool {
        self.server.environment == "development"
    }

    /// Get the rate limit window as Duration
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit.window_secs)
    }

    /// Get the reconciliation interval as Duration
    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_secs(self.reconcile.interval_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                environment: default_environment(),
                body_limit_bytes: default_body_limit(),
            },
            database: DatabaseConfig {
                url: "postgres://localhost/libris".to_string(),
                max_connections: default_max_connections(),
                min_connections: default_min_connections(),
                connect_timeout_secs: default_connect_timeout(),
                idle_timeout_secs: default_idle_timeout(),
            },
            docstore: DocStoreConfig {
                url: "mongodb://localhost:27017".to_string(),
                database: default_docstore_database(),
            },
            images: ImageHostConfig {
                cloud_name: "demo".to_string(),
                api_key: String::new(),
                api_secret: String::new(),
                api_base: default_image_api_base(),
                root_folder: default_image_folder(),
            },
            rate_limit: RateLimitConfig {
                enabled: default_rate_limit_enabled(),
                max_requests: default_rate_limit_max(),
                window_secs: default_rate_limit_window(),
            },
            observability: ObservabilityConfig {
                log_level: default_log_level(),
                json_logging: default_json_logging(),
                service_name: default_service_name(),
            },
            reconcile: ReconcileConfig {
                enabled: default_reconcile_enabled(),
                interval_secs: default_reconcile_interval(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.docstore.database, "libris_metadata");
        assert!(config.is_development());
    }

    #[test]
    fn test_rate_limit_window() {
        let config = AppConfig::default();
        assert_eq!(config.rate_limit_window(), Duration::from_secs(900));
        assert_eq!(config.rate_limit.max_requests, 100);
    }
}
