//! Configuration module for filedock.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::{FiledockError, Result};

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    50051
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// File storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the storage root directory.
    #[serde(default = "default_storage_path")]
    pub path: String,
}

fn default_storage_path() -> String {
    "./uploads".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

/// Admission limits, one pool per operation class.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum number of uploads in flight.
    #[serde(default = "default_max_uploads")]
    pub max_concurrent_uploads: usize,
    /// Maximum number of downloads in flight.
    #[serde(default = "default_max_downloads")]
    pub max_concurrent_downloads: usize,
    /// Maximum number of listings in flight.
    #[serde(default = "default_max_listings")]
    pub max_concurrent_listings: usize,
}

fn default_max_uploads() -> usize {
    10
}

fn default_max_downloads() -> usize {
    10
}

fn default_max_listings() -> usize {
    100
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_concurrent_uploads: default_max_uploads(),
            max_concurrent_downloads: default_max_downloads(),
            max_concurrent_listings: default_max_listings(),
        }
    }
}

/// Stream framing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TransferConfig {
    /// Size in bytes of the chunk frames the server sends.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Frames buffered between the download task and the transport.
    #[serde(default = "default_stream_buffer")]
    pub stream_buffer: usize,
}

fn default_chunk_size() -> usize {
    crate::transfer::DEFAULT_CHUNK_SIZE
}

fn default_stream_buffer() -> usize {
    4
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            stream_buffer: default_stream_buffer(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file. Empty disables file output.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/filedock.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Client driver configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Server endpoint URI.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Uploads a batch keeps in flight at once.
    #[serde(default = "default_client_uploads")]
    pub max_concurrent_uploads: usize,
    /// Deadline for a listing call, in seconds.
    #[serde(default = "default_list_timeout")]
    pub list_timeout_secs: u64,
}

fn default_endpoint() -> String {
    "http://localhost:50051".to_string()
}

fn default_client_uploads() -> usize {
    10
}

fn default_list_timeout() -> u64 {
    10
}

impl ClientConfig {
    pub fn list_timeout(&self) -> Duration {
        Duration::from_secs(self.list_timeout_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            max_concurrent_uploads: default_client_uploads(),
            list_timeout_secs: default_list_timeout(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Admission limits.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Transfer framing.
    #[serde(default)]
    pub transfer: TransferConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Client driver configuration.
    #[serde(default)]
    pub client: ClientConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(FiledockError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FiledockError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `FILEDOCK_STORAGE_PATH`: Override the storage root
    /// - `FILEDOCK_ENDPOINT`: Override the client endpoint
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("FILEDOCK_STORAGE_PATH") {
            if !path.is_empty() {
                self.storage.path = path;
            }
        }
        if let Ok(endpoint) = std::env::var("FILEDOCK_ENDPOINT") {
            if !endpoint.is_empty() {
                self.client.endpoint = endpoint;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Every admission pool and the chunk size must be non-zero, and the
    /// storage path must be set.
    pub fn validate(&self) -> Result<()> {
        if self.storage.path.is_empty() {
            return Err(FiledockError::Config("storage.path is empty".to_string()));
        }
        let limits = [
            ("max_concurrent_uploads", self.limits.max_concurrent_uploads),
            ("max_concurrent_downloads", self.limits.max_concurrent_downloads),
            ("max_concurrent_listings", self.limits.max_concurrent_listings),
        ];
        for (name, value) in limits {
            if value == 0 {
                return Err(FiledockError::Config(format!("limits.{name} must be at least 1")));
            }
        }
        if self.transfer.chunk_size == 0 {
            return Err(FiledockError::Config(
                "transfer.chunk_size must be at least 1".to_string(),
            ));
        }
        if self.transfer.stream_buffer == 0 {
            return Err(FiledockError::Config(
                "transfer.stream_buffer must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Address the server binds to, as `host:port`.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
