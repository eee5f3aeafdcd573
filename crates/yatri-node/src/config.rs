//! Node configuration loaded from a TOML file.
//!
//! Every field has a default so a node can start with no config file at
//! all. `--init` writes the defaults out as a starting point.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YatriConfig {
    /// HTTP API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Registry settings.
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address the HTTP API listens on.
    #[serde(default = "default_api_listen_addr")]
    pub listen_addr: String,

    /// Port the HTTP API listens on.
    #[serde(default = "default_api_port")]
    pub port: u16,
}

/// Storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory where the node keeps its database.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

/// Registry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Principals granted the admin role at startup. The first entry is
    /// the root admin; the list must not be empty.
    #[serde(default = "default_admins")]
    pub admins: Vec<String>,

    /// Maximum number of records accepted in one bulk verification.
    #[serde(default = "default_max_bulk_batch")]
    pub max_bulk_batch: usize,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format ("text" or "json").
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_api_listen_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
    8700
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_admins() -> Vec<String> {
    vec!["admin".to_string()]
}

fn default_max_bulk_batch() -> usize {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_api_listen_addr(),
            port: default_api_port(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            admins: default_admins(),
            max_bulk_batch: default_max_bulk_batch(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for YatriConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            storage: StorageConfig::default(),
            registry: RegistryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl YatriConfig {
    /// Load configuration from a TOML file. A missing file yields the
    /// default configuration.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Write the configuration to a TOML file, creating parent
    /// directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        let raw = toml::to_string_pretty(self).context("failed to serialize config")?;
        fs::write(path, raw)
            .with_context(|| format!("failed to write config file {}", path.display()))?;
        Ok(())
    }

    /// Socket address the HTTP API should bind to.
    pub fn api_socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.api.listen_addr, self.api.port)
            .parse()
            .with_context(|| {
                format!(
                    "invalid api listen address {}:{}",
                    self.api.listen_addr, self.api.port
                )
            })
    }
}
