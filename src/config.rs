use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracker_core::TenantId;

use crate::error::{AppError, Result};

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "trackers.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub tenancy: TenancyConfig,
    pub events: EventsConfig,
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            db_path: PathBuf::from("data/trackers.db"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TenancyConfig {
    /// Tenant assumed for requests without an `X-Tenant-Id` header. When
    /// unset such requests are rejected.
    pub default_tenant: Option<TenantId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublisherKind {
    Log,
    Webhook,
    None,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    pub publisher: PublisherKind,
    pub webhook_url: Option<String>,
    pub timeout_ms: u64,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            publisher: PublisherKind::Log,
            webhook_url: None,
            timeout_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 9898,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is not set
    pub level: String,
    /// Directory for the daily-rolling JSON log; `None` disables file output
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: Some(PathBuf::from("logs")),
            file_prefix: "trackers.log".to_string(),
        }
    }
}

impl Config {
    /// Loads the TOML file (explicit path, else `trackers.toml` if present,
    /// else defaults) and applies `TRACKERS_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Applies overrides from `lookup`, normally the process environment.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("TRACKERS_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("TRACKERS_PORT") {
            self.server.port = parse_port("TRACKERS_PORT", &port)?;
        }
        if let Some(path) = lookup("TRACKERS_DB_PATH") {
            self.storage.db_path = PathBuf::from(path);
        }
        if let Some(backend) = lookup("TRACKERS_STORAGE") {
            self.storage.backend = match backend.trim().to_ascii_lowercase().as_str() {
                "memory" => StorageBackend::Memory,
                "sqlite" => StorageBackend::Sqlite,
                other => {
                    return Err(AppError::Config(format!(
                        "TRACKERS_STORAGE must be 'memory' or 'sqlite', got '{other}'"
                    )))
                }
            };
        }
        if let Some(tenant) = lookup("TRACKERS_DEFAULT_TENANT") {
            let tenant = tenant
                .parse::<TenantId>()
                .map_err(|e| AppError::Config(format!("TRACKERS_DEFAULT_TENANT: {e}")))?;
            self.tenancy.default_tenant = Some(tenant);
        }
        if let Some(url) = lookup("TRACKERS_EVENTS_WEBHOOK") {
            self.events.publisher = PublisherKind::Webhook;
            self.events.webhook_url = Some(url);
        }
        if let Some(port) = lookup("TRACKERS_METRICS_PORT") {
            self.metrics.enabled = true;
            self.metrics.port = parse_port("TRACKERS_METRICS_PORT", &port)?;
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_port(key: &str, value: &str) -> Result<u16> {
    value
        .trim()
        .parse()
        .map_err(|e| AppError::Config(format!("{key} must be a port number: {e}")))
}
