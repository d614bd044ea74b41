use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// YAML config file structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ConfigYaml {
    /// Base URL of the Kissa backend
    pub api_url: Option<String>,
    /// Per-request timeout in seconds
    pub request_timeout_secs: Option<u64>,
}

/// Application configuration
/// In dev mode: loads from .env / environment
/// Otherwise: loads from ~/.kissa/config.yaml
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Base URL of the backend that owns the library and the catalog lookups
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    /// Where the YAML file lives (written by `save_to_config_yaml`)
    pub config_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            config_path: default_config_path(),
        }
    }
}

fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".kissa")
        .join("config.yaml")
}

impl Config {
    /// Load configuration based on mode.
    /// Dev mode is activated if a .env file exists or KISSA_DEV_MODE is set.
    pub fn load() -> Result<Self, ConfigError> {
        let dev_mode = std::env::var("KISSA_DEV_MODE").is_ok() || dotenvy::dotenv().is_ok();
        if dev_mode {
            info!("Dev mode activated - loading from .env");
            Self::from_env()
        } else {
            info!("Loading configuration from config.yaml");
            Self::from_config_file(&default_config_path())
        }
    }

    /// Load configuration from environment variables (dev mode)
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_base_url = std::env::var("KISSA_API_URL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| {
                warn!("No KISSA_API_URL set, using {}", DEFAULT_API_URL);
                DEFAULT_API_URL.to_string()
            });

        let request_timeout_secs = match std::env::var("KISSA_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => raw.trim().parse().map_err(|_| {
                ConfigError::Config(format!("KISSA_REQUEST_TIMEOUT_SECS is not a number: {raw}"))
            })?,
            Err(_) => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        let config = Self {
            api_base_url,
            request_timeout_secs,
            config_path: default_config_path(),
        };
        config.validate()?;
        info!("Backend: {}", config.api_base_url);
        Ok(config)
    }

    /// Load configuration from a YAML file. A missing file yields defaults.
    pub fn from_config_file(path: &Path) -> Result<Self, ConfigError> {
        let yaml_config: ConfigYaml = if path.exists() {
            let yaml_str = std::fs::read_to_string(path)?;
            serde_yaml::from_str(&yaml_str)
                .map_err(|e| ConfigError::Serialization(e.to_string()))?
        } else {
            warn!("No config.yaml found at {:?}, using defaults", path);
            ConfigYaml::default()
        };

        let config = Self {
            api_base_url: yaml_config
                .api_url
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            request_timeout_secs: yaml_config
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            config_path: path.to_path_buf(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.api_base_url.trim();
        if url.is_empty() {
            return Err(ConfigError::Config("API URL cannot be empty".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Config(format!(
                "API URL must start with http:// or https://: {url}"
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Config(
                "Request timeout must be at least one second".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Save configuration to config.yaml
    pub fn save_to_config_yaml(&self) -> Result<(), ConfigError> {
        if let Some(dir) = self.config_path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let yaml_config = ConfigYaml {
            api_url: Some(self.api_base_url.clone()),
            request_timeout_secs: Some(self.request_timeout_secs),
        };

        let yaml_str = serde_yaml::to_string(&yaml_config)
            .map_err(|e| ConfigError::Serialization(e.to_string()))?;

        std::fs::write(&self.config_path, yaml_str)?;

        info!("Saved configuration to {:?}", self.config_path);
        Ok(())
    }
}
