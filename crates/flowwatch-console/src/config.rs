//! Console configuration, loaded from TOML.
//!
//! Lookup order: an explicit `--config` path, then
//! `<config_dir>/flowwatch/console.toml`, then built-in defaults. Command
//! line flags are applied on top by the binary.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use flowwatch_client::ClientSettings;
use flowwatch_protocol::{
    DEFAULT_ORIGIN, DEFAULT_REFRESH_INTERVAL_SECS, DEFAULT_REQUEST_TIMEOUT_SECS,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::controller::ControllerSettings;
use crate::elements::DashboardElements;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("dashboard element '{0}' is not configured")]
    MissingElement(&'static str),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Initial contents of the API URL input. Empty means `origin`.
    pub base_url: String,
    pub origin: String,
    pub timeout_secs: u64,
    /// Forwarded as `/flows?limit=N`; the backend's own default applies when unset.
    pub flow_limit: Option<usize>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            origin: DEFAULT_ORIGIN.to_string(),
            timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            flow_limit: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub interval_secs: u64,
    pub auto_refresh: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            auto_refresh: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` wins when set.
    pub level: String,
    /// Log file for the interactive console, which owns stdout.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub api: ApiConfig,
    pub refresh: RefreshConfig,
    pub logging: LoggingConfig,
    pub elements: BTreeMap<String, String>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            refresh: RefreshConfig::default(),
            logging: LoggingConfig::default(),
            elements: DashboardElements::default_table(),
        }
    }
}

impl ConsoleConfig {
    /// `<config_dir>/flowwatch/console.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("flowwatch").join("console.toml"))
    }

    /// Load from `path`, or from the default location if it exists, or defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => match Self::default_path() {
                Some(p) if p.exists() => Self::from_file(&p),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Check value ranges and resolve the element labels.
    pub fn validate(&self) -> Result<DashboardElements, ConfigError> {
        if self.refresh.interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "refresh.interval_secs must be at least 1".into(),
            ));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Invalid("api.timeout_secs must be at least 1".into()));
        }
        if self.api.origin.trim().is_empty() {
            return Err(ConfigError::Invalid("api.origin must not be empty".into()));
        }
        DashboardElements::from_labels(&self.elements)
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            origin: self.api.origin.trim().to_string(),
            timeout: Duration::from_secs(self.api.timeout_secs),
        }
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            refresh_interval: Duration::from_secs(self.refresh.interval_secs),
            flow_limit: self.api.flow_limit,
            ..ControllerSettings::default()
        }
    }
}
