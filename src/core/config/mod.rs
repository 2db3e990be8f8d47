//! core::config
//!
//! Configuration schema, loading, and resolution into an explicit run
//! configuration.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. Environment variables (`REFGRAPH_BASE_URL`, `REFGRAPH_ACCOUNT_ID`,
//!    `REFGRAPH_API_TOKEN`)
//! 4. CLI flags
//!
//! # Config File Locations
//!
//! Searched in order:
//! 1. Explicit `--config <path>` (must exist)
//! 2. `$REFGRAPH_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/refgraph/config.toml`
//! 4. `~/.refgraph/config.toml` (canonical location)
//!
//! # Example
//!
//! ```no_run
//! use refgraph::core::config::{Config, Overrides};
//!
//! let loaded = Config::load(None).unwrap();
//! let overrides = Overrides::from_env();
//! let run = loaded.resolve(&overrides).unwrap();
//! println!("Discovering from {}", run.root_id);
//! ```

pub mod schema;

pub use schema::{DiscoveryConfig, FileConfig, NodeErrorPolicy, RemoteConfig, RetryConfig};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::core::types::ResourceId;
use crate::engine::DiscoveryOptions;
use crate::remote::RetryPolicy;

/// Environment variable naming an explicit config file.
pub const ENV_CONFIG: &str = "REFGRAPH_CONFIG";
/// Environment variable carrying the API token.
pub const ENV_API_TOKEN: &str = "REFGRAPH_API_TOKEN";
/// Environment variable carrying the account id.
pub const ENV_ACCOUNT_ID: &str = "REFGRAPH_ACCOUNT_ID";
/// Environment variable carrying the service base URL.
pub const ENV_BASE_URL: &str = "REFGRAPH_BASE_URL";

/// Default output path for the graph document.
pub const DEFAULT_OUTPUT: &str = "graph.json";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("missing required setting '{key}' ({hint})")]
    Missing { key: &'static str, hint: &'static str },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Values that override the config file.
///
/// Filled from the environment and from CLI flags by the CLI layer.
#[derive(Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub account_id: Option<String>,
    pub api_token: Option<String>,
    pub root_id: Option<String>,
    pub max_in_flight: Option<usize>,
    pub output: Option<PathBuf>,
}

// Custom Debug to avoid exposing api_token
impl std::fmt::Debug for Overrides {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Overrides")
            .field("base_url", &self.base_url)
            .field("account_id", &self.account_id)
            .field("has_api_token", &self.api_token.is_some())
            .field("root_id", &self.root_id)
            .field("max_in_flight", &self.max_in_flight)
            .field("output", &self.output)
            .finish()
    }
}

impl Overrides {
    /// Read overrides from the process environment.
    ///
    /// Empty variables are treated as unset.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            base_url: var(ENV_BASE_URL),
            account_id: var(ENV_ACCOUNT_ID),
            api_token: var(ENV_API_TOKEN),
            ..Default::default()
        }
    }

    /// Layer `other` on top of `self`; values set in `other` win.
    pub fn merge(self, other: Overrides) -> Self {
        Self {
            base_url: other.base_url.or(self.base_url),
            account_id: other.account_id.or(self.account_id),
            api_token: other.api_token.or(self.api_token),
            root_id: other.root_id.or(self.root_id),
            max_in_flight: other.max_in_flight.or(self.max_in_flight),
            output: other.output.or(self.output),
        }
    }
}

/// Connection settings for the remote service.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteSettings {
    pub base_url: String,
    pub account_id: String,
    pub api_token: String,
}

// Custom Debug to avoid exposing api_token
impl std::fmt::Debug for RemoteSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSettings")
            .field("base_url", &self.base_url)
            .field("account_id", &self.account_id)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

/// Fully resolved configuration for one discovery run.
///
/// Constructed once at process entry and passed into the engine; the core
/// never reads the environment itself.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub remote: RemoteSettings,
    pub root_id: ResourceId,
    pub retry: RetryPolicy,
    pub discovery: DiscoveryOptions,
    pub output: PathBuf,
}

/// Loaded configuration file plus where it came from.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed file contents (defaults if no file was found)
    pub file: FileConfig,
    /// Path of the loaded file, if any
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from an explicit path or the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit path does not exist, or if a config
    /// file exists but cannot be parsed or fails validation. A missing file
    /// in the default locations is not an error.
    pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                Some(path.to_path_buf())
            }
            None => Self::find_default(),
        };

        let file = match &path {
            Some(p) => Self::read_file(p)?,
            None => FileConfig::default(),
        };
        file.validate()?;

        Ok(Config { file, path })
    }

    /// Build a config from already-parsed contents.
    pub fn from_file(file: FileConfig) -> Result<Config, ConfigError> {
        file.validate()?;
        Ok(Config { file, path: None })
    }

    /// Path of the loaded config file, if one was found.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn find_default() -> Option<PathBuf> {
        // 1. Check $REFGRAPH_CONFIG
        if let Ok(path) = std::env::var(ENV_CONFIG) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check $XDG_CONFIG_HOME/refgraph/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("refgraph/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Check ~/.refgraph/config.toml
        Self::default_config_path().ok().filter(|p| p.exists())
    }

    /// Get the canonical config path, `~/.refgraph/config.toml`.
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".refgraph/config.toml"))
    }

    fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Merge the file with overrides and validate presence of required values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` for the first required value that is
    /// absent, or `ConfigError::InvalidValue` for out-of-range overrides.
    pub fn resolve(&self, overrides: &Overrides) -> Result<RunConfig, ConfigError> {
        let remote = self.file.remote.clone().unwrap_or_default();
        let retry = self.file.retry.clone().unwrap_or_default();
        let discovery = self.file.discovery.clone().unwrap_or_default();

        let base_url = overrides
            .base_url
            .clone()
            .or(remote.base_url)
            .ok_or(ConfigError::Missing {
                key: "remote.base_url",
                hint: "set it in the config file or REFGRAPH_BASE_URL",
            })?;
        let account_id = overrides
            .account_id
            .clone()
            .or(remote.account_id)
            .ok_or(ConfigError::Missing {
                key: "remote.account_id",
                hint: "set it in the config file or REFGRAPH_ACCOUNT_ID",
            })?;
        let api_token = overrides
            .api_token
            .clone()
            .or(remote.api_token)
            .ok_or(ConfigError::Missing {
                key: "remote.api_token",
                hint: "set REFGRAPH_API_TOKEN",
            })?;
        let root_raw = overrides
            .root_id
            .clone()
            .or(discovery.root_id)
            .ok_or(ConfigError::Missing {
                key: "discovery.root_id",
                hint: "pass ROOT_ID or set it in the config file",
            })?;
        let root_id =
            ResourceId::new(root_raw).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        RemoteConfig {
            base_url: Some(base_url.clone()),
            ..Default::default()
        }
        .validate()?;

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_attempts: retry.max_attempts.unwrap_or(defaults.max_attempts),
            base_delay: retry
                .base_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.base_delay),
            max_jitter: retry
                .max_jitter_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.max_jitter),
        };

        let max_in_flight = overrides
            .max_in_flight
            .or(discovery.max_in_flight)
            .unwrap_or(DiscoveryOptions::default().max_in_flight);
        if max_in_flight == 0 {
            return Err(ConfigError::InvalidValue(
                "max_in_flight must be at least 1".into(),
            ));
        }

        Ok(RunConfig {
            remote: RemoteSettings {
                base_url,
                account_id,
                api_token,
            },
            root_id,
            retry,
            discovery: DiscoveryOptions {
                max_in_flight,
                on_node_error: discovery.on_node_error.unwrap_or_default(),
            },
            output: overrides
                .output
                .clone()
                .or(discovery.output)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
        })
    }
}
