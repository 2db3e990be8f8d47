//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Example
//!
//! ```toml
//! [remote]
//! base_url = "https://api.example.com"
//! account_id = "acct-123"
//! api_token = "..."
//!
//! [retry]
//! max_attempts = 5
//! base_delay_ms = 1000
//! max_jitter_ms = 1000
//!
//! [discovery]
//! root_id = "proc-1"
//! max_in_flight = 8
//! output = "graph.json"
//! on_node_error = "skip"
//! ```
//!
//! # Validation
//!
//! Values are range-checked after parsing. Presence of required values is
//! checked later, when the file is merged with environment and CLI overrides.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Remote service connection settings
    pub remote: Option<RemoteConfig>,

    /// Retry settings for remote calls
    pub retry: Option<RetryConfig>,

    /// Discovery run settings
    pub discovery: Option<DiscoveryConfig>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(remote) = &self.remote {
            remote.validate()?;
        }
        if let Some(retry) = &self.retry {
            retry.validate()?;
        }
        if let Some(discovery) = &self.discovery {
            discovery.validate()?;
        }
        Ok(())
    }
}

/// Remote service connection settings.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteConfig {
    /// Base URL of the metadata service
    pub base_url: Option<String>,

    /// Account the resources belong to
    pub account_id: Option<String>,

    /// API token (prefer the REFGRAPH_API_TOKEN environment variable)
    pub api_token: Option<String>,
}

// Custom Debug to avoid exposing api_token
impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("base_url", &self.base_url)
            .field("account_id", &self.account_id)
            .field("has_api_token", &self.api_token.is_some())
            .finish()
    }
}

impl RemoteConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidValue(format!(
                    "remote.base_url must be an http(s) URL, got '{}'",
                    url
                )));
            }
        }
        Ok(())
    }
}

/// Retry settings for remote calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Maximum attempts per call, including the first (default: 5)
    pub max_attempts: Option<u32>,

    /// Base backoff delay in milliseconds (default: 1000)
    pub base_delay_ms: Option<u64>,

    /// Upper bound of the random jitter added to each delay (default: 1000)
    pub max_jitter_ms: Option<u64>,
}

impl RetryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == Some(0) {
            return Err(ConfigError::InvalidValue(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Discovery run settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoveryConfig {
    /// Resource to start discovery from
    pub root_id: Option<String>,

    /// Cap on concurrently resolving resources (default: 8)
    pub max_in_flight: Option<usize>,

    /// Output path for the graph document (default: graph.json)
    pub output: Option<PathBuf>,

    /// What to do when a non-root resource fails to resolve (default: skip)
    pub on_node_error: Option<NodeErrorPolicy>,
}

impl DiscoveryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_in_flight == Some(0) {
            return Err(ConfigError::InvalidValue(
                "discovery.max_in_flight must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Policy for metadata failures (other than not-found) below the root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeErrorPolicy {
    /// Abort the whole run
    Abort,
    /// Log the failure and prune the resource like a not-found
    #[default]
    Skip,
}

impl std::fmt::Display for NodeErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeErrorPolicy::Abort => write!(f, "abort"),
            NodeErrorPolicy::Skip => write!(f, "skip"),
        }
    }
}
