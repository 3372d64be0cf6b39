//! Configuration System
//!
//! Layered configuration for the graph engine: built-in defaults, then the
//! global config file, then the workspace's `.strand/config.toml`, then
//! `STRAND_*` environment variables.

use crate::error::ConfigError;
use crate::hashing::algorithm_from_name;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

mod merge;
mod sources;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrandConfig {
    /// Storage backend selection
    #[serde(default)]
    pub storage: StorageConfig,

    /// Hash algorithm selection
    #[serde(default)]
    pub hashing: HashingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Key/value backend kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Memory,
    #[default]
    Sled,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: BackendKind,

    /// Database location (sled only); relative paths resolve against the workspace root
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".strand/store")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            path: default_store_path(),
        }
    }
}

/// Hashing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashingConfig {
    /// `blake3` or `sha256`
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
}

fn default_algorithm() -> String {
    "blake3".to_string()
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            algorithm: default_algorithm(),
        }
    }
}

impl StrandConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        algorithm_from_name(&self.hashing.algorithm)?;

        if self.storage.backend == BackendKind::Sled && self.storage.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "Store path cannot be empty for the sled backend".to_string(),
            ));
        }

        Ok(())
    }

    /// Serialize to TOML (e.g. to write a starter config file)
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Invalid(format!("Failed to serialize config: {}", e)))
    }
}

/// Loads [`StrandConfig`] from layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace
    pub fn load(workspace_root: &Path) -> Result<StrandConfig, ConfigError> {
        let builder = merge::merge_policy::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder)?;
        let builder = sources::workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = builder.add_source(merge::merge_policy::environment());

        let mut config: StrandConfig = builder.build()?.try_deserialize()?;
        if config.storage.path.is_relative() {
            config.storage.path = workspace_root.join(&config.storage.path);
        }
        config.validate()?;

        debug!(
            backend = ?config.storage.backend,
            algorithm = %config.hashing.algorithm,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Load configuration from a single TOML file on top of the defaults
    pub fn load_from_file(path: &Path) -> Result<StrandConfig, ConfigError> {
        let config: StrandConfig = merge::merge_policy::builder_with_defaults()?
            .add_source(config::File::from(path))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Location of the global config file, if the platform has one
    pub fn global_config_path() -> Option<PathBuf> {
        sources::global_file::global_config_path()
    }

    /// Location of the workspace config file
    pub fn workspace_config_path(workspace_root: &Path) -> PathBuf {
        sources::workspace_file::workspace_config_dir(workspace_root).join("config.toml")
    }
}
