//! Client configuration
//!
//! Stored in `~/.config/skiff/config.yaml`. Every field is optional and
//! command line flags take precedence over it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{RepoError, Result};

/// Skiff client configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkiffConfig {
    /// Root of the skeleton layer cache
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_path: Option<PathBuf>,

    /// Talk to registries over plain HTTP
    #[serde(default)]
    pub plain_http: bool,

    /// Accept invalid registry certificates (insecure, not recommended)
    #[serde(default)]
    pub insecure_skip_tls_verify: bool,

    /// Skip version requirement checks of imported skeletons
    #[serde(default)]
    pub skip_version_check: bool,

    /// Default target architecture
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub architecture: String,
}

impl SkiffConfig {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Get default configuration path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| RepoError::InvalidConfig {
            message: "Could not determine config directory".to_string(),
        })?;
        Ok(config_dir.join("skiff").join("config.yaml"))
    }

    /// Configured cache path, or the platform cache directory
    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(path) = &self.cache_path {
            return Ok(path.clone());
        }
        let cache_dir = dirs::cache_dir().ok_or_else(|| RepoError::InvalidConfig {
            message: "Could not determine cache directory".to_string(),
        })?;
        Ok(cache_dir.join("skiff"))
    }
}
