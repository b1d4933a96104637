//! Core error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("unable to access path {}: {source}", path.display())]
    PathAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid skiff.yaml: {message}")]
    InvalidPackage { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid version: {0}")]
    InvalidVersion(#[from] semver::Error),

    #[error("Invalid --set format: {message}")]
    InvalidSetValue { message: String },

    #[error("unmet version requirements:\n{details}")]
    UnmetRequirements { details: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
