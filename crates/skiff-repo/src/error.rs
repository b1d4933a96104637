//! Error types for registry and configuration operations

use thiserror::Error;

/// Repository operation errors
#[derive(Debug, Error)]
pub enum RepoError {
    // ============ Configuration Errors ============
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    // ============ OCI Errors ============
    #[error("Invalid OCI reference: {reference}")]
    InvalidOciReference { reference: String },

    // ============ Auth Errors ============
    #[error("Authentication failed: {message}")]
    AuthFailed { message: String },

    // ============ IO Errors ============
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for repository operations
pub type Result<T> = std::result::Result<T, RepoError>;

impl From<serde_yaml::Error> for RepoError {
    fn from(e: serde_yaml::Error) -> Self {
        RepoError::Serialization(e.to_string())
    }
}
