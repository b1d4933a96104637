//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps errors to appropriate exit codes.

use miette::Diagnostic;
use thiserror::Error;

use skiff_compose::ComposeError;
use skiff_repo::RepoError;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Version requirements or configuration checks failed
    #[error("Validation failed: {message}")]
    #[diagnostic(code(skiff::cli::validation))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Package definition or import graph error
    #[error("Package error: {message}")]
    #[diagnostic(code(skiff::cli::package))]
    Package {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Registry access failed
    #[error("Registry error: {message}")]
    #[diagnostic(code(skiff::cli::registry))]
    Registry {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(skiff::cli::io))]
    Io { message: String },

    /// Internal error (runtime, unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(skiff::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Package { .. } => exit_codes::PACKAGE_ERROR,
            CliError::Registry { .. } => exit_codes::REGISTRY_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Describe where in the import graph a failure happened
fn import_help(err: &ComposeError) -> Option<String> {
    let chain = err.import_chain();
    if chain.is_empty() {
        None
    } else {
        Some(format!("import chain: {}", chain.join(" -> ")))
    }
}

impl From<ComposeError> for CliError {
    fn from(err: ComposeError) -> Self {
        let help = import_help(&err);
        let message = err.to_string();
        let cause = err.root_cause();
        let message = if std::ptr::eq(cause, &err) {
            message
        } else {
            format!("{}: {}", message, cause)
        };

        match cause {
            ComposeError::UnmetRequirements { .. } | ComposeError::MissingTemplate { .. } => {
                CliError::Validation { message, help }
            }
            ComposeError::NotSkeleton { .. }
            | ComposeError::SkeletonNotFound { .. }
            | ComposeError::Remote { .. } => CliError::Registry { message, help },
            ComposeError::Io { .. } | ComposeError::ImportPath { .. } => {
                CliError::Io { message }
            }
            _ => CliError::Package { message, help },
        }
    }
}

impl From<RepoError> for CliError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::InvalidConfig { .. } | RepoError::Serialization(_) => CliError::Validation {
                message: err.to_string(),
                help: Some(format!(
                    "check the configuration file at {}",
                    skiff_repo::SkiffConfig::default_path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|_| "~/.config/skiff/config.yaml".to_string())
                )),
            },
            RepoError::Io(e) => CliError::from(e),
            other => CliError::Registry {
                message: other.to_string(),
                help: None,
            },
        }
    }
}

impl From<skiff_core::CoreError> for CliError {
    fn from(err: skiff_core::CoreError) -> Self {
        match err {
            skiff_core::CoreError::InvalidSetValue { .. } => CliError::Validation {
                message: err.to_string(),
                help: Some("use --set KEY=value".to_string()),
            },
            other => CliError::Package {
                message: other.to_string(),
                help: None,
            },
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
