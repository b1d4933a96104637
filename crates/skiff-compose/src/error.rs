//! Error types for import resolution

use std::path::PathBuf;
use thiserror::Error;

use skiff_core::CoreError;

/// Errors raised while composing a package definition
#[derive(Debug, Error)]
pub enum ComposeError {
    // ============ Validation Errors ============
    #[error("invalid imported definition for {component}: {}", violations.join("; "))]
    InvalidImport {
        component: String,
        violations: Vec<String>,
    },

    #[error("package {package} imported in cycle by {parent} in component {component}")]
    CyclicImport {
        package: String,
        parent: String,
        component: String,
    },

    #[error("package validation failed: {message}")]
    InvalidPackage { message: String },

    #[error("template {key:?} must be set with '--set'")]
    MissingTemplate { key: String },

    // ============ Selection Errors ============
    #[error("no compatible component named {name} found")]
    ComponentNotFound { name: String },

    #[error("multiple components named {name} found")]
    MultipleComponents { name: String },

    // ============ Merge Errors ============
    #[error(
        "component {component:?}: \"only.localOS\" {existing:?} cannot be redefined as {requested:?} during compose"
    )]
    LocalOsRedefined {
        component: String,
        existing: String,
        requested: String,
    },

    // ============ Remote Errors ============
    #[error("package at {url} exists but has not been published as a skeleton: {message}")]
    NotSkeleton { url: String, message: String },

    #[error("published skeleton package for {url} does not exist: {message}")]
    SkeletonNotFound { url: String, message: String },

    #[error(
        "package {url} has unmet requirements: {details}\nIf you cannot upgrade Skiff you may skip this check with --skip-version-check. Unexpected behavior or errors may occur"
    )]
    UnmetRequirements { url: String, details: String },

    #[error("registry error for {url}: {message}")]
    Remote { url: String, message: String },

    // ============ IO Errors ============
    #[error("failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to access import path {}: {source}", path.display())]
    ImportPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("unable to extract archive {}: {message}", path.display())]
    Extract { path: PathBuf, message: String },

    // ============ Context ============
    #[error("while importing component {component} from {location} (depth {depth})")]
    InImport {
        component: String,
        location: String,
        depth: usize,
        #[source]
        source: Box<ComposeError>,
    },

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ComposeError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ComposeError::Io {
            action,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        ComposeError::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// The innermost error, past any import context
    pub fn root_cause(&self) -> &ComposeError {
        match self {
            ComposeError::InImport { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Component names of the import chain leading to the failure, outermost first
    pub fn import_chain(&self) -> Vec<&str> {
        let mut chain = Vec::new();
        let mut current = self;
        while let ComposeError::InImport {
            component, source, ..
        } = current
        {
            chain.push(component.as_str());
            current = &**source;
        }
        chain
    }
}

/// Result type for composition
pub type Result<T> = std::result::Result<T, ComposeError>;

/// Failures reported by a skeleton source
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Nothing is published at the reference
    #[error("{0}")]
    NotFound(String),

    /// A package exists but has no skeleton manifest
    #[error("no matching manifest was found in the manifest list: {0}")]
    NotSkeleton(String),

    #[error("{0}")]
    Other(String),
}
