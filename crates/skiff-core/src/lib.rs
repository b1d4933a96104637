//! Skiff Core - Core types and utilities for the air-gap application packager
//!
//! This crate provides the foundational types used throughout Skiff:
//! - `PackageDefinition`: The declarative package manifest (`skiff.yaml`)
//! - `Component`: One named unit of deployable content, possibly importing another
//! - `PackagePath`: Manifest/base-directory resolution for user supplied paths
//! - `Values`: Values files with deep merge and namespacing support
//! - `schema`: JSON Schema namespacing and merging
//! - `requirements`: Minimum tool version checks

pub mod component;
pub mod error;
pub mod layout;
pub mod package;
pub mod reference;
pub mod requirements;
pub mod schema;
pub mod values;

pub use component::{
    Action, ActionDefaults, ActionSet, Actions, Chart, ChartValue, ChartVariable, Component,
    ComponentFile, ComponentImport, ContainerTarget, DataInjection, DeprecatedScripts,
    HealthCheck, ImageArchive, Manifest, OnlyCluster, OnlyTarget,
};
pub use error::{CoreError, Result};
pub use layout::{MANIFEST_FILE, PackagePath, clean_path, resolve_package_path};
pub use package::{
    BuildData, Constant, InteractiveVariable, Metadata, Named, PackageDefinition, PackageKind,
    PackageValues, Variable, VersionRequirement,
};
pub use reference::{is_oci_url, is_url};
pub use requirements::validate_version_requirements;
pub use values::{Values, parse_set_variables};

/// Version of the running tool, used for package version requirements
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Marker for package templates that are filled at create time
pub const PACKAGE_TEMPLATE_PREFIX: &str = "###SKIFF_PKG_TMPL_";

/// Older spelling of [`PACKAGE_TEMPLATE_PREFIX`], still filled but warned about
pub const PACKAGE_VARIABLE_PREFIX: &str = "###SKIFF_PKG_VAR_";

/// Replaced with the package architecture when package templates are filled
pub const PACKAGE_ARCH_TEMPLATE: &str = "###SKIFF_PKG_ARCH###";

/// Replaced with the owning component's name when a package is loaded
pub const COMPONENT_NAME_TEMPLATE: &str = "###SKIFF_COMPONENT_NAME###";
