//! Package definition (`skiff.yaml`) types and parsing

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::component::Component;
use crate::error::{CoreError, Result};

/// API version written by this release
pub const API_VERSION: &str = "skiff.dev/v1alpha1";

/// A Skiff package definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageDefinition {
    /// API version (skiff.dev/v1alpha1)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,

    /// Package type
    #[serde(default)]
    pub kind: PackageKind,

    /// Package metadata
    #[serde(default)]
    pub metadata: Metadata,

    /// Build-time information and requirements
    #[serde(default)]
    pub build: BuildData,

    /// Components, in declaration order
    #[serde(default)]
    pub components: Vec<Component>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constants: Vec<Constant>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<InteractiveVariable>,

    /// Package level values files and schema
    #[serde(default, skip_serializing_if = "PackageValues::is_empty")]
    pub values: PackageValues,
}

impl PackageDefinition {
    /// Parse a package definition from raw manifest bytes
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let pkg: PackageDefinition = serde_yaml::from_slice(bytes)?;

        if !pkg.api_version.is_empty() && pkg.api_version != API_VERSION {
            return Err(CoreError::InvalidPackage {
                message: format!(
                    "Unsupported API version: {}. Expected: {}",
                    pkg.api_version, API_VERSION
                ),
            });
        }

        Ok(pkg)
    }

    /// Read and parse a manifest file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref()).map_err(|source| CoreError::PathAccess {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        Self::parse(&bytes)
    }

    /// Serialize back to YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Package type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PackageKind {
    SkiffInitConfig,
    #[default]
    SkiffPackageConfig,
}

/// Package metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Package name
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,

    /// Target architecture, defaulted at load time when unset
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub architecture: String,

    /// Disable compression of the final artifact
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub uncompressed: bool,

    /// Package can be deployed without an init package
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub yolo: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub authors: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub documentation: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub vendor: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// Build-time data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildData {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub terminal: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub architecture: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub timestamp: String,

    /// Version of the tool that built the package
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub flavor: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub migrations: Vec<String>,

    /// Minimum tool versions needed to consume this package
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub version_requirements: Vec<VersionRequirement>,
}

/// A minimum tool version and why it is needed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRequirement {
    pub version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
}

/// Values files and JSON Schema applied to the whole package
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageValues {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub schema: String,
}

impl PackageValues {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.schema.is_empty()
    }
}

/// How a variable's value is loaded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    #[default]
    Raw,
    File,
}

impl VariableType {
    fn is_raw(&self) -> bool {
        *self == VariableType::Raw
    }
}

/// A named deploy-time substitution value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub name: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub sensitive: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub auto_indent: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pattern: String,

    #[serde(default, rename = "type", skip_serializing_if = "VariableType::is_raw")]
    pub kind: VariableType,
}

/// A variable that may prompt the user for a value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractiveVariable {
    #[serde(flatten)]
    pub variable: Variable,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub prompt: bool,
}

/// A fixed substitution value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constant {
    pub name: String,

    #[serde(default)]
    pub value: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub auto_indent: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pattern: String,
}

/// Anything identified by a name, used for first-wins deduplication
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for InteractiveVariable {
    fn name(&self) -> &str {
        &self.variable.name
    }
}

impl Named for Constant {
    fn name(&self) -> &str {
        &self.name
    }
}
