//! Package definition loading
//!
//! Reads a package from disk, resolves its imports for the target
//! architecture and flavor, fills component name and package templates and
//! validates the composed result.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Instant;

use skiff_core::{
    COMPONENT_NAME_TEMPLATE, Component, PackageDefinition, PackagePath, TOOL_VERSION, Values,
    resolve_package_path,
};

use crate::error::{ComposeError, Result};
use crate::package_template::fill_package_templates;
use crate::remote::SkeletonSource;
use crate::resolver::{ImportResolver, ResolveOptions};
use crate::scratch::ScratchDir;

/// Options for [`load_package_definition`]
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub flavor: String,
    /// Overrides the package's own architecture
    pub architecture: String,
    pub cache_path: PathBuf,
    pub skip_version_check: bool,
    /// Values for package templates; `None` leaves templates unfilled
    pub set_variables: Option<BTreeMap<String, String>>,
}

/// A composed package definition with its merged values
#[derive(Debug, Clone)]
pub struct LoadedDefinition {
    pub package: PackageDefinition,
    pub location: PackagePath,
    /// Package values files merged in order, later files winning
    pub values: Values,
}

/// Architecture name of the running host
pub fn host_architecture() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        "powerpc64" => "ppc64",
        other => other,
    }
}

/// Load, compose and validate the package definition at `path`
pub async fn load_package_definition(
    path: impl AsRef<Path>,
    options: &LoadOptions,
    remote: &dyn SkeletonSource,
    scratch: &mut ScratchDir,
) -> Result<LoadedDefinition> {
    let start = Instant::now();
    let location = resolve_package_path(path.as_ref())?;
    let mut pkg = PackageDefinition::from_file(&location.manifest_file)?;

    pkg.metadata.architecture = if !options.architecture.is_empty() {
        options.architecture.clone()
    } else if !pkg.metadata.architecture.is_empty() {
        pkg.metadata.architecture.clone()
    } else {
        host_architecture().to_string()
    };

    let resolver = ImportResolver::new(
        ResolveOptions {
            architecture: pkg.metadata.architecture.clone(),
            flavor: options.flavor.clone(),
            cache_path: options.cache_path.clone(),
            skip_version_check: options.skip_version_check,
            tool_version: TOOL_VERSION.to_string(),
        },
        remote,
    );
    let mut pkg = resolver.resolve(pkg, path.as_ref(), scratch).await?;

    pkg.components = pkg
        .components
        .into_iter()
        .map(|c| fill_component_name(c, &location.manifest_file))
        .collect::<Result<_>>()?;

    if let Some(set_variables) = &options.set_variables {
        pkg = fill_package_templates(pkg, set_variables, &location.manifest_file)?;
    }

    if !options.flavor.is_empty() && !pkg.components.iter().any(|c| c.only.flavor == options.flavor)
    {
        tracing::warn!("flavor {} not used in package {}", options.flavor, pkg.metadata.name);
    }

    validate_composed(&pkg)?;

    let files: Vec<PathBuf> = pkg
        .values
        .files
        .iter()
        .map(|f| location.base_dir.join(f))
        .collect();
    let values = Values::from_files(&files)?;

    tracing::debug!(
        "loaded package {} in {:?}",
        pkg.metadata.name,
        start.elapsed()
    );

    Ok(LoadedDefinition {
        package: pkg,
        location,
        values,
    })
}

/// Replace the component name template everywhere inside a component
fn fill_component_name(component: Component, manifest: &Path) -> Result<Component> {
    let yaml = serde_yaml::to_string(&component).map_err(|e| ComposeError::parse(manifest, e))?;
    if !yaml.contains(COMPONENT_NAME_TEMPLATE) {
        return Ok(component);
    }
    let filled = yaml.replace(COMPONENT_NAME_TEMPLATE, &component.name);
    serde_yaml::from_str(&filled).map_err(|e| ComposeError::parse(manifest, e))
}

/// Check the invariants a composed package must hold
pub fn validate_composed(pkg: &PackageDefinition) -> Result<()> {
    if pkg.components.is_empty() {
        return Err(ComposeError::InvalidPackage {
            message: "package does not contain any compatible components".to_string(),
        });
    }

    let mut names = HashSet::new();
    for component in &pkg.components {
        if component.has_import() {
            return Err(ComposeError::InvalidPackage {
                message: format!("component {} still has an import", component.name),
            });
        }
        if !names.insert(component.name.as_str()) {
            return Err(ComposeError::InvalidPackage {
                message: format!("component name {} is not unique", component.name),
            });
        }
    }

    Ok(())
}
