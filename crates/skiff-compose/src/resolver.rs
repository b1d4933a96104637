//! Recursive component import resolution
//!
//! Resolution walks the import graph depth first. Path imports recurse into
//! the imported package (restricted to the requested component), URL imports
//! read a published skeleton. Each imported component is rebased, merged with
//! its importer and namespaced before it replaces the importing component.

use futures::future::BoxFuture;
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use skiff_core::schema::merge_schemas;
use skiff_core::{
    Component, Constant, CoreError, InteractiveVariable, Named, PackageDefinition, PackagePath,
    TOOL_VERSION, resolve_package_path, validate_version_requirements,
};

use crate::error::{ComposeError, RemoteError, Result};
use crate::lineage::ImportLineage;
use crate::merge::{override_actions, override_deprecated, override_metadata, override_resources};
use crate::namespace::namespace_templates;
use crate::paths::{make_path_relative_to, rewrite_paths};
use crate::remote::{SkeletonManifest, SkeletonSource};
use crate::scratch::ScratchDir;
use crate::skeleton;
use crate::validate::validate_import;
use crate::values::{namespace_schema_file, namespace_values_file, read_schema, write_merged_schema};

/// Settings shared by every level of one resolution
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Target architecture; components constrained to another one are dropped
    pub architecture: String,
    /// Selected flavor; empty selects only unflavored components
    pub flavor: String,
    /// Root of the skeleton cache
    pub cache_path: PathBuf,
    /// Skip minimum version checks of URL imports
    pub skip_version_check: bool,
    /// Version compared against imported version requirements
    pub tool_version: String,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            architecture: String::new(),
            flavor: String::new(),
            cache_path: PathBuf::new(),
            skip_version_check: false,
            tool_version: TOOL_VERSION.to_string(),
        }
    }
}

/// Resolves every import of a package definition
pub struct ImportResolver<'a> {
    options: ResolveOptions,
    remote: &'a dyn SkeletonSource,
}

/// The parts of one imported package folded into its importer
#[derive(Default)]
struct Folded {
    components: Vec<Component>,
    variables: Vec<InteractiveVariable>,
    constants: Vec<Constant>,
    values_files: Vec<String>,
    schema: Option<JsonValue>,
}

/// A package fetched for one import, with the directory its paths are relative to
struct Fetched {
    package: PackageDefinition,
    import_dir: PathBuf,
}

impl<'a> ImportResolver<'a> {
    pub fn new(options: ResolveOptions, remote: &'a dyn SkeletonSource) -> Self {
        Self { options, remote }
    }

    /// Resolve all imports of `pkg`, loaded from `path`
    ///
    /// Namespaced copies are written to `scratch`, which must outlive any use
    /// of the returned definition.
    pub async fn resolve(
        &self,
        pkg: PackageDefinition,
        path: impl AsRef<Path>,
        scratch: &mut ScratchDir,
    ) -> Result<PackageDefinition> {
        let lineage = ImportLineage::new();
        self.resolve_at(pkg, path.as_ref().to_path_buf(), &lineage, scratch)
            .await
    }

    fn resolve_at<'s>(
        &'s self,
        mut pkg: PackageDefinition,
        path: PathBuf,
        lineage: &'s ImportLineage,
        scratch: &'s mut ScratchDir,
    ) -> BoxFuture<'s, Result<PackageDefinition>> {
        Box::pin(async move {
            let start = Instant::now();
            let location = resolve_package_path(&path)?;
            let lineage = lineage.descend(&location.base_dir);

            tracing::debug!(
                "resolving imports of {} from {} (arch: {}, flavor: {}, depth: {})",
                pkg.metadata.name,
                location.manifest_file.display(),
                self.options.architecture,
                self.options.flavor,
                lineage.depth()
            );

            let mut folded = Folded {
                variables: std::mem::take(&mut pkg.variables),
                constants: std::mem::take(&mut pkg.constants),
                ..Default::default()
            };

            for component in std::mem::take(&mut pkg.components) {
                if !component
                    .is_compatible(&self.options.architecture, &self.options.flavor)
                {
                    continue;
                }

                if !component.has_import() {
                    folded.components.push(component);
                    continue;
                }

                let name = component.name.clone();
                let import_location = if component.import.path.is_empty() {
                    component.import.url.clone()
                } else {
                    component.import.path.clone()
                };

                self.import_component(component, &location, &lineage, scratch, &mut folded)
                    .await
                    .map_err(|e| ComposeError::InImport {
                        component: name,
                        location: import_location,
                        depth: lineage.depth(),
                        source: Box::new(e),
                    })?;
            }

            folded.values_files.append(&mut pkg.values.files);
            folded.values_files.dedup();
            pkg.values.files = folded.values_files;
            pkg.components = folded.components;

            let mut schema = folded.schema;
            if !pkg.values.schema.is_empty() {
                let own = read_schema(&location.base_dir, &pkg.values.schema)?;
                schema = merge_schemas(schema, Some(own));
            }
            if let Some(schema) = schema {
                pkg.values.schema = write_merged_schema(scratch, &schema)?;
            }

            pkg.variables = dedup_by_name(folded.variables);
            pkg.constants = dedup_by_name(folded.constants);

            tracing::debug!(
                "resolved imports of {}: {} components in {:?}",
                pkg.metadata.name,
                pkg.components.len(),
                start.elapsed()
            );

            Ok(pkg)
        })
    }

    async fn import_component(
        &self,
        component: Component,
        location: &PackagePath,
        lineage: &ImportLineage,
        scratch: &mut ScratchDir,
        folded: &mut Folded,
    ) -> Result<()> {
        validate_import(&component)?;

        let Fetched {
            package: imported,
            import_dir,
        } = if component.import.path.is_empty() {
            self.fetch_url(&component).await?
        } else {
            self.fetch_path(&component, location, lineage, scratch)
                .await?
        };

        let selected = self.select(&imported, component.import_name())?;

        let base_dir = &location.base_dir;
        let composed = rewrite_paths(selected, &import_dir, base_dir);
        let composed = override_metadata(composed, &component)?;
        let composed = namespace_templates(composed, base_dir, scratch)?;
        let composed = override_deprecated(composed, &component);
        let composed = override_actions(composed, &component);
        let composed = override_resources(composed, &component);
        folded.components.push(composed);

        folded.variables.extend(imported.variables);
        folded.constants.extend(imported.constants);

        for file in &imported.values.files {
            let relative = make_path_relative_to(file, &import_dir);
            let namespaced = namespace_values_file(scratch, &component.name, base_dir, &relative)?;
            folded.values_files.push(namespaced);
        }

        if !imported.values.schema.is_empty() {
            let relative = make_path_relative_to(&imported.values.schema, &import_dir);
            let namespaced = namespace_schema_file(base_dir, &relative, &component.name)?;
            folded.schema = merge_schemas(folded.schema.take(), Some(namespaced));
        }

        Ok(())
    }

    /// Load and resolve the package a path import points at
    ///
    /// The returned import directory stays relative to the importer's base
    /// directory.
    async fn fetch_path(
        &self,
        component: &Component,
        location: &PackagePath,
        lineage: &ImportLineage,
        scratch: &mut ScratchDir,
    ) -> Result<Fetched> {
        let relative = PathBuf::from(&component.import.path);
        let import_path = location.base_dir.join(&relative);

        let imported_location = resolve_package_path(&import_path).map_err(|e| match e {
            CoreError::PathAccess { path, source } => ComposeError::ImportPath { path, source },
            other => other.into(),
        })?;

        if lineage.contains(&imported_location.base_dir) {
            return Err(ComposeError::CyclicImport {
                package: import_path.display().to_string(),
                parent: location.base_dir.display().to_string(),
                component: component.name.clone(),
            });
        }

        let mut imported = PackageDefinition::from_file(&imported_location.manifest_file)?;
        let wanted = component.import_name();
        imported.components.retain(|c| c.name == wanted);

        let imported = self
            .resolve_at(imported, imported_location.manifest_file, lineage, scratch)
            .await?;

        let meta = std::fs::metadata(&import_path).map_err(|source| ComposeError::ImportPath {
            path: import_path.clone(),
            source,
        })?;
        let import_dir = if meta.is_dir() {
            relative
        } else {
            relative.parent().map(Path::to_path_buf).unwrap_or_default()
        };

        Ok(Fetched {
            package: imported,
            import_dir,
        })
    }

    /// Read the skeleton a URL import points at and materialize the component
    async fn fetch_url(&self, component: &Component) -> Result<Fetched> {
        let url = component.import.url.as_str();

        let root = self
            .remote
            .resolve_root(url)
            .await
            .map_err(|e| remote_error(url, e))?;

        let imported = self
            .remote
            .fetch_package(url, &root)
            .await
            .map_err(|e| remote_error(url, e))?;

        if !self.options.skip_version_check {
            validate_version_requirements(&imported, &self.options.tool_version).map_err(
                |e| match e {
                    CoreError::UnmetRequirements { details } => ComposeError::UnmetRequirements {
                        url: url.to_string(),
                        details,
                    },
                    other => other.into(),
                },
            )?;
        }

        // Select before downloading anything
        self.select(&imported, component.import_name())?;
        let import_dir = self.materialize(url, component.import_name(), &root).await?;

        Ok(Fetched {
            package: imported,
            import_dir,
        })
    }

    async fn materialize(
        &self,
        url: &str,
        component: &str,
        root: &SkeletonManifest,
    ) -> Result<PathBuf> {
        skeleton::materialize(self.remote, url, component, root, &self.options.cache_path).await
    }

    /// Pick the single compatible component called `name`
    fn select(&self, imported: &PackageDefinition, name: &str) -> Result<Component> {
        let mut found = imported.components.iter().filter(|c| {
            c.name == name && c.is_compatible(&self.options.architecture, &self.options.flavor)
        });

        match (found.next(), found.next()) {
            (Some(component), None) => Ok(component.clone()),
            (None, _) => Err(ComposeError::ComponentNotFound {
                name: name.to_string(),
            }),
            (Some(_), Some(_)) => Err(ComposeError::MultipleComponents {
                name: name.to_string(),
            }),
        }
    }
}

fn remote_error(url: &str, err: RemoteError) -> ComposeError {
    let url = url.to_string();
    match err {
        RemoteError::NotSkeleton(_) => ComposeError::NotSkeleton {
            url,
            message: err.to_string(),
        },
        RemoteError::NotFound(message) => ComposeError::SkeletonNotFound { url, message },
        RemoteError::Other(message) => ComposeError::Remote { url, message },
    }
}

/// Keep the first item of each name
fn dedup_by_name<T: Named>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.name().to_string()))
        .collect()
}

/// Resolve all imports of `pkg` with a one-off resolver
pub async fn resolve_imports(
    pkg: PackageDefinition,
    path: impl AsRef<Path>,
    options: ResolveOptions,
    remote: &dyn SkeletonSource,
    scratch: &mut ScratchDir,
) -> Result<PackageDefinition> {
    ImportResolver::new(options, remote)
        .resolve(pkg, path, scratch)
        .await
}
