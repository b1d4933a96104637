//! Namespacing of imported values files and schemas

use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};

use skiff_core::{CoreError, Values};
use skiff_core::schema::{load_schema, namespace_schema};

use crate::error::{ComposeError, Result};
use crate::scratch::ScratchDir;

/// File name of the merged package schema in the scratch area
pub const MERGED_SCHEMA_FILE: &str = "values.schema.json";

fn full_path(package_dir: &Path, path: &str) -> PathBuf {
    // Absolute paths survive the join untouched
    package_dir.join(path)
}

/// Wrap a values file under `component` and write it to `<scratch>/<component>/<basename>`
///
/// Nested imports can reuse a component name; a taken destination gets a
/// numbered name (`values-1.yaml`) instead of being overwritten.
pub fn namespace_values_file(
    scratch: &mut ScratchDir,
    component: &str,
    package_dir: &Path,
    values_file: &str,
) -> Result<String> {
    let src = full_path(package_dir, values_file);
    let content =
        std::fs::read_to_string(&src).map_err(|e| ComposeError::io("read values file", &src, e))?;
    let values = Values::from_yaml(&content).map_err(|e| ComposeError::parse(&src, e))?;

    let namespaced = values
        .namespaced(component)
        .to_yaml()
        .map_err(|e| ComposeError::parse(&src, e))?;

    let file_name = Path::new(values_file)
        .file_name()
        .ok_or_else(|| ComposeError::parse(&src, "path has no file name"))?;
    let dest = free_destination(&scratch.component_dir(component)?, Path::new(file_name));
    std::fs::write(&dest, namespaced)
        .map_err(|e| ComposeError::io("write namespaced values file", &dest, e))?;

    Ok(dest.to_string_lossy().into_owned())
}

fn free_destination(dir: &Path, file_name: &Path) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let stem = file_name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = file_name
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    (1..)
        .map(|n| dir.join(format!("{}-{}{}", stem, n, extension)))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

/// Read a schema and nest it under `component`
pub fn namespace_schema_file(
    package_dir: &Path,
    schema_file: &str,
    component: &str,
) -> Result<JsonValue> {
    Ok(namespace_schema(read_schema(package_dir, schema_file)?, component))
}

/// Read a schema as-is
pub fn read_schema(package_dir: &Path, schema_file: &str) -> Result<JsonValue> {
    let src = full_path(package_dir, schema_file);
    load_schema(&src).map_err(|e| match e {
        CoreError::PathAccess { source, .. } => ComposeError::io("read schema file", &src, source),
        other => ComposeError::parse(&src, other),
    })
}

/// Write the merged package schema to `<scratch>/values.schema.json`
pub fn write_merged_schema(scratch: &mut ScratchDir, schema: &JsonValue) -> Result<String> {
    let dest = scratch.root()?.join(MERGED_SCHEMA_FILE);
    let content =
        serde_json::to_string_pretty(schema).map_err(|e| ComposeError::parse(&dest, e))?;
    std::fs::write(&dest, content).map_err(|e| ComposeError::io("write merged schema", &dest, e))?;
    Ok(dest.to_string_lossy().into_owned())
}
