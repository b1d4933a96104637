//! Package path resolution

use std::path::{Component as PathComponent, Path, PathBuf};

use crate::error::{CoreError, Result};

/// Conventional manifest file name inside a package directory
pub const MANIFEST_FILE: &str = "skiff.yaml";

/// Manifest file and base directory of a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagePath {
    /// The package definition file
    pub manifest_file: PathBuf,
    /// Directory relative resources in the definition resolve against
    pub base_dir: PathBuf,
}

/// Resolve a user supplied path into a manifest file and base directory
///
/// A directory resolves to `<dir>/skiff.yaml` (whether or not it exists yet),
/// any other path is taken as the manifest itself with its parent as base.
/// Symlinks are followed when deciding, but the returned paths keep the
/// caller's spelling.
pub fn resolve_package_path<P: AsRef<Path>>(path: P) -> Result<PackagePath> {
    let path = path.as_ref();
    let meta = std::fs::metadata(path).map_err(|source| CoreError::PathAccess {
        path: path.to_path_buf(),
        source,
    })?;

    let path = clean_path(path);
    if meta.is_dir() {
        return Ok(PackagePath {
            manifest_file: path.join(MANIFEST_FILE),
            base_dir: path,
        });
    }

    let base_dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok(PackagePath {
        manifest_file: path,
        base_dir,
    })
}

/// Lexically normalize a path
///
/// Drops `.` segments and folds `name/..` pairs without touching the
/// filesystem. Leading `..` segments of relative paths are kept, and `..`
/// directly under the root is dropped. An empty result becomes `.`.
pub fn clean_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let mut out: Vec<PathComponent<'_>> = Vec::new();

    for component in path.as_ref().components() {
        match component {
            PathComponent::CurDir => {}
            PathComponent::ParentDir => match out.last() {
                Some(PathComponent::Normal(_)) => {
                    out.pop();
                }
                Some(PathComponent::RootDir) | Some(PathComponent::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}
