//! Import lineage for cycle detection
//!
//! A lineage is the chain of package base directories visited on the way to
//! the package being resolved. Descending returns a new lineage, so sibling
//! branches never see each other's entries and a package may legally be
//! imported twice from different branches.

use std::path::{Path, PathBuf};

use skiff_core::clean_path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportLineage {
    dirs: Vec<PathBuf>,
}

impl ImportLineage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of this lineage extended with `dir`
    pub fn descend(&self, dir: &Path) -> Self {
        let mut dirs = self.dirs.clone();
        dirs.push(identity(dir));
        Self { dirs }
    }

    /// Whether `dir` was already visited on this chain
    pub fn contains(&self, dir: &Path) -> bool {
        let dir = identity(dir);
        self.dirs.iter().any(|d| *d == dir)
    }

    pub fn depth(&self) -> usize {
        self.dirs.len()
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }
}

/// Absolute, lexically cleaned form of a directory
fn identity(dir: &Path) -> PathBuf {
    let absolute = std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf());
    clean_path(absolute)
}
