//! Scratch workspace for namespaced copies
//!
//! Templated files, namespaced values files and the merged schema are written
//! here instead of next to their sources. The directory is created on first
//! write and removed when the owning `ScratchDir` is dropped, unless kept.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::error::{ComposeError, Result};

const PREFIX: &str = "skiff-import-";

#[derive(Debug, Default)]
pub struct ScratchDir {
    root: Option<TempDir>,
}

impl ScratchDir {
    pub fn new() -> Self {
        Self::default()
    }

    /// Root of the workspace, if anything was written yet
    pub fn path(&self) -> Option<&Path> {
        self.root.as_ref().map(|d| d.path())
    }

    /// Root of the workspace, creating it on first use
    pub fn root(&mut self) -> Result<&Path> {
        let dir = match self.root.take() {
            Some(dir) => dir,
            None => {
                let dir = tempfile::Builder::new()
                    .prefix(PREFIX)
                    .tempdir()
                    .map_err(|e| {
                        ComposeError::io("create temp directory", std::env::temp_dir(), e)
                    })?;
                tracing::debug!("created scratch directory {}", dir.path().display());
                dir
            }
        };
        Ok(self.root.insert(dir).path())
    }

    /// `<root>/<component>`, created if missing
    pub fn component_dir(&mut self, component: &str) -> Result<PathBuf> {
        let dir = self.root()?.join(component);
        std::fs::create_dir_all(&dir)
            .map_err(|e| ComposeError::io("create component temp directory", &dir, e))?;
        Ok(dir)
    }

    /// `<root>/<component>/<subdir>`, created if missing
    pub fn component_subdir(&mut self, component: &str, subdir: &str) -> Result<PathBuf> {
        let dir = self.component_dir(component)?.join(subdir);
        std::fs::create_dir_all(&dir)
            .map_err(|e| ComposeError::io("create temp subdirectory", &dir, e))?;
        Ok(dir)
    }

    /// Stop tracking the workspace so it outlives this handle
    pub fn keep(self) -> Option<PathBuf> {
        self.root.map(TempDir::keep)
    }
}
