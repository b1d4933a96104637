//! Import specification checks

use std::path::Path;

use skiff_core::{Component, PACKAGE_TEMPLATE_PREFIX, is_oci_url};

use crate::error::{ComposeError, Result};

/// Check a component's import declaration
///
/// Every violated rule is collected so the user sees them all at once.
pub fn validate_import(component: &Component) -> Result<()> {
    let import = &component.import;
    let mut violations = Vec::new();

    if import.path.contains(PACKAGE_TEMPLATE_PREFIX) || import.url.contains(PACKAGE_TEMPLATE_PREFIX)
    {
        violations.push("package templates are not supported for import path or URL");
    }

    match (import.path.is_empty(), import.url.is_empty()) {
        (true, true) => violations.push("neither a path nor a URL was provided"),
        (false, false) => violations.push("both a path and a URL were provided"),
        (false, true) => {
            if Path::new(&import.path).is_absolute() {
                violations.push("path cannot be an absolute path");
            }
        }
        (true, false) => {
            if !is_oci_url(&import.url) {
                violations.push("URL is not a valid OCI URL");
            }
        }
    }

    if violations.is_empty() {
        return Ok(());
    }

    Err(ComposeError::InvalidImport {
        component: component.name.clone(),
        violations: violations.into_iter().map(String::from).collect(),
    })
}
