//! Per-component namespacing of templated content

use std::path::Path;

use skiff_core::{Action, Component, is_url};

use crate::error::{ComposeError, Result};
use crate::scratch::ScratchDir;
use crate::template::insert_scope_key;

/// Scope the template state of an imported component under its name
///
/// Chart value source paths gain a `.<name>` prefix. Templated deploy and
/// remove commands are rewritten in place. Templated manifest and component
/// files are copied into the scratch area with their references scoped, and
/// the component is pointed at the copies. Remote files are skipped.
pub fn namespace_templates(
    mut comp: Component,
    package_dir: &Path,
    scratch: &mut ScratchDir,
) -> Result<Component> {
    let name = comp.name.clone();

    for chart in &mut comp.charts {
        for value in &mut chart.values {
            value.source_path = format!(".{}{}", name, value.source_path);
        }
    }

    for set in [&mut comp.actions.on_deploy, &mut comp.actions.on_remove] {
        for actions in set.lists_mut() {
            namespace_actions(actions, &name);
        }
    }

    for manifest in &mut comp.manifests {
        if !manifest.is_template() {
            continue;
        }
        for file in &mut manifest.files {
            if is_url(file) {
                continue;
            }
            *file = transform_file(scratch, &name, "manifests", file, package_dir)?;
        }
    }

    for file in &mut comp.files {
        if !file.is_template() || is_url(&file.source) {
            continue;
        }
        file.source = transform_file(scratch, &name, "files", &file.source, package_dir)?;
    }

    Ok(comp)
}

fn namespace_actions(actions: &mut [Action], key: &str) {
    for action in actions.iter_mut().filter(|a| a.should_template()) {
        action.cmd = insert_scope_key(&action.cmd, key);
    }
}

/// Copy a templated file into `<scratch>/<component>/<subdir>/<basename>` with scoped references
///
/// The copy keeps the source file's permissions.
fn transform_file(
    scratch: &mut ScratchDir,
    component: &str,
    subdir: &str,
    file: &str,
    package_dir: &Path,
) -> Result<String> {
    let src = package_dir.join(file);
    let meta = std::fs::metadata(&src).map_err(|e| ComposeError::io("stat file", &src, e))?;
    let content =
        std::fs::read_to_string(&src).map_err(|e| ComposeError::io("read file", &src, e))?;

    let transformed = insert_scope_key(&content, component);

    let file_name = Path::new(file)
        .file_name()
        .ok_or_else(|| ComposeError::parse(&src, "path has no file name"))?;
    let dest = scratch
        .component_subdir(component, subdir)?
        .join(file_name);

    std::fs::write(&dest, transformed).map_err(|e| ComposeError::io("write file", &dest, e))?;
    std::fs::set_permissions(&dest, meta.permissions())
        .map_err(|e| ComposeError::io("set permissions on", &dest, e))?;

    Ok(dest.to_string_lossy().into_owned())
}
