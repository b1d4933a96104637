//! Override semantics between an imported component and its importer
//!
//! The importing component acts as an override of the component it imports.
//! Each function here handles one group of fields and takes the imported
//! component by value, returning the composed one.

use indexmap::IndexMap;

use skiff_core::{ActionSet, Chart, Component, Manifest};

use crate::error::{ComposeError, Result};

/// Identity and targeting fields
///
/// Name, default and required always follow the override. Description and
/// flavor are replaced only when the override sets them. `only.localOS` may
/// be set on one side but never redefined.
pub fn override_metadata(mut comp: Component, over: &Component) -> Result<Component> {
    comp.name = over.name.clone();
    comp.default = over.default;
    comp.required = over.required;

    if !over.description.is_empty() {
        comp.description = over.description.clone();
    }

    if !over.only.flavor.is_empty() {
        comp.only.flavor = over.only.flavor.clone();
    }

    if !over.only.local_os.is_empty() {
        if !comp.only.local_os.is_empty() && comp.only.local_os != over.only.local_os {
            return Err(ComposeError::LocalOsRedefined {
                component: comp.name,
                existing: comp.only.local_os,
                requested: over.only.local_os.clone(),
            });
        }
        comp.only.local_os = over.only.local_os.clone();
    }

    Ok(comp)
}

/// Deprecated group and scripts
pub fn override_deprecated(mut comp: Component, over: &Component) -> Component {
    comp.deprecated_group = over.deprecated_group.clone();

    let scripts = &mut comp.deprecated_scripts;
    scripts.before.extend(over.deprecated_scripts.before.iter().cloned());
    scripts.after.extend(over.deprecated_scripts.after.iter().cloned());

    scripts.retry |= over.deprecated_scripts.retry;
    scripts.show_output |= over.deprecated_scripts.show_output;
    if over.deprecated_scripts.timeout_seconds > 0 {
        scripts.timeout_seconds = over.deprecated_scripts.timeout_seconds;
    }

    comp
}

/// Lifecycle hooks, phase by phase
pub fn override_actions(mut comp: Component, over: &Component) -> Component {
    merge_action_set(&mut comp.actions.on_create, &over.actions.on_create);
    merge_action_set(&mut comp.actions.on_deploy, &over.actions.on_deploy);
    merge_action_set(&mut comp.actions.on_remove, &over.actions.on_remove);
    comp
}

fn merge_action_set(set: &mut ActionSet, over: &ActionSet) {
    set.defaults = over.defaults.clone();
    set.before.extend(over.before.iter().cloned());
    set.after.extend(over.after.iter().cloned());
    set.on_failure.extend(over.on_failure.iter().cloned());
    set.on_success.extend(over.on_success.iter().cloned());
}

/// Resource lists
///
/// Most lists are concatenated, imported entries first. Charts and manifests
/// stay unique by name: an override entry naming an existing one is folded
/// into it, otherwise it is appended.
pub fn override_resources(mut comp: Component, over: &Component) -> Component {
    comp.data_injections.extend(over.data_injections.iter().cloned());
    comp.files.extend(over.files.iter().cloned());
    comp.images.extend(over.images.iter().cloned());
    comp.repos.extend(over.repos.iter().cloned());

    comp.charts = merge_by_name(
        std::mem::take(&mut comp.charts),
        &over.charts,
        |c| c.name.as_str(),
        merge_chart,
    );
    comp.manifests = merge_by_name(
        std::mem::take(&mut comp.manifests),
        &over.manifests,
        |m| m.name.as_str(),
        merge_manifest,
    );

    comp.health_checks.extend(over.health_checks.iter().cloned());
    comp.image_archives.extend(over.image_archives.iter().cloned());

    comp
}

/// Fold entries sharing a name together, keeping first-seen order
fn merge_by_name<T: Clone>(
    base: Vec<T>,
    overrides: &[T],
    name: impl Fn(&T) -> &str,
    merge: impl Fn(&mut T, &T),
) -> Vec<T> {
    let mut by_name: IndexMap<String, T> = IndexMap::with_capacity(base.len() + overrides.len());

    for item in base.iter().chain(overrides) {
        match by_name.get_mut(name(item)) {
            Some(existing) => merge(existing, item),
            None => {
                by_name.insert(name(item).to_string(), item.clone());
            }
        }
    }

    by_name.into_values().collect()
}

fn merge_chart(chart: &mut Chart, over: &Chart) {
    if !over.namespace.is_empty() {
        chart.namespace = over.namespace.clone();
    }
    if !over.release_name.is_empty() {
        chart.release_name = over.release_name.clone();
    }
    if !over.version.is_empty() {
        chart.version = over.version.clone();
    }
    if !over.url.is_empty() {
        chart.url = over.url.clone();
    }
    chart.values_files.extend(over.values_files.iter().cloned());
    chart.variables.extend(over.variables.iter().cloned());
    chart.values.extend(over.values.iter().cloned());
}

fn merge_manifest(manifest: &mut Manifest, over: &Manifest) {
    if !over.namespace.is_empty() {
        manifest.namespace = over.namespace.clone();
    }
    manifest.files.extend(over.files.iter().cloned());
    manifest.kustomizations.extend(over.kustomizations.iter().cloned());
}
