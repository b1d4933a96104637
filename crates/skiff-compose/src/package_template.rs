//! Package template filling
//!
//! `###SKIFF_PKG_TMPL_<KEY>###` markers anywhere in a composed definition are
//! replaced with values supplied at load time, and `###SKIFF_PKG_ARCH###`
//! with the package architecture. The older `###SKIFF_PKG_VAR_<KEY>###`
//! spelling is filled the same way.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde_yaml::Value as YamlValue;
use skiff_core::{
    PACKAGE_ARCH_TEMPLATE, PACKAGE_TEMPLATE_PREFIX, PACKAGE_VARIABLE_PREFIX, PackageDefinition,
};

use crate::error::{ComposeError, Result};

static TEMPLATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"###SKIFF_PKG_(TMPL|VAR)_([A-Z_]+)###").expect("valid regex"));

/// Fill every package template in `pkg` from `set_variables`
///
/// Fails on the first template key without a value. Substitution only
/// touches string scalars, so values never change the document structure.
pub fn fill_package_templates(
    pkg: PackageDefinition,
    set_variables: &BTreeMap<String, String>,
    manifest: &Path,
) -> Result<PackageDefinition> {
    let mut tree = serde_yaml::to_value(&pkg).map_err(|e| ComposeError::parse(manifest, e))?;

    let mut found = BTreeSet::new();
    collect_templates(&tree, &mut found);

    for (syntax, key) in &found {
        if !set_variables.contains_key(key) {
            return Err(ComposeError::MissingTemplate { key: key.clone() });
        }
        if syntax == "VAR" {
            tracing::warn!(
                "package template {:?} uses the deprecated syntax {}{}###, use {}{}### instead",
                key,
                PACKAGE_VARIABLE_PREFIX,
                key,
                PACKAGE_TEMPLATE_PREFIX,
                key
            );
        }
    }

    let mut replacements: Vec<(String, &str)> = Vec::new();
    for (key, value) in set_variables {
        replacements.push((format!("{}{}###", PACKAGE_TEMPLATE_PREFIX, key), value.as_str()));
        replacements.push((format!("{}{}###", PACKAGE_VARIABLE_PREFIX, key), value.as_str()));
    }
    replacements.push((PACKAGE_ARCH_TEMPLATE.to_string(), pkg.metadata.architecture.as_str()));

    replace_in_strings(&mut tree, &replacements);
    serde_yaml::from_value(tree).map_err(|e| ComposeError::parse(manifest, e))
}

fn collect_templates(value: &YamlValue, found: &mut BTreeSet<(String, String)>) {
    match value {
        YamlValue::String(s) => {
            for caps in TEMPLATE.captures_iter(s) {
                found.insert((caps[1].to_string(), caps[2].to_string()));
            }
        }
        YamlValue::Sequence(items) => items.iter().for_each(|v| collect_templates(v, found)),
        YamlValue::Mapping(map) => map.values().for_each(|v| collect_templates(v, found)),
        YamlValue::Tagged(tagged) => collect_templates(&tagged.value, found),
        _ => {}
    }
}

fn replace_in_strings(value: &mut YamlValue, replacements: &[(String, &str)]) {
    match value {
        YamlValue::String(s) => {
            if s.contains("###") {
                for (template, replacement) in replacements {
                    if s.contains(template.as_str()) {
                        *s = s.replace(template.as_str(), replacement);
                    }
                }
            }
        }
        YamlValue::Sequence(items) => items
            .iter_mut()
            .for_each(|v| replace_in_strings(v, replacements)),
        YamlValue::Mapping(map) => map
            .values_mut()
            .for_each(|v| replace_in_strings(v, replacements)),
        YamlValue::Tagged(tagged) => replace_in_strings(&mut tagged.value, replacements),
        _ => {}
    }
}
