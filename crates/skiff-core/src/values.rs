//! Package values with deep merge and namespacing support

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{CoreError, Result};

/// Values container with deep merge capability
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(pub JsonValue);

impl Values {
    /// Create empty values
    pub fn new() -> Self {
        Self(JsonValue::Object(serde_json::Map::new()))
    }

    /// Load values from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|source| CoreError::PathAccess {
                path: path.as_ref().to_path_buf(),
                source,
            })?;
        Self::from_yaml(&content)
    }

    /// Load and deep merge several values files, later files winning
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut result = Values::new();
        for path in paths {
            result.merge(&Self::from_file(path)?);
        }
        Ok(result)
    }

    /// Parse values from YAML string
    ///
    /// An empty document yields empty values.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: JsonValue = serde_yaml::from_str(yaml)?;
        match value {
            JsonValue::Null => Ok(Self::new()),
            JsonValue::Object(_) => Ok(Self(value)),
            other => Err(CoreError::InvalidPackage {
                message: format!("values must be a mapping, found {}", kind_of(&other)),
            }),
        }
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.0)?)
    }

    /// Deep merge another Values into this one
    ///
    /// Rules:
    /// - Scalars: overlay replaces base
    /// - Objects: recursive merge
    /// - Arrays: overlay replaces base (not appended)
    pub fn merge(&mut self, overlay: &Values) {
        deep_merge(&mut self.0, &overlay.0);
    }

    /// Wrap these values under a single top-level key
    ///
    /// ```yaml
    /// replicas: 3
    /// ```
    ///
    /// namespaced as `podinfo` becomes
    ///
    /// ```yaml
    /// podinfo:
    ///   replicas: 3
    /// ```
    pub fn namespaced(&self, key: &str) -> Values {
        let mut map = serde_json::Map::new();
        map.insert(key.to_string(), self.0.clone());
        Values(JsonValue::Object(map))
    }

    /// Get a value by dotted path
    pub fn get(&self, path: &str) -> Option<&JsonValue> {
        let parts: Vec<&str> = path.split('.').collect();
        get_nested(&self.0, &parts)
    }

    /// Check if values are empty
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            JsonValue::Object(map) => map.is_empty(),
            JsonValue::Null => true,
            _ => false,
        }
    }
}

fn kind_of(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "a sequence",
        JsonValue::Object(_) => "a mapping",
    }
}

/// Deep merge two JSON values
fn deep_merge(base: &mut JsonValue, overlay: &JsonValue) {
    match (base, overlay) {
        (JsonValue::Object(base_map), JsonValue::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}

fn get_nested<'a>(value: &'a JsonValue, path: &[&str]) -> Option<&'a JsonValue> {
    let Some((key, remaining)) = path.split_first() else {
        return Some(value);
    };

    match value {
        JsonValue::Object(map) => map.get(*key).and_then(|v| get_nested(v, remaining)),
        _ => None,
    }
}

/// Parse `--set KEY=value` arguments into template variables
///
/// Keys are upper-cased, values kept verbatim. A later assignment of the
/// same key wins.
pub fn parse_set_variables(set_args: &[String]) -> Result<BTreeMap<String, String>> {
    let mut variables = BTreeMap::new();

    for arg in set_args {
        let (key, val) = arg.split_once('=').ok_or_else(|| CoreError::InvalidSetValue {
            message: format!("'{}'. Expected KEY=value", arg),
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(CoreError::InvalidSetValue {
                message: format!("'{}' has an empty key", arg),
            });
        }
        variables.insert(key.to_uppercase(), val.to_string());
    }

    Ok(variables)
}
