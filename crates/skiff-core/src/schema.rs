//! JSON Schema helpers for package values
//!
//! Imported packages carry their own values schema. To keep sibling imports
//! from colliding, each imported schema is nested under the importing
//! component's name before being merged into the package schema.

use serde_json::{Map, Value as JsonValue, json};
use std::path::Path;

use crate::error::{CoreError, Result};

/// Read and parse a JSON Schema file
pub fn load_schema<P: AsRef<Path>>(path: P) -> Result<JsonValue> {
    let content =
        std::fs::read_to_string(path.as_ref()).map_err(|source| CoreError::PathAccess {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
    Ok(serde_json::from_str(&content)?)
}

/// Nest a schema under `name`
///
/// Produces `{"type": "object", "properties": {<name>: <schema>}}`.
pub fn namespace_schema(schema: JsonValue, name: &str) -> JsonValue {
    json!({
        "type": "object",
        "properties": { name: schema },
    })
}

/// Merge two schemas by their top-level properties
///
/// When one side is absent the other is returned untouched. Otherwise the
/// result is an object schema holding the union of both property sets,
/// `overlay` winning on conflicting keys.
pub fn merge_schemas(base: Option<JsonValue>, overlay: Option<JsonValue>) -> Option<JsonValue> {
    let (base, overlay) = match (base, overlay) {
        (None, overlay) => return overlay,
        (base, None) => return base,
        (Some(base), Some(overlay)) => (base, overlay),
    };

    let mut properties = properties_of(base);
    properties.extend(properties_of(overlay));

    Some(json!({
        "type": "object",
        "properties": JsonValue::Object(properties),
    }))
}

fn properties_of(schema: JsonValue) -> Map<String, JsonValue> {
    match schema {
        JsonValue::Object(mut map) => match map.remove("properties") {
            Some(JsonValue::Object(props)) => props,
            _ => Map::new(),
        },
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_namespace_schema() {
        let schema = json!({"type": "object", "properties": {"replicas": {"type": "integer"}}});
        let namespaced = namespace_schema(schema.clone(), "podinfo");

        assert_eq!(namespaced["type"], "object");
        assert_eq!(namespaced["properties"]["podinfo"], schema);
    }

    #[test]
    fn test_merge_with_absent_side_is_passthrough() {
        let schema = json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "type": "object",
            "required": ["domain"],
            "properties": {"domain": {"type": "string"}}
        });

        assert_eq!(merge_schemas(None, Some(schema.clone())), Some(schema.clone()));
        assert_eq!(merge_schemas(Some(schema.clone()), None), Some(schema));
        assert_eq!(merge_schemas(None, None), None);
    }

    #[test]
    fn test_merge_overlay_wins() {
        let base = json!({"properties": {"a": {"type": "string"}, "b": {"type": "string"}}});
        let overlay = json!({"properties": {"b": {"type": "integer"}, "c": {"type": "boolean"}}});

        let merged = merge_schemas(Some(base), Some(overlay)).unwrap();
        assert_eq!(merged["type"], "object");
        assert_eq!(merged["properties"]["a"]["type"], "string");
        assert_eq!(merged["properties"]["b"]["type"], "integer");
        assert_eq!(merged["properties"]["c"]["type"], "boolean");
    }

    #[test]
    fn test_merge_without_properties() {
        let merged = merge_schemas(Some(json!({"type": "object"})), Some(json!(true))).unwrap();
        assert_eq!(merged, json!({"type": "object", "properties": {}}));
    }

    #[test]
    fn test_load_schema() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("values.schema.json");
        std::fs::write(&path, r#"{"type": "object"}"#).unwrap();
        assert_eq!(load_schema(&path).unwrap(), json!({"type": "object"}));

        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(load_schema(&path), Err(CoreError::JsonParse(_))));
    }
}
