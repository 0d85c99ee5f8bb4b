//! Layered configuration values with deep merge support

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::Path;

use crate::error::Result;

/// Dynamic configuration tree (maps, sequences and scalars)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(pub JsonValue);

impl Values {
    /// Create empty values
    pub fn new() -> Self {
        Self(JsonValue::Object(serde_json::Map::new()))
    }

    /// Load values from a YAML (or JSON) file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse values from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: JsonValue = serde_yaml::from_str(yaml)?;
        Ok(Self(value))
    }

    /// Parse values from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let value: JsonValue = serde_json::from_str(json)?;
        Ok(Self(value))
    }

    /// Return a new tree with `overlay` merged on top of `self`.
    ///
    /// Neither input is modified. See [`merge_config`] for the rules.
    pub fn merged(&self, overlay: &Values) -> Values {
        Values(merge_config(&self.0, &overlay.0))
    }

    /// Merge layers in increasing order of precedence
    pub fn merge_all<'a>(layers: impl IntoIterator<Item = &'a Values>) -> Self {
        layers
            .into_iter()
            .fold(Values::new(), |acc, layer| acc.merged(layer))
    }

    /// Get a value by dotted path
    pub fn get(&self, path: &str) -> Option<&JsonValue> {
        let parts: Vec<&str> = path.split('.').collect();
        get_nested(&self.0, &parts)
    }

    /// Get the inner JSON value
    pub fn inner(&self) -> &JsonValue {
        &self.0
    }

    /// Convert to JSON value
    pub fn into_inner(self) -> JsonValue {
        self.0
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

/// Scalar rendered as a string: strings as-is, numbers and booleans printed
pub fn scalar_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl From<JsonValue> for Values {
    fn from(value: JsonValue) -> Self {
        Self(value)
    }
}

/// Deep merge `overlay` onto `base`, returning a fresh tree.
///
/// Rules, per key of `overlay`:
/// - both maps: merged recursively
/// - overlay sequence and base sequence: base elements, then overlay elements
/// - anything else (scalars, patterns, mismatched shapes): overlay replaces base
///
/// When either side is not a map at all, the overlay wins.
pub fn merge_config(base: &JsonValue, overlay: &JsonValue) -> JsonValue {
    let (JsonValue::Object(base_map), JsonValue::Object(overlay_map)) = (base, overlay) else {
        return overlay.clone();
    };

    let mut output = base_map.clone();
    for (key, overlay_value) in overlay_map {
        let merged = match (base_map.get(key), overlay_value) {
            (Some(base_value @ JsonValue::Object(_)), JsonValue::Object(_)) => {
                merge_config(base_value, overlay_value)
            }
            (Some(JsonValue::Array(base_items)), JsonValue::Array(overlay_items)) => {
                JsonValue::Array(base_items.iter().chain(overlay_items).cloned().collect())
            }
            _ => overlay_value.clone(),
        };
        output.insert(key.clone(), merged);
    }
    JsonValue::Object(output)
}

/// Get a nested value by path
fn get_nested<'a>(value: &'a JsonValue, path: &[&str]) -> Option<&'a JsonValue> {
    let Some((key, remaining)) = path.split_first() else {
        return Some(value);
    };

    match value {
        JsonValue::Object(map) => map.get(*key).and_then(|v| get_nested(v, remaining)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deep_merge() {
        let base = Values::from_yaml(r#"
image:
  repository: nginx
  tag: "1.0"
replicas: 1
"#).unwrap();

        let overlay = Values::from_yaml(r#"
image:
  tag: "2.0"
  pullPolicy: Always
replicas: 3
"#).unwrap();

        let merged = base.merged(&overlay);

        assert_eq!(merged.get("image.repository").unwrap(), "nginx");
        assert_eq!(merged.get("image.tag").unwrap(), "2.0");
        assert_eq!(merged.get("image.pullPolicy").unwrap(), "Always");
        assert_eq!(merged.get("replicas").unwrap(), 3);
    }

    #[test]
    fn test_merge_does_not_mutate_inputs() {
        let base = json!({"a": {"b": 1}, "list": [1]});
        let overlay = json!({"a": {"c": 2}, "list": [2]});

        let merged = merge_config(&base, &overlay);

        assert_eq!(base, json!({"a": {"b": 1}, "list": [1]}));
        assert_eq!(overlay, json!({"a": {"c": 2}, "list": [2]}));
        assert_eq!(merged, json!({"a": {"b": 1, "c": 2}, "list": [1, 2]}));
    }

    #[test]
    fn test_sequences_concatenate_in_order() {
        let a = json!({"ignoreValues": ["params"]});
        let b = json!({"ignoreValues": ["defaults", "global"]});

        let merged = merge_config(&a, &b);
        assert_eq!(merged["ignoreValues"], json!(["params", "defaults", "global"]));

        // associative for sequence-valued keys
        let c = json!({"ignoreValues": ["x"]});
        let left = merge_config(&merge_config(&a, &b), &c);
        let right = merge_config(&a, &merge_config(&b, &c));
        assert_eq!(left, right);
    }

    #[test]
    fn test_sequence_onto_missing_or_scalar_is_set() {
        let merged = merge_config(&json!({"x": "scalar"}), &json!({"x": [1], "y": [2]}));
        assert_eq!(merged, json!({"x": [1], "y": [2]}));
    }

    #[test]
    fn test_scalars_last_writer_wins() {
        let a = json!({"distributionRegex": "^a$", "n": 1});
        let b = json!({"distributionRegex": "^b$"});

        assert_eq!(merge_config(&a, &b)["distributionRegex"], "^b$");
        assert_eq!(merge_config(&b, &a)["distributionRegex"], "^a$");
        assert_eq!(merge_config(&a, &b)["n"], 1);
    }

    #[test]
    fn test_map_replaces_scalar_and_scalar_replaces_map() {
        let merged = merge_config(&json!({"a": 1, "b": {"c": 1}}), &json!({"a": {"x": 1}, "b": 2}));
        assert_eq!(merged, json!({"a": {"x": 1}, "b": 2}));
    }

    #[test]
    fn test_merge_all_layers() {
        let defaults = Values(json!({"ignoreValues": ["params"], "imageScan": "deep"}));
        let global = Values(json!({"ignoreValues": ["global"]}));
        let user = Values(json!({"imageScan": "shallow"}));

        let merged = Values::merge_all([&defaults, &global, &user]);
        assert_eq!(merged.get("imageScan").unwrap(), "shallow");
        assert_eq!(merged.get("ignoreValues").unwrap(), &json!(["params", "global"]));
    }

    #[test]
    fn test_is_empty() {
        assert!(Values::new().is_empty());
        assert!(Values(JsonValue::Null).is_empty());
        assert!(!Values(json!({"a": 1})).is_empty());
    }
}
