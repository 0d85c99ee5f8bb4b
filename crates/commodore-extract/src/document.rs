//! Configuration document access

use serde_json::{Map, Value};
use std::path::Path;

use crate::error::DocumentParseError;

pub use commodore_core::scalar_string;

pub type Mapping = Map<String, Value>;

/// Parse a YAML document into a dynamic tree
pub fn parse_document(content: &str, file_name: &str) -> Result<Value, DocumentParseError> {
    serde_yaml::from_str(content).map_err(|e| DocumentParseError::from_yaml(&e, file_name, content))
}

/// The root `parameters` map of a document, if it has one
pub fn parameters(doc: &Value) -> Option<&Mapping> {
    doc.get("parameters").and_then(Value::as_object)
}

/// Parse `content` and return its `parameters` map.
///
/// Unparsable documents and documents without parameters yield `None`.
pub fn load_parameters(content: &str, file_name: &str) -> Option<Mapping> {
    let doc = match parse_document(content, file_name) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::debug!(file = file_name, error = %e.message, "Failed to parse document");
            return None;
        }
    };
    let params = parameters(&doc).cloned();
    if params.is_none() {
        tracing::debug!(file = file_name, "Document has no parameters");
    }
    params
}

/// String field of a map, ignoring non-string values
pub fn str_field<'a>(map: &'a Mapping, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

/// File name without directory and extension (`class/defaults.yml` -> `defaults`)
pub fn file_stem(path: &str) -> Option<&str> {
    Path::new(path).file_stem().and_then(|s| s.to_str())
}
