//! Container image dependencies
//!
//! Image specifications are maps with `registry`, `repository` (or
//! `image`) and `tag` (or `version`) string fields:
//!
//! ```yaml
//! parameters:
//!   component:
//!     images:
//!       kubectl:
//!         registry: quay.io
//!         repository: bitnami/kubectl
//!         tag: '1.21.2'
//! ```

use commodore_core::{Datasource, ImageScan, PackageDependency, PackageFile, Versioning};
use serde_json::Value;

use crate::document::{Mapping, load_parameters, str_field};

pub const AUTO_REPLACE_STRING_TEMPLATE: &str = "{{newValue}}{{#if newDigest}}@{{newDigest}}{{/if}}";

/// Extract image dependencies from a configuration document.
///
/// Returns `None` both for documents without `parameters` and for
/// documents without any image specification.
pub fn extract_package_file(content: &str, file_name: &str, scan: ImageScan) -> Option<PackageFile> {
    let parameters = load_parameters(content, file_name)?;
    let deps = extract_image_dependencies(&parameters, scan);
    if deps.is_empty() {
        tracing::debug!(file = file_name, "no images found");
        return None;
    }
    Some(PackageFile {
        package_file: Some(file_name.to_string()),
        datasource: Some(Datasource::Docker),
        deps,
    })
}

pub fn extract_image_dependencies(parameters: &Mapping, scan: ImageScan) -> Vec<PackageDependency> {
    let mut deps = Vec::new();
    match scan {
        ImageScan::Shallow => {
            let images = parameters
                .values()
                .filter_map(|component| component.get("images"))
                .filter_map(Value::as_object);
            for image in images.flat_map(|images| images.values()) {
                deps.extend(parse_image_dependency(image));
            }
        }
        ImageScan::Deep => {
            for value in parameters.values() {
                collect_images(value, &mut deps);
            }
        }
    }
    deps
}

/// Every node is tried as an image specification; children are walked
/// whether it matched or not.
fn collect_images(value: &Value, deps: &mut Vec<PackageDependency>) {
    match value {
        Value::Object(map) => {
            deps.extend(parse_image_dependency(value));
            for child in map.values() {
                collect_images(child, deps);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_images(item, deps);
            }
        }
        _ => {}
    }
}

/// Interpret `spec` as an image specification
pub fn parse_image_dependency(spec: &Value) -> Option<PackageDependency> {
    let map = spec.as_object()?;
    let non_empty = |key: &str| str_field(map, key).filter(|v| !v.is_empty());

    let registry = non_empty("registry");
    let repository = non_empty("repository").or_else(|| non_empty("image"))?;
    let tag = non_empty("tag").or_else(|| non_empty("version"))?;

    let dep_name = match registry {
        Some(registry) => format!("{}/{}", registry, repository),
        None => repository.to_string(),
    };
    let (current_value, current_digest) = match tag.split_once('@') {
        Some((value, digest)) => (value, Some(digest.to_string())),
        None => (tag, None),
    };

    Some(PackageDependency {
        current_value: Some(current_value.to_string()).filter(|v| !v.is_empty()),
        current_digest,
        datasource: Some(Datasource::Docker),
        versioning: Some(Versioning::Docker),
        replace_string: Some(tag.to_string()),
        auto_replace_string_template: Some(AUTO_REPLACE_STRING_TEMPLATE.to_string()),
        ..PackageDependency::new(dep_name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registry_image_version_aliases() {
        let dep = parse_image_dependency(&json!({
            "registry": "quay.io",
            "image": "bitnami/kubectl",
            "version": "1.21.2"
        }))
        .unwrap();

        assert_eq!(dep.dep_name, "quay.io/bitnami/kubectl");
        assert_eq!(dep.current_value.as_deref(), Some("1.21.2"));
        assert_eq!(dep.replace_string.as_deref(), Some("1.21.2"));
        assert_eq!(dep.versioning, Some(Versioning::Docker));
        assert_eq!(
            dep.auto_replace_string_template.as_deref(),
            Some(AUTO_REPLACE_STRING_TEMPLATE)
        );
    }

    #[test]
    fn test_image_without_separate_tag_is_excluded() {
        assert!(parse_image_dependency(&json!({"image": "bitnami/kubectl:1.21.2"})).is_none());
    }

    #[test]
    fn test_registry_prefix_only_when_non_empty() {
        let dep = parse_image_dependency(&json!({
            "registry": "",
            "repository": "nginx",
            "tag": "1.25"
        }))
        .unwrap();
        assert_eq!(dep.dep_name, "nginx");
    }

    #[test]
    fn test_non_string_fields_are_absent() {
        assert!(parse_image_dependency(&json!({"repository": "nginx", "tag": 1.25})).is_none());

        let dep = parse_image_dependency(&json!({
            "registry": {"host": "quay.io"},
            "repository": {"name": "x"},
            "image": "nginx",
            "tag": "1.25"
        }))
        .unwrap();
        assert_eq!(dep.dep_name, "nginx");
    }

    #[test]
    fn test_digest_is_split_from_tag() {
        let dep = parse_image_dependency(&json!({
            "registry": "docker.io",
            "repository": "library/nginx",
            "tag": "1.25.3@sha256:abcdef"
        }))
        .unwrap();

        assert_eq!(dep.current_value.as_deref(), Some("1.25.3"));
        assert_eq!(dep.current_digest.as_deref(), Some("sha256:abcdef"));
        assert_eq!(dep.replace_string.as_deref(), Some("1.25.3@sha256:abcdef"));
    }

    #[test]
    fn test_shallow_scan_only_reads_images_maps() {
        let params = json!({
            "foo": {
                "images": {
                    "a": {"registry": "quay.io", "repository": "a", "tag": "1"}
                },
                "nested": {
                    "b": {"registry": "quay.io", "repository": "b", "tag": "2"}
                }
            }
        });
        let deps = extract_image_dependencies(params.as_object().unwrap(), ImageScan::Shallow);

        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].dep_name, "quay.io/a");
    }

    #[test]
    fn test_deep_scan_walks_maps_and_sequences() {
        let params = json!({
            "foo": {
                "images": {
                    "a": {"registry": "quay.io", "repository": "a", "tag": "1"}
                },
                "sidecars": [
                    {"name": "x", "image": {"repository": "b", "tag": "2"}}
                ],
                "outer": {
                    "image": "c",
                    "tag": "3",
                    "inner": {"image": "d", "version": "4"}
                }
            }
        });
        let deps = extract_image_dependencies(params.as_object().unwrap(), ImageScan::Deep);
        let names: Vec<_> = deps.iter().map(|d| d.dep_name.as_str()).collect();

        assert_eq!(names, vec!["quay.io/a", "b", "c", "d"]);
    }

    #[test]
    fn test_no_images_is_none() {
        let content = "parameters:\n  foo:\n    replicas: 2\n";
        assert!(extract_package_file(content, "params.yml", ImageScan::Deep).is_none());
        assert!(extract_package_file("nothing here", "no.yml", ImageScan::Deep).is_none());
    }
}
