//! Helm chart dependencies of a component repository
//!
//! Chart versions live in `class/defaults.yml` under
//! `parameters.<component_key>.charts`, either as a plain version
//!
//! ```yaml
//! charts:
//!   chart-1: 1.2.3
//! ```
//!
//! whose source comes from the matching `kapitan.dependencies` entry of
//! `class/<component>.yml`, or as a self-contained object
//!
//! ```yaml
//! charts:
//!   chart-1:
//!     source: https://charts.example.com
//!     version: 1.2.3
//! ```

use commodore_core::{Datasource, PackageDependency, PackageFile, SkipReason};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::{Mapping, file_stem, load_parameters, scalar_string, str_field};
use crate::error::PackageFilesError;

pub const DEFAULTS_FILE: &str = "defaults";
const OCI_SCHEME: &str = "oci://";

/// A package file handed over by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Context of an upgrade verification
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeConfig {
    pub dep_name: String,
    #[serde(default)]
    pub base_deps: Vec<PackageDependency>,
}

/// Parameter key of a component (`component-name` -> `component_name`)
pub fn component_key(component_name: &str) -> String {
    component_name.replace('-', "_")
}

/// Reference a Kapitan dependency uses to point at a chart version
pub fn version_reference(component_key: &str, chart_name: &str) -> String {
    format!("${{{}:charts:{}}}", component_key, chart_name)
}

#[derive(Debug, Clone, Copy)]
struct KapitanHelmDependency<'a> {
    source: Option<&'a str>,
    chart_name: Option<&'a str>,
    version: &'a str,
}

fn kapitan_helm_dependencies(component_params: &Mapping) -> Vec<KapitanHelmDependency<'_>> {
    component_params
        .get("kapitan")
        .and_then(|k| k.get("dependencies"))
        .and_then(Value::as_array)
        .map(|deps| {
            deps.iter()
                .filter_map(Value::as_object)
                .filter(|dep| str_field(dep, "type") == Some("helm"))
                .filter_map(|dep| {
                    Some(KapitanHelmDependency {
                        source: str_field(dep, "source"),
                        chart_name: str_field(dep, "chart_name"),
                        version: str_field(dep, "version")?,
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn charts<'a>(defaults: &'a Mapping, component_key: &str) -> Option<&'a Mapping> {
    defaults
        .get(component_key)
        .and_then(|c| c.get("charts"))
        .and_then(Value::as_object)
}

/// Chart dependencies of `component_name`, joined from its defaults and
/// component class parameters. Unresolvable charts carry a skip reason.
pub fn extract_helm_chart_dependencies(
    component_name: &str,
    defaults: &Mapping,
    component_params: &Mapping,
) -> Vec<PackageDependency> {
    if component_name.is_empty() {
        return Vec::new();
    }
    let key = component_key(component_name);

    let Some(chart_versions) = charts(defaults, &key) else {
        tracing::info!(component = component_name, "No Helm chart versions found");
        return Vec::new();
    };
    let kapitan_deps = kapitan_helm_dependencies(component_params);

    chart_versions
        .iter()
        .map(|(chart_name, spec)| {
            let mut dep = PackageDependency {
                group_name: Some(component_name.to_string()),
                datasource: Some(Datasource::Helm),
                ..PackageDependency::new(chart_name.clone())
            };

            match spec {
                Value::Object(spec) => resolve_new_schema(&mut dep, spec),
                plain => match scalar_string(plain) {
                    Some(version) => {
                        dep.current_value = Some(version);
                        resolve_old_schema(&mut dep, &key, chart_name, &kapitan_deps);
                    }
                    None => {
                        tracing::warn!(chart = %chart_name, "unsupported chart version specification");
                        dep.skip_reason = Some(SkipReason::InvalidDependencySpecification);
                    }
                },
            }

            handle_oci_chart(&mut dep);
            dep
        })
        .collect()
}

fn resolve_new_schema(dep: &mut PackageDependency, spec: &Mapping) {
    let version = spec.get("version").and_then(scalar_string);
    let source = str_field(spec, "source");

    let has_version = version.is_some();
    dep.current_value = version;
    match (has_version, source) {
        (true, Some(source)) if !source.is_empty() => {
            dep.url = Some(source.to_string());
            dep.registry_urls = Some(vec![source.to_string()]);
        }
        (true, Some(_)) => {
            tracing::warn!(chart = %dep.dep_name, "chart has no source, skipping...");
            dep.skip_reason = Some(SkipReason::NoSource);
        }
        _ => {
            tracing::warn!(chart = %dep.dep_name, "chart needs both `version` and `source`");
            dep.skip_reason = Some(SkipReason::InvalidDependencySpecification);
        }
    }
}

fn resolve_old_schema(
    dep: &mut PackageDependency,
    component_key: &str,
    chart_name: &str,
    kapitan_deps: &[KapitanHelmDependency<'_>],
) {
    let reference = version_reference(component_key, chart_name);
    let Some(kapitan) = kapitan_deps.iter().find(|d| d.version == reference) else {
        tracing::warn!(chart = chart_name, reference = %reference, "no Kapitan dependency found for chart");
        dep.skip_reason = Some(SkipReason::InvalidDependencySpecification);
        return;
    };
    let Some(real_name) = kapitan.chart_name.filter(|n| !n.is_empty()) else {
        tracing::warn!(chart = chart_name, "Kapitan dependency has no chart_name");
        dep.skip_reason = Some(SkipReason::InvalidDependencySpecification);
        return;
    };
    let Some(source) = kapitan.source.filter(|s| !s.is_empty()) else {
        tracing::warn!(chart = chart_name, "Kapitan dependency has no source, skipping...");
        dep.skip_reason = Some(SkipReason::NoSource);
        return;
    };

    if real_name != chart_name {
        tracing::info!(
            dependency_name = real_name,
            version_name = chart_name,
            "mismatched chart name between version and dependency, using dependency name for version lookup"
        );
        dep.dep_name = real_name.to_string();
        dep.prop_source = Some(chart_name.to_string());
    }
    dep.url = Some(source.to_string());
    dep.registry_urls = Some(vec![source.to_string()]);
}

/// Point OCI charts at their registry.
///
/// An OCI source like `oci://registry.example.com/charts/chart-1` names the
/// chart itself; the registry URL is the source without its last segment.
/// Derived from `url`, so applying it again changes nothing.
pub fn handle_oci_chart(dep: &mut PackageDependency) {
    let Some(url) = dep.url.as_deref().filter(|u| u.starts_with(OCI_SCHEME)) else {
        return;
    };
    let Some(registry) = url
        .trim_end_matches('/')
        .strip_suffix(dep.dep_name.as_str())
        .and_then(|rest| rest.strip_suffix('/'))
        .filter(|rest| rest.len() > OCI_SCHEME.len())
    else {
        return;
    };
    dep.registry_urls = Some(vec![registry.to_string()]);
}

/// Check that `files` is a defaults class plus one component class.
///
/// Returns the index of the defaults file and the component name.
pub fn check_package_files(files: &[SourceFile]) -> Result<(usize, String), PackageFilesError> {
    let paths = || files.iter().map(|f| f.path.clone()).collect::<Vec<_>>();
    if files.len() != 2 {
        return Err(PackageFilesError::WrongFileCount { count: files.len() });
    }

    let defaults = files
        .iter()
        .position(|f| file_stem(&f.path) == Some(DEFAULTS_FILE))
        .ok_or_else(|| PackageFilesError::NoDefaultsFile { files: paths() })?;
    let component = file_stem(&files[1 - defaults].path)
        .filter(|name| !name.is_empty() && *name != DEFAULTS_FILE)
        .ok_or_else(|| PackageFilesError::NoComponentName { files: paths() })?;

    Ok((defaults, component.to_string()))
}

/// Extract the chart dependencies of a component repository from its
/// defaults and component class files.
pub fn extract_all_package_files(files: &[SourceFile]) -> Option<Vec<PackageFile>> {
    let (defaults_idx, component_name) = match check_package_files(files) {
        Ok(checked) => checked,
        Err(e) => {
            tracing::error!(files = ?files.iter().map(|f| &f.path).collect::<Vec<_>>(), "{}", e);
            return None;
        }
    };
    let defaults_file = &files[defaults_idx];
    let component_file = &files[1 - defaults_idx];

    let defaults = load_parameters(&defaults_file.content, &defaults_file.path)?;
    let component = load_parameters(&component_file.content, &component_file.path)?;

    let deps = extract_helm_chart_dependencies(&component_name, &defaults, &component);
    tracing::debug!(component = %component_name, count = deps.len(), "extracted chart dependencies");
    if deps.is_empty() {
        return None;
    }

    Some(vec![PackageFile {
        package_file: Some(defaults_file.path.clone()),
        datasource: Some(Datasource::Helm),
        deps,
    }])
}

/// Re-read the chart versions declared in a defaults file.
///
/// Used to confirm an upgrade of `config.dep_name`: chart keys are mapped
/// back to dependency names through the base dependencies' `prop_source`.
pub fn extract_package_file(
    content: &str,
    file_name: &str,
    config: &UpgradeConfig,
) -> Option<PackageFile> {
    tracing::debug!(dep = %config.dep_name, file = file_name, "extractPackageFile upgrade");
    if file_stem(file_name) != Some(DEFAULTS_FILE) {
        return None;
    }
    let defaults = load_parameters(content, file_name)?;

    let target = config
        .base_deps
        .iter()
        .find(|d| d.dep_name == config.dep_name)?;
    let group = target.group_name.as_deref()?;
    let chart_versions = charts(&defaults, &component_key(group))?;

    let deps = chart_versions
        .iter()
        .map(|(chart_key, spec)| {
            let base = config
                .base_deps
                .iter()
                .filter(|d| d.group_name.as_deref() == Some(group))
                .find(|d| d.declared_name() == chart_key.as_str());
            let current_value = match spec {
                Value::Object(spec) => spec.get("version").and_then(scalar_string),
                plain => scalar_string(plain),
            };
            let dep_name = base.map_or(chart_key.as_str(), |b| b.dep_name.as_str());
            PackageDependency {
                current_value,
                group_name: Some(group.to_string()),
                prop_source: (dep_name != chart_key.as_str()).then(|| chart_key.clone()),
                ..PackageDependency::new(dep_name)
            }
        })
        .collect();

    Some(PackageFile {
        package_file: Some(file_name.to_string()),
        datasource: Some(Datasource::Helm),
        deps,
    })
}
