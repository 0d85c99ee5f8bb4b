//! Dependency records handed to the update engine

use serde::{Deserialize, Serialize};

/// Why a dependency can't be looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// The declaration doesn't have a usable shape
    InvalidDependencySpecification,
    /// No source / registry to look the dependency up in
    NoSource,
    /// No current version declared
    NoVersion,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDependencySpecification => write!(f, "invalid-dependency-specification"),
            Self::NoSource => write!(f, "no-source"),
            Self::NoVersion => write!(f, "no-version"),
        }
    }
}

/// Where new versions of a dependency are looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Datasource {
    Docker,
    Helm,
    GitRefs,
}

impl std::fmt::Display for Datasource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Docker => write!(f, "docker"),
            Self::Helm => write!(f, "helm"),
            Self::GitRefs => write!(f, "git-refs"),
        }
    }
}

/// Version comparison scheme to apply to a dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Versioning {
    Docker,
}

/// A single extracted dependency.
///
/// Records with a `skip_reason` are still reported so the engine can
/// surface them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageDependency {
    pub dep_name: String,

    /// Declared source of the dependency (git URL, chart source)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_digest: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,

    /// Key the dependency is declared under, when it differs from `dep_name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prop_source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_urls: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasource: Option<Datasource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versioning: Option<Versioning>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace_string: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_replace_string_template: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<SkipReason>,
}

impl PackageDependency {
    pub fn new(dep_name: impl Into<String>) -> Self {
        Self {
            dep_name: dep_name.into(),
            ..Default::default()
        }
    }

    /// Key the dependency is declared under
    pub fn declared_name(&self) -> &str {
        self.prop_source.as_deref().unwrap_or(&self.dep_name)
    }

    pub fn is_skipped(&self) -> bool {
        self.skip_reason.is_some()
    }
}

/// Dependencies found in one file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasource: Option<Datasource>,

    pub deps: Vec<PackageDependency>,
}

impl PackageFile {
    pub fn new(deps: Vec<PackageDependency>) -> Self {
        Self {
            package_file: None,
            datasource: None,
            deps,
        }
    }
}
