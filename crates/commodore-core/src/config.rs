//! Manager configuration
//!
//! Two layers of configuration feed the managers:
//! - [`ManagerConfig`]: what the host engine hands over per repository
//! - [`ExtraConfig`]: file name patterns and renderer inputs, layered as
//!   built-in defaults, then the global repository's extra config, then the
//!   repository's own extra config

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};
use crate::facts::FactPatterns;
use crate::values::Values;

pub const DEFAULT_DISTRIBUTION_REGEX: &str =
    r"^distribution/(?<distribution>[^/]+)(?:/cloud/(?<cloud>.+)\.ya?ml|\.ya?ml)$";
pub const DEFAULT_CLOUD_REGION_REGEX: &str =
    r"^cloud/(?<cloud>[^/]+)(?:/(?<region>.+)\.ya?ml|\.ya?ml)$";
pub const DEFAULT_TOKEN_ENV: &str = "LIEUTENANT_TOKEN";

/// Inbound configuration for one repository
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManagerConfig {
    /// Extra config file, relative to `local_dir`
    pub extra_config: Option<PathBuf>,

    /// Global defaults repository (tenant repositories only)
    #[serde(rename = "globalRepoURL")]
    pub global_repo_url: String,

    /// Tenant the repository belongs to; empty for global repositories
    pub tenant_id: String,

    /// Cluster registry API
    #[serde(rename = "lieutenantURL")]
    pub lieutenant_url: String,

    pub lieutenant_token: Option<String>,

    /// Environment variable holding the API token
    pub lieutenant_token_env: String,

    /// Checkout of the repository being processed
    pub local_dir: PathBuf,

    /// Scratch space for facts files and global repository clones
    pub cache_dir: PathBuf,

    pub commodore_command: String,

    pub git_command: String,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            extra_config: None,
            global_repo_url: String::new(),
            tenant_id: String::new(),
            lieutenant_url: String::new(),
            lieutenant_token: None,
            lieutenant_token_env: DEFAULT_TOKEN_ENV.to_string(),
            local_dir: PathBuf::from("."),
            cache_dir: default_cache_dir(),
            commodore_command: "commodore".to_string(),
            git_command: "git".to_string(),
        }
    }
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("commodore-renovate")
}

impl ManagerConfig {
    /// Load configuration from a JSON file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Whether the repository is a tenant repository layered on a global one
    pub fn is_tenant_repo(&self) -> bool {
        !self.tenant_id.is_empty()
    }

    /// API token: the literal token wins over the environment variable
    pub fn lieutenant_token(&self) -> Option<String> {
        self.lieutenant_token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var(&self.lieutenant_token_env).ok())
            .filter(|t| !t.is_empty())
    }

    /// Load the repository's own extra config layer, empty if none is configured.
    pub fn load_extra_config(&self) -> Result<Values> {
        match &self.extra_config {
            Some(path) if !path.as_os_str().is_empty() => {
                Values::from_file(self.local_dir.join(path))
            }
            _ => Ok(Values::new()),
        }
    }
}

/// How deep the image extractor looks for image specifications
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageScan {
    /// Only `parameters.<component>.images.<key>`
    Shallow,
    /// Every map below `parameters`
    #[default]
    Deep,
}

/// Effective extra configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraConfig {
    pub distribution_regex: String,
    pub cloud_region_regex: String,
    #[serde(default)]
    pub ignore_values: Vec<String>,
    /// Additional parameters passed to the inventory renderer
    #[serde(default)]
    pub extra_values: Values,
    #[serde(default)]
    pub image_scan: ImageScan,
}

impl ExtraConfig {
    /// Built-in defaults as the lowest configuration layer
    pub fn defaults() -> Values {
        Values(json!({
            "distributionRegex": DEFAULT_DISTRIBUTION_REGEX,
            "cloudRegionRegex": DEFAULT_CLOUD_REGION_REGEX,
            "ignoreValues": ["params"],
            "extraValues": {},
            "imageScan": "deep",
        }))
    }

    /// Layer `overrides` (lowest precedence first) on top of the defaults
    pub fn resolve<'a>(overrides: impl IntoIterator<Item = &'a Values>) -> Result<Self> {
        let merged = overrides
            .into_iter()
            .fold(Self::defaults(), |acc, layer| acc.merged(layer));
        serde_json::from_value(merged.into_inner()).map_err(|e| CoreError::InvalidConfig {
            message: e.to_string(),
        })
    }

    pub fn fact_patterns(&self) -> Result<FactPatterns> {
        let distribution = Regex::new(&self.distribution_regex).map_err(|source| {
            CoreError::InvalidPattern {
                field: "distributionRegex",
                source,
            }
        })?;
        let cloud_region = Regex::new(&self.cloud_region_regex).map_err(|source| {
            CoreError::InvalidPattern {
                field: "cloudRegionRegex",
                source,
            }
        })?;
        Ok(FactPatterns {
            distribution,
            cloud_region,
            ignore_values: self.ignore_values.clone(),
        })
    }
}

impl Default for ExtraConfig {
    fn default() -> Self {
        Self {
            distribution_regex: DEFAULT_DISTRIBUTION_REGEX.to_string(),
            cloud_region_regex: DEFAULT_CLOUD_REGION_REGEX.to_string(),
            ignore_values: vec!["params".to_string()],
            extra_values: Values::new(),
            image_scan: ImageScan::Deep,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manager_config_deserialize() {
        let config: ManagerConfig = serde_json::from_str(
            r#"{
                "extraConfig": "renovate-extra.json",
                "globalRepoURL": "https://git.example.com/global.git",
                "tenantId": "t-bar",
                "lieutenantURL": "https://api.example.com",
                "localDir": "/work/repo"
            }"#,
        )
        .unwrap();

        assert_eq!(config.extra_config.as_deref(), Some(Path::new("renovate-extra.json")));
        assert_eq!(config.global_repo_url, "https://git.example.com/global.git");
        assert!(config.is_tenant_repo());
        assert_eq!(config.lieutenant_token_env, DEFAULT_TOKEN_ENV);
        assert_eq!(config.commodore_command, "commodore");
    }

    #[test]
    fn test_literal_token_wins() {
        let config = ManagerConfig {
            lieutenant_token: Some("mock-api-token".to_string()),
            lieutenant_token_env: "COMMODORE_RENOVATE_TEST_UNSET_TOKEN".to_string(),
            ..Default::default()
        };
        assert_eq!(config.lieutenant_token().as_deref(), Some("mock-api-token"));

        let config = ManagerConfig {
            lieutenant_token: None,
            ..config
        };
        assert_eq!(config.lieutenant_token(), None);
    }

    #[test]
    fn test_extra_config_defaults() {
        let extra = ExtraConfig::resolve([]).unwrap();
        assert_eq!(extra.distribution_regex, DEFAULT_DISTRIBUTION_REGEX);
        assert_eq!(extra.ignore_values, vec!["params"]);
        assert_eq!(extra.image_scan, ImageScan::Deep);

        let patterns = extra.fact_patterns().unwrap();
        let facts = patterns.parse_file_name("distribution/k3d/cloud/cloudscale.yml");
        assert_eq!(facts.distribution.as_deref(), Some("k3d"));
        assert_eq!(facts.cloud.as_deref(), Some("cloudscale"));
    }

    #[test]
    fn test_extra_config_layering() {
        let global = Values::from_json(r#"{"ignoreValues": ["global"], "imageScan": "shallow"}"#).unwrap();
        let user = Values::from_json(
            r#"{"distributionRegex": "^d/(?<distribution>[^/]+)\\.yml$", "extraValues": {"parameters": {"x": 1}}}"#,
        )
        .unwrap();

        let extra = ExtraConfig::resolve([&global, &user]).unwrap();
        assert_eq!(extra.ignore_values, vec!["params", "global"]);
        assert_eq!(extra.image_scan, ImageScan::Shallow);
        assert_eq!(extra.distribution_regex, r"^d/(?<distribution>[^/]+)\.yml$");
        assert_eq!(extra.extra_values.get("parameters.x").unwrap(), 1);
    }

    #[test]
    fn test_resolve_layers_from_iterator() {
        let layers = vec![
            Values::from_json(r#"{"ignoreValues": ["global"]}"#).unwrap(),
            Values::from_json(r#"{"ignoreValues": ["user"], "imageScan": "shallow"}"#).unwrap(),
        ];

        let extra = ExtraConfig::resolve(layers.iter()).unwrap();
        assert_eq!(extra.ignore_values, vec!["params", "global", "user"]);
        assert_eq!(extra.image_scan, ImageScan::Shallow);
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let extra = ExtraConfig {
            cloud_region_regex: "(".to_string(),
            ..Default::default()
        };
        let err = extra.fact_patterns().unwrap_err();
        assert!(matches!(err, CoreError::InvalidPattern { field: "cloudRegionRegex", .. }));
    }

    #[test]
    fn test_load_extra_config_from_local_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("extra.json"), r#"{"ignoreValues": ["foo"]}"#).unwrap();

        let config = ManagerConfig {
            extra_config: Some(PathBuf::from("extra.json")),
            local_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let layer = config.load_extra_config().unwrap();
        assert_eq!(layer.get("ignoreValues").unwrap(), &json!(["foo"]));

        let config = ManagerConfig {
            extra_config: None,
            ..config
        };
        assert!(config.load_extra_config().unwrap().is_empty());
    }
}
