//! Components command - component and package versions of a configuration file

use commodore_core::ManagerConfig;
use commodore_extract::ComponentManager;
use std::path::{Path, PathBuf};

use crate::display::{OutputFormat, print_package_files};
use crate::error::Result;
use crate::util::{read_file, relative_name};

/// Command line overrides layered over the manager config file
#[derive(Debug, Default)]
pub struct ConfigOverrides {
    pub config: Option<PathBuf>,
    pub local_dir: Option<PathBuf>,
    pub tenant_id: Option<String>,
    pub global_repo_url: Option<String>,
    pub lieutenant_url: Option<String>,
    pub extra_config: Option<PathBuf>,
}

impl ConfigOverrides {
    pub fn resolve(self) -> Result<ManagerConfig> {
        let mut config = match &self.config {
            Some(path) => ManagerConfig::load_from(path)?,
            None => ManagerConfig::default(),
        };

        if let Some(local_dir) = self.local_dir {
            config.local_dir = local_dir;
        }
        if let Some(tenant_id) = self.tenant_id {
            config.tenant_id = tenant_id;
        }
        if let Some(url) = self.global_repo_url {
            config.global_repo_url = url;
        }
        if let Some(url) = self.lieutenant_url {
            config.lieutenant_url = url;
        }
        if self.extra_config.is_some() {
            config.extra_config = self.extra_config;
        }
        Ok(config)
    }
}

pub async fn run(file: &Path, overrides: ConfigOverrides, format: OutputFormat) -> Result<()> {
    let config = overrides.resolve()?;
    let content = read_file(file)?;
    let file_name = package_file_name(file, &config.local_dir);
    tracing::debug!(file = %file_name, tenant = %config.tenant_id, "extracting components");

    let manager = ComponentManager::from_config(&config);
    let result = manager
        .extract_package_file(&content, &file_name, &config)
        .await;

    if let Err(e) = manager.global_repos().cleanup() {
        tracing::warn!(error = %e, "failed to remove global repository clones");
    }

    let package_files: Vec<_> = result?.into_iter().collect();
    print_package_files(&package_files, format)
}

/// Name of `file` as seen from the repository root, which is what the
/// fact patterns match against
fn package_file_name(file: &Path, local_dir: &Path) -> String {
    match (file.canonicalize(), local_dir.canonicalize()) {
        (Ok(file), Ok(dir)) => relative_name(&file, &dir),
        _ => relative_name(file, local_dir),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_win_over_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(
            &config_path,
            r#"{"tenantId": "t-file", "lieutenantURL": "https://file.example.com"}"#,
        )
        .unwrap();

        let config = ConfigOverrides {
            config: Some(config_path),
            tenant_id: Some("t-cli".to_string()),
            ..Default::default()
        }
        .resolve()
        .unwrap();

        assert_eq!(config.tenant_id, "t-cli");
        assert_eq!(config.lieutenant_url, "https://file.example.com");
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let err = ConfigOverrides {
            config: Some(PathBuf::from("/nonexistent/config.json")),
            ..Default::default()
        }
        .resolve()
        .unwrap_err();

        assert_eq!(err.exit_code(), crate::exit_codes::CONFIG_ERROR);
    }

    #[test]
    fn test_package_file_name_is_relative_to_local_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("distribution")).unwrap();
        let file = dir.path().join("distribution/k3d.yml");
        std::fs::write(&file, "").unwrap();

        assert_eq!(package_file_name(&file, dir.path()), "distribution/k3d.yml");
    }
}
