//! Global defaults repository checkouts
//!
//! Tenant repositories are rendered on top of a shared global repository.
//! Each global repository URL is cloned at most once per process.

use commodore_core::Values;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::cache::KeyedCache;
use crate::error::{InventoryError, Result};
use crate::inventory::key_digest;

const GLOBAL_REPOS_DIR: &str = "global-repos";
const RENOVATE_CONFIG_FILE: &str = "renovate.json";

pub struct GlobalRepoCache {
    clones: KeyedCache<PathBuf>,
    base_dir: PathBuf,
    git_command: String,
}

impl GlobalRepoCache {
    /// Clones go to `<cache_dir>/global-repos/`
    pub fn new(cache_dir: &Path, git_command: impl Into<String>) -> Self {
        Self {
            clones: KeyedCache::new(),
            base_dir: cache_dir.join(GLOBAL_REPOS_DIR),
            git_command: git_command.into(),
        }
    }

    /// Checkout of `url`, cloning it on first use
    pub async fn get_or_clone(&self, url: &str) -> Result<PathBuf> {
        let url = url.trim();
        if url.is_empty() {
            return Err(InventoryError::InvalidRepositoryUrl {
                url: url.to_string(),
                reason: "empty repository URL".to_string(),
            });
        }
        self.clones.get_or_try_init(url, || self.clone_repo(url)).await
    }

    /// Remove every checkout made by this cache
    pub fn cleanup(&self) -> Result<()> {
        self.clones.clear();
        if self.base_dir.exists() {
            tracing::debug!(dir = %self.base_dir.display(), "removing global repository clones");
            std::fs::remove_dir_all(&self.base_dir)?;
        }
        Ok(())
    }

    async fn clone_repo(&self, url: &str) -> Result<PathBuf> {
        let target = self.base_dir.join(key_digest(url));
        if target.exists() {
            tracing::debug!(dir = %target.display(), "removing stale global repository clone");
            std::fs::remove_dir_all(&target)?;
        }
        std::fs::create_dir_all(&self.base_dir)?;

        tracing::info!(url, dir = %target.display(), "cloning global repository");
        let output = Command::new(&self.git_command)
            .arg("clone")
            .arg(url)
            .arg(&target)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| InventoryError::CloneFailed {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(InventoryError::CloneFailed {
                url: url.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(target)
    }
}

#[derive(Debug, Default, Deserialize)]
struct RenovateConfig {
    #[serde(default)]
    commodore: Option<CommodoreSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommodoreSection {
    extra_config: Option<String>,
}

/// Extra config layer declared by a global repository.
///
/// Reads `renovate.json` and, if it names a `commodore.extraConfig` file,
/// returns that file's content. Empty when either is missing or invalid.
pub fn load_global_repo_config(global_dir: &Path) -> Values {
    let config_file = global_dir.join(RENOVATE_CONFIG_FILE);
    let config = match read_json::<RenovateConfig>(&config_file) {
        Ok(config) => config,
        Err(e) => {
            tracing::info!(
                global_dir = %global_dir.display(),
                error = %e,
                "Exception while reading global repo config"
            );
            RenovateConfig::default()
        }
    };

    let Some(extra_config) = config.commodore.and_then(|c| c.extra_config) else {
        return Values::new();
    };

    read_json::<Values>(&global_dir.join(&extra_config)).unwrap_or_else(|e| {
        tracing::info!(
            global_dir = %global_dir.display(),
            extra_config = %extra_config,
            error = %e,
            "Exception while reading global repo extraConfig"
        );
        Values::new()
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
