//! Memoized inventory rendering
//!
//! One render per distinct repository path and fact combination for the
//! lifetime of the [`Inventory`]. Render failures degrade to empty
//! parameters and are retried on the next request.

use commodore_core::Facts;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::KeyedCache;
use crate::error::Result;
use crate::renderer::{InventoryRenderer, RenderArgs, RenderedParameters};

/// What to render
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    pub repo_path: &'a Path,
    /// Global defaults checkout, for tenant repositories
    pub global_path: Option<&'a Path>,
    pub extra_values_file: Option<&'a Path>,
    pub facts: &'a Facts,
}

pub struct Inventory {
    renderer: Arc<dyn InventoryRenderer>,
    cache: KeyedCache<RenderedParameters>,
    cache_dir: PathBuf,
}

impl Inventory {
    pub fn new(renderer: Arc<dyn InventoryRenderer>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            renderer,
            cache: KeyedCache::new(),
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Cache key of a render: repository path plus the three facts
    pub fn cache_key(repo_path: &Path, facts: &Facts) -> String {
        format!("{}-{}", repo_path.display(), facts.cache_key())
    }

    /// Render the inventory for `request`, reusing an earlier render with
    /// the same key. Returns empty parameters if rendering fails.
    pub async fn render_inventory(&self, request: &RenderRequest<'_>) -> RenderedParameters {
        let key = Self::cache_key(request.repo_path, request.facts);
        if let Some(cached) = self.cache.get(&key) {
            tracing::info!(cache_key = %key, "Reusing cached versions");
            return cached;
        }

        let rendered = self
            .cache
            .get_or_try_init(&key, || self.render_uncached(&key, request))
            .await;

        rendered.unwrap_or_else(|e| {
            tracing::warn!(cache_key = %key, error = %e, "Error rendering reclass inventory");
            RenderedParameters::default()
        })
    }

    /// Forget every cached render
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cached_renders(&self) -> usize {
        self.cache.len()
    }

    async fn render_uncached(
        &self,
        key: &str,
        request: &RenderRequest<'_>,
    ) -> Result<RenderedParameters> {
        let facts_file = self.cache_dir.join(format!("{}-facts.yaml", key_digest(key)));
        write_yaml_file(&facts_file, &request.facts.to_document())?;

        let args = RenderArgs {
            repo_path: request.repo_path.to_path_buf(),
            global_path: request.global_path.map(Path::to_path_buf),
            facts_file,
            extra_values_file: request.extra_values_file.map(Path::to_path_buf),
        };
        self.renderer.render(&args).await
    }
}

/// Serialize `value` as YAML to `path`, creating parent directories
pub fn write_yaml_file<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let yaml = serde_yaml::to_string(value)?;
    std::fs::write(path, yaml)?;
    Ok(())
}

/// Hex SHA-256 of `key`, safe to use as a file name
pub fn key_digest(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}
