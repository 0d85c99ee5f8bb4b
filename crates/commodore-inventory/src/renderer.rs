//! Inventory renderer seam
//!
//! [`InventoryRenderer`] resolves the layered hierarchy for one set of
//! facts. [`CommodoreRenderer`] shells out to `commodore inventory show`.

use async_trait::async_trait;
use commodore_core::scalar_string;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{InventoryError, Result};

/// Resolved `url`/`version` of one component or package
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Output of a render: components and packages keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedParameters {
    #[serde(default)]
    pub components: BTreeMap<String, ComponentRef>,
    #[serde(default)]
    pub packages: BTreeMap<String, ComponentRef>,
}

impl RenderedParameters {
    pub fn is_empty(&self) -> bool {
        self.components.is_empty() && self.packages.is_empty()
    }

    /// Parse the renderer's JSON output; unknown keys are ignored.
    ///
    /// Only output that isn't a JSON object fails. Entries are read
    /// leniently: numeric versions are printed, and entries that aren't
    /// maps are dropped one by one.
    pub fn from_json(output: &str) -> Result<Self> {
        let invalid = |message: String| InventoryError::InvalidRenderOutput { message };
        let value: Value = serde_json::from_str(output).map_err(|e| invalid(e.to_string()))?;
        let root = value
            .as_object()
            .ok_or_else(|| invalid("expected a JSON object".to_string()))?;

        let section = |key: &str| root.get(key).map(|v| component_refs(key, v)).unwrap_or_default();
        Ok(Self {
            components: section("components"),
            packages: section("packages"),
        })
    }
}

fn component_refs(kind: &str, value: &Value) -> BTreeMap<String, ComponentRef> {
    let Some(entries) = value.as_object() else {
        if !value.is_null() {
            tracing::warn!(kind, "ignoring rendered section that is not a map");
        }
        return BTreeMap::new();
    };

    entries
        .iter()
        .filter_map(|(name, entry)| match entry.as_object() {
            Some(fields) => Some((
                name.clone(),
                ComponentRef {
                    url: fields.get("url").and_then(scalar_string),
                    version: fields.get("version").and_then(scalar_string),
                },
            )),
            None => {
                tracing::warn!(kind, name = %name, "ignoring rendered entry that is not a map");
                None
            }
        })
        .collect()
}

/// Inputs of one render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderArgs {
    /// Repository being processed
    pub repo_path: PathBuf,
    /// Global defaults repository, when `repo_path` is a tenant repository
    pub global_path: Option<PathBuf>,
    pub facts_file: PathBuf,
    pub extra_values_file: Option<PathBuf>,
}

impl RenderArgs {
    /// Command line arguments following the executable
    pub fn command_args(&self) -> Vec<String> {
        let mut args = vec!["inventory".to_string(), "show".to_string()];
        match &self.global_path {
            Some(global) => {
                args.push(global.display().to_string());
                args.push(self.repo_path.display().to_string());
            }
            None => args.push(self.repo_path.display().to_string()),
        }
        args.extend(["-o".to_string(), "json".to_string()]);
        args.extend(["-f".to_string(), self.facts_file.display().to_string()]);
        if let Some(extra) = &self.extra_values_file {
            args.extend(["-f".to_string(), extra.display().to_string()]);
        }
        args
    }
}

#[async_trait]
pub trait InventoryRenderer: Send + Sync {
    async fn render(&self, args: &RenderArgs) -> Result<RenderedParameters>;
}

/// Renders through the `commodore` executable
#[derive(Debug, Clone)]
pub struct CommodoreRenderer {
    command: String,
}

impl CommodoreRenderer {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for CommodoreRenderer {
    fn default() -> Self {
        Self::new("commodore")
    }
}

#[async_trait]
impl InventoryRenderer for CommodoreRenderer {
    async fn render(&self, args: &RenderArgs) -> Result<RenderedParameters> {
        let argv = args.command_args();
        tracing::debug!(command = %self.command, args = %argv.join(" "), "rendering inventory");

        let output = Command::new(&self.command)
            .args(&argv)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| InventoryError::RenderSpawn {
                command: self.command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(InventoryError::RenderFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        RenderedParameters::from_json(&String::from_utf8_lossy(&output.stdout))
    }
}
