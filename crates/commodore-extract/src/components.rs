//! Component and package dependencies
//!
//! Declarations live under `parameters.components` and
//! `parameters.packages`:
//!
//! ```yaml
//! parameters:
//!   components:
//!     argocd:
//!       url: https://github.com/projectsyn/component-argocd.git
//!       version: v1.0.0
//! ```
//!
//! Declarations without a `url` get it from the rendered inventory.

use commodore_core::{
    Datasource, ExtraConfig, Facts, ManagerConfig, PackageDependency, PackageFile, SkipReason,
    Values,
};
use commodore_inventory::{
    ClusterInfo, CommodoreRenderer, ComponentRef, GlobalRepoCache, Inventory, LieutenantClient,
    RenderRequest, RenderedParameters, key_digest, load_global_repo_config, write_yaml_file,
};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::document::{Mapping, file_stem, load_parameters, scalar_string, str_field};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Component,
    Package,
}

impl DeclarationKind {
    pub const ALL: [DeclarationKind; 2] = [DeclarationKind::Component, DeclarationKind::Package];

    /// Key of the declarations map below `parameters`
    pub fn parameter_key(self) -> &'static str {
        match self {
            Self::Component => "components",
            Self::Package => "packages",
        }
    }

    /// Prefix of the dependency names
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Component => "component",
            Self::Package => "package",
        }
    }

    fn rendered(self, params: &RenderedParameters) -> &BTreeMap<String, ComponentRef> {
        match self {
            Self::Component => &params.components,
            Self::Package => &params.packages,
        }
    }
}

fn declarations(
    parameters: &Mapping,
    kind: DeclarationKind,
) -> impl Iterator<Item = (&String, &Value)> {
    parameters
        .get(kind.parameter_key())
        .and_then(Value::as_object)
        .into_iter()
        .flatten()
}

fn declared_url(decl: &Mapping) -> Option<&str> {
    str_field(decl, "url").filter(|u| !u.trim().is_empty())
}

/// True if the document declares any component or package
pub fn has_declarations(parameters: &Mapping) -> bool {
    DeclarationKind::ALL
        .iter()
        .any(|kind| declarations(parameters, *kind).next().is_some())
}

/// True if some declaration lacks a `url` the inventory has to provide
pub fn needs_rendering(parameters: &Mapping) -> bool {
    DeclarationKind::ALL.iter().any(|kind| {
        declarations(parameters, *kind)
            .filter_map(|(_, decl)| decl.as_object())
            .any(|decl| declared_url(decl).is_none())
    })
}

/// Component and package dependencies of `parameters`, with blank URLs
/// filled in from `rendered`.
pub fn extract_dependencies(
    parameters: &Mapping,
    rendered: &RenderedParameters,
) -> Vec<PackageDependency> {
    DeclarationKind::ALL
        .iter()
        .flat_map(|kind| {
            declarations(parameters, *kind)
                .map(move |(name, decl)| to_dependency(*kind, name, decl, rendered))
        })
        .collect()
}

fn to_dependency(
    kind: DeclarationKind,
    name: &str,
    decl: &Value,
    rendered: &RenderedParameters,
) -> PackageDependency {
    let mut dep = PackageDependency {
        datasource: Some(Datasource::GitRefs),
        ..PackageDependency::new(format!("{}-{}", kind.prefix(), name))
    };

    let Some(decl) = decl.as_object() else {
        tracing::warn!(dependency = %dep.dep_name, "declaration is not a map");
        dep.skip_reason = Some(SkipReason::InvalidDependencySpecification);
        return dep;
    };

    dep.url = declared_url(decl).map(str::to_string).or_else(|| {
        kind.rendered(rendered)
            .get(name)
            .and_then(|r| r.url.clone())
            .filter(|u| !u.trim().is_empty())
    });
    if dep.url.is_none() {
        tracing::debug!(dependency = %dep.dep_name, "no url declared or rendered");
    }

    dep.current_value = decl.get("version").and_then(scalar_string);
    if dep.current_value.is_none() {
        dep.skip_reason = Some(SkipReason::NoVersion);
    }
    dep
}

/// Write the renderer's extra values; on failure render without them.
fn write_extra_values(path: PathBuf, values: &Values) -> Option<PathBuf> {
    match write_yaml_file(&path, values) {
        Ok(()) => Some(path),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "unable to write extra values, rendering without them");
            None
        }
    }
}

/// Component manager: extraction plus the inventory rendering it needs
pub struct ComponentManager {
    inventory: Inventory,
    global_repos: GlobalRepoCache,
}

impl ComponentManager {
    pub fn new(inventory: Inventory, global_repos: GlobalRepoCache) -> Self {
        Self {
            inventory,
            global_repos,
        }
    }

    /// Manager rendering with the configured `commodore` executable
    pub fn from_config(config: &ManagerConfig) -> Self {
        let renderer = Arc::new(CommodoreRenderer::new(&config.commodore_command));
        Self::new(
            Inventory::new(renderer, &config.cache_dir),
            GlobalRepoCache::new(&config.cache_dir, &config.git_command),
        )
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn global_repos(&self) -> &GlobalRepoCache {
        &self.global_repos
    }

    /// Extract component and package dependencies from one file.
    ///
    /// Only configuration errors are returned; unreachable collaborators
    /// degrade to unresolved URLs.
    pub async fn extract_package_file(
        &self,
        content: &str,
        file_name: &str,
        config: &ManagerConfig,
    ) -> Result<Option<PackageFile>> {
        let Some(parameters) = load_parameters(content, file_name) else {
            return Ok(None);
        };
        if !has_declarations(&parameters) {
            tracing::debug!(file = file_name, "no components or packages declared");
            return Ok(None);
        }

        let rendered = if needs_rendering(&parameters) {
            self.render(file_name, config).await?
        } else {
            RenderedParameters::default()
        };

        let deps = extract_dependencies(&parameters, &rendered);
        if deps.is_empty() {
            return Ok(None);
        }
        Ok(Some(PackageFile {
            package_file: Some(file_name.to_string()),
            datasource: Some(Datasource::GitRefs),
            deps,
        }))
    }

    async fn render(&self, file_name: &str, config: &ManagerConfig) -> Result<RenderedParameters> {
        let user_layer = config.load_extra_config()?;
        if config.is_tenant_repo() {
            return self.render_tenant(file_name, config, &user_layer).await;
        }

        let extra = ExtraConfig::resolve([&user_layer])?;
        let facts = extra.fact_patterns()?.parse_file_name(file_name);
        let extra_values_file = if extra.extra_values.is_empty() {
            None
        } else {
            let key = key_digest(&config.local_dir.display().to_string());
            write_extra_values(
                config.cache_dir.join(format!("{}-extra-values.yaml", key)),
                &extra.extra_values,
            )
        };

        Ok(self
            .render_with(&facts, &config.local_dir, None, extra_values_file.as_deref())
            .await)
    }

    async fn render_tenant(
        &self,
        file_name: &str,
        config: &ManagerConfig,
        user_layer: &Values,
    ) -> Result<RenderedParameters> {
        let Some(global_dir) = self.global_repo(config).await else {
            return Ok(RenderedParameters::default());
        };
        let global_layer = load_global_repo_config(&global_dir);
        let extra = ExtraConfig::resolve([&global_layer, user_layer])?;

        let cluster_id = file_stem(file_name).unwrap_or(file_name);
        let mut facts = extra.fact_patterns()?.parse_file_name(file_name);
        let info = self.cluster_info(config, cluster_id).await;
        if let Some(info) = &info {
            facts = facts.override_with(&info.facts);
        }

        let extra_values = extra
            .extra_values
            .merged(&cluster_values(cluster_id, &config.tenant_id, info));
        let extra_values_file = write_extra_values(
            config
                .cache_dir
                .join(format!("{}-extra-values.yaml", cluster_id)),
            &extra_values,
        );

        Ok(self
            .render_with(
                &facts,
                &config.local_dir,
                Some(global_dir.as_path()),
                extra_values_file.as_deref(),
            )
            .await)
    }

    async fn render_with(
        &self,
        facts: &Facts,
        repo_path: &Path,
        global_path: Option<&Path>,
        extra_values_file: Option<&Path>,
    ) -> RenderedParameters {
        self.inventory
            .render_inventory(&RenderRequest {
                repo_path,
                global_path,
                extra_values_file,
                facts,
            })
            .await
    }

    async fn global_repo(&self, config: &ManagerConfig) -> Option<PathBuf> {
        if config.global_repo_url.is_empty() {
            tracing::warn!(tenant = %config.tenant_id, "tenant repository without globalRepoURL, not rendering inventory");
            return None;
        }
        match self.global_repos.get_or_clone(&config.global_repo_url).await {
            Ok(dir) => Some(dir),
            Err(e) => {
                tracing::warn!(url = %config.global_repo_url, error = %e, "unable to clone global repository");
                None
            }
        }
    }

    async fn cluster_info(&self, config: &ManagerConfig, cluster_id: &str) -> Option<ClusterInfo> {
        if config.lieutenant_url.is_empty() {
            tracing::debug!(cluster_id, "no Lieutenant URL configured");
            return None;
        }
        let Some(token) = config.lieutenant_token() else {
            tracing::warn!(cluster_id, env = %config.lieutenant_token_env, "no Lieutenant API token configured");
            return None;
        };

        let client = match LieutenantClient::new(&config.lieutenant_url, token) {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(error = %e, "unable to create Lieutenant client");
                return None;
            }
        };
        match client.fetch_cluster_info(cluster_id).await {
            Ok(info) => Some(info),
            Err(e) if e.is_not_found() => {
                tracing::info!(cluster_id, reason = %e, "cluster not found in Lieutenant");
                None
            }
            Err(e) => {
                tracing::warn!(cluster_id, error = %e, "unable to fetch cluster info from Lieutenant");
                None
            }
        }
    }
}

/// Parameters identifying the cluster a tenant file belongs to
fn cluster_values(cluster_id: &str, tenant_id: &str, info: Option<ClusterInfo>) -> Values {
    let (tenant, dynamic_facts) = match info {
        Some(info) => {
            let tenant = if info.tenant.is_empty() {
                tenant_id.to_string()
            } else {
                info.tenant
            };
            (tenant, info.dynamic_facts)
        }
        None => (tenant_id.to_string(), Value::Null),
    };
    let dynamic_facts = if dynamic_facts.is_null() {
        json!({})
    } else {
        dynamic_facts
    };

    Values(json!({
        "parameters": {
            "cluster": {
                "name": cluster_id,
                "tenant": tenant,
            },
            "dynamic_facts": dynamic_facts,
        }
    }))
}
