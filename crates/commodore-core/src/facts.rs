//! Classification facts derived from file paths

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

use crate::values::Values;

/// Distribution / cloud / region classification of a configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Facts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl Facts {
    /// True if at least one fact is set
    pub fn has_fact(&self) -> bool {
        self.distribution.is_some() || self.cloud.is_some() || self.region.is_some()
    }

    /// Stable key over all three facts, `null` standing in for absent ones
    pub fn cache_key(&self) -> String {
        format!(
            "{}-{}-{}",
            self.distribution.as_deref().unwrap_or("null"),
            self.cloud.as_deref().unwrap_or("null"),
            self.region.as_deref().unwrap_or("null"),
        )
    }

    /// The facts class handed to the renderer: `parameters.facts` with
    /// absent facts pruned.
    pub fn to_document(&self) -> Values {
        Values(json!({ "parameters": { "facts": self } }))
    }

    /// Apply facts reported by the cluster registry on top of these ones.
    ///
    /// Only the `distribution`, `cloud` and `region` keys are considered;
    /// facts the registry doesn't report are kept.
    pub fn override_with(&self, reported: &BTreeMap<String, String>) -> Facts {
        let pick = |key: &str, current: &Option<String>| {
            reported
                .get(key)
                .filter(|v| !v.is_empty())
                .cloned()
                .or_else(|| current.clone())
        };
        Facts {
            distribution: pick("distribution", &self.distribution),
            cloud: pick("cloud", &self.cloud),
            region: pick("region", &self.region),
        }
    }
}

/// Compiled file name patterns plus the values treated as "no fact"
#[derive(Debug, Clone)]
pub struct FactPatterns {
    pub distribution: Regex,
    pub cloud_region: Regex,
    pub ignore_values: Vec<String>,
}

impl FactPatterns {
    pub fn parse_file_name(&self, path: &str) -> Facts {
        parse_file_name(path, &self.distribution, &self.cloud_region, &self.ignore_values)
    }
}

/// Extract distribution/cloud/region from a repository-relative file path.
///
/// `distribution_regex` provides `distribution` (and optionally `cloud`);
/// a match of `cloud_region_regex` overrides `cloud` and provides `region`.
/// Captured values listed in `ignore_values` are dropped.
pub fn parse_file_name(
    path: &str,
    distribution_regex: &Regex,
    cloud_region_regex: &Regex,
    ignore_values: &[String],
) -> Facts {
    let mut facts = Facts::default();

    if let Some(caps) = distribution_regex.captures(path) {
        facts.distribution = capture(&caps, "distribution");
        facts.cloud = capture(&caps, "cloud");
    }
    if let Some(caps) = cloud_region_regex.captures(path) {
        facts.cloud = capture(&caps, "cloud");
        facts.region = capture(&caps, "region");
    }

    for fact in [&mut facts.distribution, &mut facts.cloud, &mut facts.region] {
        if fact.as_ref().is_some_and(|v| ignore_values.contains(v)) {
            *fact = None;
        }
    }

    tracing::debug!(
        path,
        distribution = ?facts.distribution,
        cloud = ?facts.cloud,
        region = ?facts.region,
        "parsed facts from file name"
    );
    facts
}

fn capture(caps: &regex::Captures<'_>, name: &str) -> Option<String> {
    caps.name(name)
        .map(|m| m.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
