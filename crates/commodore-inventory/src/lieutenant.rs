//! Lieutenant API client
//!
//! Looks up cluster information (facts, dynamic facts, tenant) in the
//! cluster registry. Transport failures are passed through untouched so the
//! caller can tell "the registry answered no" apart from "the registry was
//! unreachable".

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use url::Url;

const QUERY_ERROR: &str = "Query error";

/// Errors returned by [`LieutenantClient`]
#[derive(Debug, Error)]
pub enum LieutenantError {
    /// The API replied with a non-200 status
    #[error("{message}")]
    Api { message: String, status_code: u16 },

    /// The request never got a reply
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// A 200 reply whose body isn't cluster information
    #[error("Invalid reply from Lieutenant: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl LieutenantError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            LieutenantError::Api { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// The cluster isn't registered (yet)
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}

/// Cluster as reported by the registry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterInfo {
    pub id: String,
    #[serde(default)]
    pub tenant: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub facts: BTreeMap<String, String>,
    #[serde(default)]
    pub dynamic_facts: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_repo: Option<GitRepoInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitRepoInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub repo_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_keys: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorReply {
    reason: Option<String>,
}

/// Cluster registry client authenticating with a bearer token
pub struct LieutenantClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl LieutenantClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, LieutenantError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            token: token.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET <base>/clusters/<cluster_id>`
    pub async fn fetch_cluster_info(&self, cluster_id: &str) -> Result<ClusterInfo, LieutenantError> {
        self.query("clusters", cluster_id).await
    }

    async fn query<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        id: &str,
    ) -> Result<T, LieutenantError> {
        let url = self.endpoint_url(endpoint, id)?;
        tracing::debug!(url = %url, "querying Lieutenant");

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::OK {
            let body = response.bytes().await?;
            return serde_json::from_slice(&body).map_err(LieutenantError::Decode);
        }

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("application/json"));
        let body = response.text().await.unwrap_or_default();
        let message = is_json
            .then(|| serde_json::from_str::<ErrorReply>(&body).ok())
            .flatten()
            .and_then(|reply| reply.reason)
            .unwrap_or_else(|| QUERY_ERROR.to_string());

        Err(LieutenantError::Api {
            message,
            status_code: status.as_u16(),
        })
    }

    fn endpoint_url(&self, endpoint: &str, id: &str) -> Result<Url, LieutenantError> {
        let base = self.base_url.trim_end_matches('/');
        Ok(Url::parse(&format!("{}/{}/{}", base, endpoint, id))?)
    }
}
