//! REST implementation of [`DeploymentClient`].
//!
//! Talks to an orchestration service exposing:
//! - `POST {base}/deploy` with the entity JSON as body
//! - `DELETE {base}/delete?dag_id=<name>`

use crate::client::{DeployRequest, DeploymentClient};
use crate::error::{HookDispatchError, HookResult};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// REST deployment client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestClientConfig {
    /// Base URL of the orchestration API (e.g. `http://localhost:8080/api/v1`).
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RestClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api/v1".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Deployment client backed by an HTTP API.
pub struct RestDeploymentClient {
    config: RestClientConfig,
    client: Client,
}

impl RestDeploymentClient {
    /// Creates a client for the given configuration.
    pub fn new(config: RestClientConfig) -> HookResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| HookDispatchError::Http(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &RestClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }
}

async fn check_status(response: Response, tolerate_not_found: bool) -> HookResult<()> {
    let status = response.status();
    if status.is_success() || (tolerate_not_found && status.as_u16() == 404) {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(HookDispatchError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl DeploymentClient for RestDeploymentClient {
    async fn deploy(&self, request: &DeployRequest) -> HookResult<()> {
        debug!(entity = %request.fully_qualified_name, "deploying");
        let response = self
            .client
            .post(self.url("deploy"))
            .json(&request.entity)
            .send()
            .await
            .map_err(|e| HookDispatchError::Http(format!("deploy failed: {e}")))?;
        check_status(response, false).await
    }

    async fn undeploy(&self, name: &str) -> HookResult<()> {
        debug!(name, "undeploying");
        let url = format!("{}?dag_id={}", self.url("delete"), urlencoding::encode(name));
        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(|e| HookDispatchError::Http(format!("undeploy failed: {e}")))?;
        check_status(response, true).await
    }
}
