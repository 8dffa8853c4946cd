//! Post-commit hook dispatch with retries.

use crate::client::{DeployRequest, DeploymentClient};
use crate::error::HookDispatchError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Retry behaviour for a side effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first one. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled for each further attempt.
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 200,
        }
    }
}

impl RetryConfig {
    /// A single attempt, no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            backoff_ms: 0,
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.backoff_ms.saturating_mul(factor))
    }
}

/// A side effect to run after a committed mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum HookAction {
    Deploy(DeployRequest),
    Undeploy { name: String },
}

impl HookAction {
    fn label(&self) -> &str {
        match self {
            HookAction::Deploy(request) => &request.fully_qualified_name,
            HookAction::Undeploy { name } => name,
        }
    }
}

/// Outcome of the side effect attached to a mutation.
#[derive(Debug)]
pub enum HookReport {
    /// The kind's hook policy did not call for a side effect.
    NotTriggered,
    /// A side effect was due but no deployment client is configured.
    Skipped,
    Succeeded { attempts: u32 },
    /// Every attempt failed. The mutation itself stays committed.
    Failed { error: HookDispatchError, attempts: u32 },
}

impl HookReport {
    pub fn is_failed(&self) -> bool {
        matches!(self, HookReport::Failed { .. })
    }

    /// Whether the client was actually called.
    pub fn was_dispatched(&self) -> bool {
        matches!(self, HookReport::Succeeded { .. } | HookReport::Failed { .. })
    }
}

/// Runs hook actions against an injected [`DeploymentClient`].
#[derive(Clone)]
pub struct HookDispatcher {
    client: Option<Arc<dyn DeploymentClient>>,
    retry: RetryConfig,
}

impl HookDispatcher {
    pub fn new(client: Arc<dyn DeploymentClient>, retry: RetryConfig) -> Self {
        Self {
            client: Some(client),
            retry,
        }
    }

    /// A dispatcher without a client; every due action is reported as skipped.
    pub fn disabled() -> Self {
        Self {
            client: None,
            retry: RetryConfig::default(),
        }
    }

    pub fn has_client(&self) -> bool {
        self.client.is_some()
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Runs `action`, retrying per the [`RetryConfig`].
    ///
    /// Must only be called after the mutation that produced `action` has
    /// committed. Failures are logged and returned in the report.
    pub async fn dispatch(&self, action: HookAction) -> HookReport {
        let Some(client) = &self.client else {
            debug!(entity = action.label(), "no deployment client configured, skipping hook");
            return HookReport::Skipped;
        };

        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let result = match &action {
                HookAction::Deploy(request) => client.deploy(request).await,
                HookAction::Undeploy { name } => client.undeploy(name).await,
            };
            match result {
                Ok(()) => {
                    info!(entity = action.label(), attempt, "hook dispatched");
                    return HookReport::Succeeded { attempts: attempt };
                }
                Err(error) if attempt >= max_attempts => {
                    warn!(entity = action.label(), attempts = attempt, %error, "hook failed");
                    return HookReport::Failed {
                        error,
                        attempts: attempt,
                    };
                }
                Err(error) => {
                    warn!(entity = action.label(), attempt, %error, "hook attempt failed, retrying");
                    tokio::time::sleep(self.retry.delay_after(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }
}
