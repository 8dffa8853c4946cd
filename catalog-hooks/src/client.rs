//! Deployment client abstraction.
//!
//! The engine only decides *whether* a side effect runs. What "deploy"
//! means is up to the external orchestration system behind this trait.

use crate::error::HookResult;
use async_trait::async_trait;
use catalog_types::EntityId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An entity to hand to the orchestration system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
    pub entity_type: String,
    pub id: EntityId,
    pub name: String,
    pub fully_qualified_name: String,
    /// The committed entity, references included.
    pub entity: Value,
}

/// External system that runs deployable entities.
#[async_trait]
pub trait DeploymentClient: Send + Sync {
    /// Deploys (or redeploys) an entity.
    async fn deploy(&self, request: &DeployRequest) -> HookResult<()>;

    /// Removes a deployed entity by name. Removing an unknown name succeeds.
    async fn undeploy(&self, name: &str) -> HookResult<()>;
}
