//! Post-mutation side effects for the catalog engine.
//!
//! After a mutation commits, the repository may ask the [`HookDispatcher`]
//! to deploy or undeploy the entity through an injected
//! [`DeploymentClient`]. Dispatch retries per [`RetryConfig`] and never
//! rolls back the mutation; failures come back as a [`HookReport`].

mod client;
mod dispatcher;
mod error;
mod rest;

pub use client::{DeployRequest, DeploymentClient};
pub use dispatcher::{HookAction, HookDispatcher, HookReport, RetryConfig};
pub use error::{HookDispatchError, HookResult};
pub use rest::{RestClientConfig, RestDeploymentClient};
