use crate::{EntityReference, Relationship};

/// An outgoing edge a kind declares in addition to owner and container.
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedEntity {
    pub target: EntityReference,
    pub relation: Relationship,
}

/// Optional strategy for kinds that need logic beyond their declarative
/// [`KindSpec`](crate::KindSpec) table.
///
/// Most kinds do NOT need a handler. The generic repository resolves
/// references and computes FQNs, diffs and versions on its own.
///
/// Implement this only for:
/// - deriving kind-specific fields before storage
/// - rejecting invalid candidates (surfaced as a validation error)
/// - enriching an entity after it is loaded
/// - declaring extra outgoing edges (lineage, usage)
pub trait KindHandler<E>: Send + Sync {
    /// Called after references are resolved and the FQN is computed.
    fn prepare(&self, entity: &mut E) -> Result<(), String> {
        let _ = entity;
        Ok(())
    }

    /// Called before any write. Return `Err(message)` to reject the mutation.
    fn validate(&self, entity: &E) -> Result<(), String> {
        let _ = entity;
        Ok(())
    }

    /// Called after an entity is read and its relations are rebuilt.
    fn on_after_load(&self, entity: &mut E) {
        let _ = entity;
    }

    /// Extra outgoing edges stored alongside owner and container.
    fn relationships(&self, entity: &E) -> Vec<RelatedEntity> {
        let _ = entity;
        Vec::new()
    }
}

/// Handler with every hook left at its default.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHandler;

impl<E> KindHandler<E> for DefaultHandler {}
