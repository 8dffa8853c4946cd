//! Turning loose incoming references into canonical ones.

use crate::error::{RepoError, RepoResult};
use catalog_model::EntityReference;
use catalog_storage::StoreTx;

/// Resolves a reference supplied by a caller.
///
/// Runs inside the mutation's transaction so the target is checked against
/// the same snapshot the mutation writes to.
pub trait ReferenceResolver: Send + Sync {
    fn resolve(&self, tx: &StoreTx<'_>, reference: &EntityReference) -> RepoResult<EntityReference>;
}

/// Resolves references against the entity table.
///
/// A reference resolves when its id exists, its type hint (if any) matches
/// the stored type and the target is not soft-deleted.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreResolver;

impl ReferenceResolver for StoreResolver {
    fn resolve(&self, tx: &StoreTx<'_>, reference: &EntityReference) -> RepoResult<EntityReference> {
        let not_found = || RepoError::ReferenceNotFound(reference.to_string());
        let resolved = tx.entity_reference(reference.id)?.ok_or_else(not_found)?;
        if reference.has_type() && resolved.entity_type != reference.entity_type {
            return Err(not_found());
        }
        if resolved.deleted == Some(true) {
            return Err(not_found());
        }
        Ok(resolved)
    }
}
