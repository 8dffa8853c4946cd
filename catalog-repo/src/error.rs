//! Error types for repository operations.

use catalog_storage::StorageError;
use thiserror::Error;

/// Result type for repository operations.
pub type RepoResult<T> = Result<T, RepoError>;

/// Errors returned by [`EntityRepository`](crate::EntityRepository).
///
/// Every variant aborts the mutation before commit.
#[derive(Debug, Error)]
pub enum RepoError {
    /// The entity does not exist or is not visible.
    #[error("entity not found: {0}")]
    NotFound(String),

    /// A reference points at an entity that does not exist, is deleted or
    /// has a different type than hinted.
    #[error("referenced entity not found: {0}")]
    ReferenceNotFound(String),

    /// The stored version differs from the one the caller based the write on.
    #[error("version conflict: {0}")]
    Conflict(String),

    /// An entity with the same id or fully qualified name exists.
    #[error("entity already exists: {0}")]
    AlreadyExists(String),

    /// The candidate was rejected by a kind rule or an immutability check.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Stored relationships violate an invariant.
    #[error("consistency error: {0}")]
    Consistency(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(StorageError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StorageError> for RepoError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => RepoError::NotFound(what),
            StorageError::AlreadyExists(what) => RepoError::AlreadyExists(what),
            StorageError::VersionConflict { id, expected } => {
                RepoError::Conflict(format!("{id} is no longer at version {expected}"))
            }
            err @ (StorageError::DanglingReference { .. } | StorageError::Consistency(_)) => {
                RepoError::Consistency(err.to_string())
            }
            StorageError::Serialization(e) => RepoError::Serialization(e),
            other => RepoError::Storage(other),
        }
    }
}
