//! Error types for the storage layer.

use catalog_types::{EntityId, EntityVersion};
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Entity not found.
    #[error("entity not found: {0}")]
    NotFound(String),

    /// An entity with the same id or fully qualified name already exists.
    #[error("entity already exists: {0}")]
    AlreadyExists(String),

    /// The stored version no longer matches the version the write was based on.
    #[error("version conflict on {id}: expected {expected}")]
    VersionConflict { id: EntityId, expected: EntityVersion },

    /// An edge points at an entity row that no longer exists.
    #[error("dangling {relation} edge {from} -> {to}")]
    DanglingReference {
        from: EntityId,
        to: EntityId,
        relation: String,
    },

    /// Stored state violates a structural invariant.
    #[error("consistency error: {0}")]
    Consistency(String),

    /// Invalid data read back from a row.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// A previous holder of the connection lock panicked.
    #[error("connection lock poisoned")]
    Poisoned,
}

pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
