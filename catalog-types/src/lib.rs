//! Core type definitions for the catalog engine.
//!
//! This crate defines the kind-agnostic value types every other crate
//! builds on:
//! - Entity identifiers (UUID v7)
//! - Entity version numbers with minor/major steps
//! - Field-level change records grouped per version transition
//!
//! Record schemas (pipelines, services, users) belong in their own crates,
//! not here.

mod change;
mod ids;
mod version;

pub use change::{ChangeDescription, FieldChange, Operation};
pub use ids::EntityId;
pub use version::{EntityVersion, VersionStep};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid version: {0}")]
    InvalidVersion(f64),
}
