//! SQLite storage layer for the catalog engine.
//!
//! Provides persistent storage for typed entities using SQLite via rusqlite.
//!
//! # Architecture
//!
//! - Entities are stored as opaque JSON bodies next to the columns needed
//!   for lookup (type, FQN, version, deleted flag)
//! - Owner and container live only in the relationship graph
//! - Every stored version is appended to an immutable history table
//! - Tag usage is kept in its own table keyed by the tagged entity
//!
//! A mutation runs inside [`CatalogDb::transaction`]; everything written
//! through the [`StoreTx`] commits together or not at all.

mod db;
mod entity_store;
mod error;
mod relationship_store;
mod tag_store;
mod version_store;

pub use db::{CatalogDb, StoreTx};
pub use entity_store::{EntityRow, ListQuery};
pub use error::{StorageError, StorageResult};
pub use relationship_store::Edge;
pub use version_store::VersionRow;
