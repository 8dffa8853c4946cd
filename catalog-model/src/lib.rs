//! Entity model for the catalog engine.
//!
//! Defines the types every record kind shares and the declarative table a
//! kind supplies to the generic repository:
//! - [`Entity`]: trait implemented by each record kind, exposing its [`EntityHeader`]
//! - [`EntityReference`]: canonical pointer to another entity
//! - [`Relationship`]: kind of a directed edge between two entities
//! - [`TagLabel`]: classification attached to an entity
//! - [`KindSpec`]: per-kind capabilities: containment, change fields, hooks
//! - [`KindHandler`]: optional strategy for kind-specific prepare/validate logic
//!
//! Owner, container and tags are relationship-derived. They live on the
//! in-memory entity but are never part of its persisted body.

mod entity;
pub mod fqn;
mod handler;
mod kind;
mod reference;
mod relationship;
mod tag;

pub use entity::{DetachedRelations, Entity, EntityHeader, Include};
pub use handler::{DefaultHandler, KindHandler, RelatedEntity};
pub use kind::{Containment, FieldSpec, HookPolicy, KindSpec, OnUnset, UndeployOn};
pub use reference::EntityReference;
pub use relationship::{ParseRelationshipError, Relationship};
pub use tag::{LabelType, TagLabel, TagSource, TagState};

/// Entity type of user owners.
pub const USER: &str = "user";
/// Entity type of team owners.
pub const TEAM: &str = "team";
/// Entity types allowed as owners.
pub const OWNER_TYPES: &[&str] = &[USER, TEAM];
