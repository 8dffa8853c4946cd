use catalog_types::EntityId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A pointer to another entity.
///
/// Incoming references may be loose: only `id` is required and
/// `entity_type` is a hint (empty when the caller did not supply one).
/// References produced by the repository are canonical and carry the
/// target's type, name and fully qualified name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityReference {
    pub id: EntityId,
    #[serde(rename = "type", default)]
    pub entity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fully_qualified_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl EntityReference {
    /// A loose reference with a type hint.
    pub fn new(id: EntityId, entity_type: impl Into<String>) -> Self {
        Self {
            id,
            entity_type: entity_type.into(),
            name: None,
            fully_qualified_name: None,
            display_name: None,
            deleted: None,
            href: None,
        }
    }

    /// A loose reference without a type hint.
    pub fn untyped(id: EntityId) -> Self {
        Self::new(id, "")
    }

    /// Returns true if the reference carries a type hint.
    pub fn has_type(&self) -> bool {
        !self.entity_type.is_empty()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_fully_qualified_name(mut self, fqn: impl Into<String>) -> Self {
        self.fully_qualified_name = Some(fqn.into());
        self
    }
}

impl fmt::Display for EntityReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_type() {
            write!(f, "{}:{}", self.entity_type, self.id)
        } else {
            write!(f, "{}", self.id)
        }
    }
}
