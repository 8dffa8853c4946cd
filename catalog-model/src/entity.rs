use crate::{EntityReference, TagLabel};
use catalog_types::{ChangeDescription, EntityId, EntityVersion};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Fields shared by every record kind.
///
/// Kinds embed the header with `#[serde(flatten)]` so it shares the JSON
/// object with the kind's own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityHeader {
    /// Stable identifier. A candidate without one gets a fresh id.
    #[serde(default)]
    pub id: EntityId,
    pub name: String,
    /// Derived from the container's FQN and `name` on every store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fully_qualified_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Relationship-derived; never persisted inline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<EntityReference>,
    /// Relationship-derived; never persisted inline.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TagLabel>,
    #[serde(default)]
    pub version: EntityVersion,
    #[serde(default)]
    pub updated_by: String,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub updated_at: i64,
    /// Derived; never persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_description: Option<ChangeDescription>,
    #[serde(default)]
    pub deleted: bool,
}

impl EntityHeader {
    /// Creates a header for a new candidate with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            name: name.into(),
            fully_qualified_name: None,
            display_name: None,
            description: None,
            owner: None,
            tags: Vec::new(),
            version: EntityVersion::INITIAL,
            updated_by: String::new(),
            updated_at: 0,
            href: None,
            change_description: None,
            deleted: false,
        }
    }

    /// Sets the owner reference.
    pub fn with_owner(mut self, owner: EntityReference) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a tag.
    pub fn with_tag(mut self, tag: TagLabel) -> Self {
        self.tags.push(tag);
        self
    }
}

/// Relationship-derived fields removed from an entity before its body is
/// serialized for storage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetachedRelations {
    pub owner: Option<EntityReference>,
    pub container: Option<EntityReference>,
    pub tags: Vec<TagLabel>,
    pub href: Option<String>,
}

/// A record kind managed by the generic repository.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Entity type name used for edges, references and storage rows.
    const ENTITY_TYPE: &'static str;

    fn header(&self) -> &EntityHeader;

    fn header_mut(&mut self) -> &mut EntityHeader;

    /// The entity that contains this one, if the kind has a container.
    fn container(&self) -> Option<&EntityReference> {
        None
    }

    fn set_container(&mut self, container: Option<EntityReference>) {
        let _ = container;
    }

    fn id(&self) -> EntityId {
        self.header().id
    }

    fn name(&self) -> &str {
        &self.header().name
    }

    fn fully_qualified_name(&self) -> Option<&str> {
        self.header().fully_qualified_name.as_deref()
    }

    fn version(&self) -> EntityVersion {
        self.header().version
    }

    fn owner(&self) -> Option<&EntityReference> {
        self.header().owner.as_ref()
    }

    /// A reference pointing at this entity.
    fn to_reference(&self) -> EntityReference {
        let header = self.header();
        EntityReference {
            id: header.id,
            entity_type: Self::ENTITY_TYPE.to_string(),
            name: Some(header.name.clone()),
            fully_qualified_name: header.fully_qualified_name.clone(),
            display_name: header.display_name.clone(),
            deleted: Some(header.deleted),
            href: None,
        }
    }

    /// Removes every relationship-derived field and returns them.
    fn detach_relations(&mut self) -> DetachedRelations {
        let container = self.container().cloned();
        self.set_container(None);
        let header = self.header_mut();
        DetachedRelations {
            owner: header.owner.take(),
            container,
            tags: std::mem::take(&mut header.tags),
            href: header.href.take(),
        }
    }

    /// Puts back fields removed by [`Entity::detach_relations`].
    fn reattach_relations(&mut self, relations: DetachedRelations) {
        self.set_container(relations.container);
        let header = self.header_mut();
        header.owner = relations.owner;
        header.tags = relations.tags;
        header.href = relations.href;
    }
}

/// Visibility of soft-deleted entities in reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Include {
    #[default]
    NonDeleted,
    Deleted,
    All,
}

impl Include {
    /// Whether an entity with the given deleted flag is visible.
    pub fn admits(&self, deleted: bool) -> bool {
        match self {
            Include::NonDeleted => !deleted,
            Include::Deleted => deleted,
            Include::All => true,
        }
    }
}
