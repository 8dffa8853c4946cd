use serde::{Deserialize, Serialize};

/// A classification label applied to an entity.
///
/// Tags are stored as usage rows keyed by the tagged entity, not inside the
/// entity body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagLabel {
    #[serde(rename = "tagFQN")]
    pub tag_fqn: String,
    #[serde(default)]
    pub source: TagSource,
    #[serde(default)]
    pub label_type: LabelType,
    #[serde(default)]
    pub state: TagState,
}

impl TagLabel {
    /// A manually applied, confirmed classification tag.
    pub fn manual(tag_fqn: impl Into<String>) -> Self {
        Self {
            tag_fqn: tag_fqn.into(),
            source: TagSource::Tag,
            label_type: LabelType::Manual,
            state: TagState::Confirmed,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagSource {
    #[default]
    Tag,
    Glossary,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelType {
    #[default]
    Manual,
    Propagated,
    Automated,
    Derived,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagState {
    Suggested,
    #[default]
    Confirmed,
}
