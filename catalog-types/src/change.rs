//! Field-level change records.
//!
//! A [`ChangeDescription`] captures every field that differed between two
//! consecutive versions of one entity. Descriptions are immutable once a
//! version is committed; the history of an entity is the ordered list of
//! its versions, each carrying the description that produced it.

use crate::EntityVersion;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single field-level difference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    /// Name of the field as it appears in the entity body.
    pub name: String,
    /// Serialized value before the change. Absent for added fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    /// Serialized value after the change. Absent for deleted fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

impl FieldChange {
    /// Creates a change record.
    pub fn new(name: impl Into<String>, old_value: Option<Value>, new_value: Option<Value>) -> Self {
        Self {
            name: name.into(),
            old_value,
            new_value,
        }
    }
}

/// The set of field changes associated with one version transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeDescription {
    /// Fields that had no value before.
    #[serde(default)]
    pub fields_added: Vec<FieldChange>,
    /// Fields whose value changed.
    #[serde(default)]
    pub fields_updated: Vec<FieldChange>,
    /// Fields that no longer have a value.
    #[serde(default)]
    pub fields_deleted: Vec<FieldChange>,
    /// Version the entity had before this transition.
    pub previous_version: EntityVersion,
}

impl ChangeDescription {
    /// Creates an empty description for a transition away from `previous_version`.
    #[must_use]
    pub fn new(previous_version: EntityVersion) -> Self {
        Self {
            fields_added: Vec::new(),
            fields_updated: Vec::new(),
            fields_deleted: Vec::new(),
            previous_version,
        }
    }

    /// Returns true if no field changed.
    pub fn is_empty(&self) -> bool {
        self.fields_added.is_empty() && self.fields_updated.is_empty() && self.fields_deleted.is_empty()
    }

    /// Total number of change records.
    pub fn len(&self) -> usize {
        self.fields_added.len() + self.fields_updated.len() + self.fields_deleted.len()
    }

    /// Iterates over all change records (added, updated, deleted order).
    pub fn changes(&self) -> impl Iterator<Item = &FieldChange> {
        self.fields_added
            .iter()
            .chain(self.fields_updated.iter())
            .chain(self.fields_deleted.iter())
    }

    /// Names of all changed fields.
    pub fn field_names(&self) -> Vec<&str> {
        self.changes().map(|c| c.name.as_str()).collect()
    }

    /// Returns the change record for `name`, if the field changed.
    pub fn field(&self, name: &str) -> Option<&FieldChange> {
        self.changes().find(|c| c.name == name)
    }
}

/// The kind of mutation being applied to an existing entity.
///
/// Some fields treat an absent incoming value differently depending on
/// whether the caller replaced the whole entity (`Put`) or edited it
/// in place (`Patch`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Full replacement (create-or-update).
    Put,
    /// In-place edit of a fetched entity.
    Patch,
}

impl Operation {
    /// Returns true for full replacements.
    pub fn is_put(&self) -> bool {
        matches!(self, Operation::Put)
    }

    /// Returns true for in-place edits.
    pub fn is_patch(&self) -> bool {
        matches!(self, Operation::Patch)
    }
}
