//! Change accumulation and version transitions.

use crate::differ::{has_changed, normalize};
use catalog_types::{ChangeDescription, EntityVersion, FieldChange, VersionStep};
use serde_json::Value;

/// Collects field changes for one mutation.
///
/// The recorder is owned by a single update call and handed through it
/// explicitly; nothing about it is shared between mutations.
#[derive(Debug, Default)]
pub struct ChangeRecorder {
    added: Vec<FieldChange>,
    updated: Vec<FieldChange>,
    deleted: Vec<FieldChange>,
}

/// Result of [`ChangeRecorder::finalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct VersionTransition {
    pub version: EntityVersion,
    /// `None` when nothing changed.
    pub change_description: Option<ChangeDescription>,
}

impl VersionTransition {
    pub fn is_changed(&self) -> bool {
        self.change_description.is_some()
    }
}

impl ChangeRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `name` if `old` and `new` differ. Returns whether a record
    /// was added.
    pub fn record_change(&mut self, name: &str, old: Option<Value>, new: Option<Value>) -> bool {
        let old = normalize(old);
        let new = normalize(new);
        if !has_changed(old.as_ref(), new.as_ref()) {
            return false;
        }
        let bucket = match (&old, &new) {
            (None, _) => &mut self.added,
            (_, None) => &mut self.deleted,
            _ => &mut self.updated,
        };
        bucket.push(FieldChange::new(name, old, new));
        true
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    pub fn len(&self) -> usize {
        self.added.len() + self.updated.len() + self.deleted.len()
    }

    /// Names of the recorded fields (added, updated, deleted order).
    pub fn field_names(&self) -> Vec<&str> {
        self.added
            .iter()
            .chain(&self.updated)
            .chain(&self.deleted)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Decides the version that follows `original`.
    ///
    /// With at least one record the version advances by `step` and the
    /// records become a [`ChangeDescription`] pointing back at `original`.
    /// Without records the version stays put.
    pub fn finalize(self, original: EntityVersion, step: VersionStep) -> VersionTransition {
        if self.is_empty() {
            return VersionTransition {
                version: original,
                change_description: None,
            };
        }
        let mut description = ChangeDescription::new(original);
        description.fields_added = self.added;
        description.fields_updated = self.updated;
        description.fields_deleted = self.deleted;
        VersionTransition {
            version: original.advance(step),
            change_description: Some(description),
        }
    }
}
