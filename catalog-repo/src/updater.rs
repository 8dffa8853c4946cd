//! Field-by-field comparison of an original entity and its replacement.

use crate::error::RepoResult;
use crate::ledger::ChangeRecorder;
use catalog_model::{Entity, FieldSpec, OnUnset};
use catalog_types::Operation;
use serde_json::Value;

/// Compares the header fields every kind shares plus the kind's declared
/// fields, carrying preserved values onto `updated` as it goes.
pub struct EntityUpdater<'a, E: Entity> {
    original: &'a E,
    updated: &'a mut E,
    operation: Operation,
    recorder: ChangeRecorder,
}

impl<'a, E: Entity> EntityUpdater<'a, E> {
    pub fn new(original: &'a E, updated: &'a mut E, operation: Operation) -> Self {
        Self {
            original,
            updated,
            operation,
            recorder: ChangeRecorder::new(),
        }
    }

    /// Runs the comparison and returns the recorded changes.
    pub fn compare(mut self, fields: &[FieldSpec<E>]) -> RepoResult<ChangeRecorder> {
        self.update_description()?;
        self.update_display_name()?;
        self.update_owner()?;
        self.update_tags()?;
        for field in fields {
            self.update_field(field)?;
        }
        Ok(self.recorder)
    }

    fn preserves(&self, on_unset: OnUnset) -> bool {
        match on_unset {
            OnUnset::Record => false,
            OnUnset::Preserve => true,
            OnUnset::PreserveOnPut => self.operation.is_put(),
        }
    }

    fn update_description(&mut self) -> RepoResult<()> {
        let old = to_value(&self.original.header().description)?;
        let new = to_value(&self.updated.header().description)?;
        if new.is_none() && old.is_some() && self.preserves(OnUnset::PreserveOnPut) {
            self.updated.header_mut().description = self.original.header().description.clone();
            return Ok(());
        }
        self.recorder.record_change("description", old, new);
        Ok(())
    }

    fn update_display_name(&mut self) -> RepoResult<()> {
        let old = to_value(&self.original.header().display_name)?;
        let new = to_value(&self.updated.header().display_name)?;
        if new.is_none() && old.is_some() && self.preserves(OnUnset::PreserveOnPut) {
            self.updated.header_mut().display_name = self.original.header().display_name.clone();
            return Ok(());
        }
        self.recorder.record_change("displayName", old, new);
        Ok(())
    }

    /// Owners are the same when they point at the same id; the rest of the
    /// reference is presentation.
    fn update_owner(&mut self) -> RepoResult<()> {
        let original = self.original.owner().cloned();
        let updated = self.updated.owner().cloned();
        match (&original, &updated) {
            (Some(_), None) if self.preserves(OnUnset::PreserveOnPut) => {
                self.updated.header_mut().owner = original.clone();
            }
            (Some(a), Some(b)) if a.id == b.id => {}
            _ => {
                let old = to_value(&original)?;
                let new = to_value(&updated)?;
                self.recorder.record_change("owner", old, new);
            }
        }
        Ok(())
    }

    fn update_tags(&mut self) -> RepoResult<()> {
        let original = &self.original.header().tags;
        if self.updated.header().tags.is_empty()
            && !original.is_empty()
            && self.preserves(OnUnset::PreserveOnPut)
        {
            self.updated.header_mut().tags = original.clone();
            return Ok(());
        }
        let old = (!original.is_empty())
            .then(|| serde_json::to_value(original))
            .transpose()?;
        let new_tags = &self.updated.header().tags;
        let new = (!new_tags.is_empty())
            .then(|| serde_json::to_value(new_tags))
            .transpose()?;
        self.recorder.record_change("tags", old, new);
        Ok(())
    }

    fn update_field(&mut self, field: &FieldSpec<E>) -> RepoResult<()> {
        let old = field.extract(self.original)?;
        let new = field.extract(self.updated)?;
        if new.is_none()
            && old.is_some()
            && self.preserves(field.on_unset())
            && field.carry_over(self.original, self.updated)
        {
            return Ok(());
        }
        self.recorder.record_change(field.name(), old, new);
        Ok(())
    }
}

fn to_value<T: serde::Serialize>(value: &Option<T>) -> RepoResult<Option<Value>> {
    Ok(value.as_ref().map(serde_json::to_value).transpose()?)
}
