//! Append-only version history.

use crate::db::StoreTx;
use crate::error::{is_constraint_violation, StorageError, StorageResult};
use catalog_types::{EntityId, EntityVersion};
use rusqlite::{params, OptionalExtension};

/// One historic version of an entity body.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionRow {
    pub version: EntityVersion,
    pub body: Vec<u8>,
}

impl StoreTx<'_> {
    /// Appends a version to the history of `entity_id`.
    ///
    /// History is immutable: writing a version that already exists fails.
    pub fn put_version(
        &self,
        entity_id: EntityId,
        entity_type: &str,
        version: EntityVersion,
        body: &[u8],
    ) -> StorageResult<()> {
        self.conn
            .execute(
                "INSERT INTO entity_versions (entity_id, entity_type, version, json) VALUES (?1, ?2, ?3, ?4)",
                params![entity_id.to_string(), entity_type, version.value(), body],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    StorageError::Consistency(format!("version {version} of {entity_id} already recorded"))
                } else {
                    e.into()
                }
            })?;
        Ok(())
    }

    /// All versions of an entity of `entity_type`, newest first.
    pub fn list_versions(&self, entity_id: EntityId, entity_type: &str) -> StorageResult<Vec<VersionRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT version, json FROM entity_versions
             WHERE entity_id = ?1 AND entity_type = ?2 ORDER BY version DESC",
        )?;
        let raws = stmt
            .query_map(params![entity_id.to_string(), entity_type], |row| {
                Ok((row.get::<_, f64>(0)?, row.get::<_, Vec<u8>>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        raws.into_iter()
            .map(|(version, body)| {
                Ok(VersionRow {
                    version: EntityVersion::new(version)
                        .map_err(|e| StorageError::InvalidData(e.to_string()))?,
                    body,
                })
            })
            .collect()
    }

    /// The body stored for one specific version.
    pub fn get_version(
        &self,
        entity_id: EntityId,
        entity_type: &str,
        version: EntityVersion,
    ) -> StorageResult<Option<Vec<u8>>> {
        Ok(self
            .conn
            .query_row(
                "SELECT json FROM entity_versions WHERE entity_id = ?1 AND entity_type = ?2 AND version = ?3",
                params![entity_id.to_string(), entity_type, version.value()],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Drops the whole history of an entity.
    pub fn delete_versions(&self, entity_id: EntityId) -> StorageResult<usize> {
        Ok(self.conn.execute(
            "DELETE FROM entity_versions WHERE entity_id = ?1",
            params![entity_id.to_string()],
        )?)
    }
}
