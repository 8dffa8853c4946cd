//! Entity rows: the serialized body plus the columns needed for lookup.

use crate::db::StoreTx;
use crate::error::{is_constraint_violation, StorageError, StorageResult};
use catalog_model::{EntityReference, Include, Relationship};
use catalog_types::{EntityId, EntityVersion};
use rusqlite::{params, OptionalExtension, Row};

/// One stored entity.
///
/// `body` is the opaque JSON of the entity with every relationship-derived
/// field stripped. The other columns duplicate header fields so rows can be
/// found without parsing the body.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRow {
    pub id: EntityId,
    pub entity_type: String,
    pub fqn: String,
    pub name: String,
    pub version: EntityVersion,
    pub deleted: bool,
    pub updated_at: i64,
    pub body: Vec<u8>,
}

/// Filter for [`StoreTx::list_entities`].
#[derive(Debug, Clone)]
pub struct ListQuery<'a> {
    pub entity_type: &'a str,
    /// Only rows whose FQN sorts after this cursor.
    pub after: Option<&'a str>,
    pub limit: usize,
    pub include: Include,
    /// Only rows contained by this entity.
    pub container: Option<EntityId>,
}

const ENTITY_COLUMNS: &str = "id, entity_type, fqn, name, version, deleted, updated_at, json";

struct RawRow {
    id: String,
    entity_type: String,
    fqn: String,
    name: String,
    version: f64,
    deleted: bool,
    updated_at: i64,
    body: Vec<u8>,
}

fn read_raw(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        id: row.get(0)?,
        entity_type: row.get(1)?,
        fqn: row.get(2)?,
        name: row.get(3)?,
        version: row.get(4)?,
        deleted: row.get(5)?,
        updated_at: row.get(6)?,
        body: row.get(7)?,
    })
}

impl TryFrom<RawRow> for EntityRow {
    type Error = StorageError;

    fn try_from(raw: RawRow) -> StorageResult<Self> {
        Ok(Self {
            id: parse_id(&raw.id)?,
            entity_type: raw.entity_type,
            fqn: raw.fqn,
            name: raw.name,
            version: EntityVersion::new(raw.version)
                .map_err(|e| StorageError::InvalidData(e.to_string()))?,
            deleted: raw.deleted,
            updated_at: raw.updated_at,
            body: raw.body,
        })
    }
}

pub(crate) fn parse_id(s: &str) -> StorageResult<EntityId> {
    EntityId::parse(s).map_err(|e| StorageError::InvalidData(format!("invalid entity id {s}: {e}")))
}

impl StoreTx<'_> {
    /// Loads an entity row by id, regardless of its deleted flag.
    pub fn get_entity(&self, id: EntityId) -> StorageResult<Option<EntityRow>> {
        let raw = self
            .conn
            .query_row(
                &format!("SELECT {ENTITY_COLUMNS} FROM entities WHERE id = ?1"),
                params![id.to_string()],
                read_raw,
            )
            .optional()?;
        raw.map(EntityRow::try_from).transpose()
    }

    /// Loads an entity row by type and fully qualified name.
    pub fn get_entity_by_fqn(&self, entity_type: &str, fqn: &str) -> StorageResult<Option<EntityRow>> {
        let raw = self
            .conn
            .query_row(
                &format!("SELECT {ENTITY_COLUMNS} FROM entities WHERE entity_type = ?1 AND fqn = ?2"),
                params![entity_type, fqn],
                read_raw,
            )
            .optional()?;
        raw.map(EntityRow::try_from).transpose()
    }

    /// Returns the raw stored body of an entity.
    pub fn get_body(&self, id: EntityId) -> StorageResult<Option<Vec<u8>>> {
        Ok(self
            .conn
            .query_row(
                "SELECT json FROM entities WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Lists entity rows of one type ordered by fully qualified name.
    pub fn list_entities(&self, query: &ListQuery<'_>) -> StorageResult<Vec<EntityRow>> {
        let deleted_clause = match query.include {
            Include::NonDeleted => " AND deleted = 0",
            Include::Deleted => " AND deleted = 1",
            Include::All => "",
        };
        let sql = format!(
            "SELECT {ENTITY_COLUMNS} FROM entities
             WHERE entity_type = ?1
               AND (?2 IS NULL OR fqn > ?2)
               AND (?3 IS NULL OR id IN (
                    SELECT to_id FROM entity_relationship WHERE from_id = ?3 AND relation = ?4))
               {deleted_clause}
             ORDER BY fqn
             LIMIT ?5"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let raws = stmt
            .query_map(
                params![
                    query.entity_type,
                    query.after,
                    query.container.map(|id| id.to_string()),
                    Relationship::Contains.as_str(),
                    i64::try_from(query.limit).unwrap_or(i64::MAX),
                ],
                read_raw,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        raws.into_iter().map(EntityRow::try_from).collect()
    }

    /// Inserts a new entity row.
    ///
    /// Fails with [`StorageError::AlreadyExists`] when the id or the
    /// `(entity_type, fqn)` pair is taken.
    pub fn insert_entity(&self, row: &EntityRow) -> StorageResult<()> {
        self.conn
            .execute(
                "INSERT INTO entities (id, entity_type, fqn, name, version, deleted, updated_at, json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    row.id.to_string(),
                    row.entity_type,
                    row.fqn,
                    row.name,
                    row.version.value(),
                    row.deleted,
                    row.updated_at,
                    row.body,
                ],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    StorageError::AlreadyExists(format!("{} {}", row.entity_type, row.fqn))
                } else {
                    e.into()
                }
            })?;
        Ok(())
    }

    /// Overwrites an entity row if its stored version still equals `expected`.
    ///
    /// Zero affected rows means another writer advanced the version first
    /// ([`StorageError::VersionConflict`]) or the row is gone
    /// ([`StorageError::NotFound`]).
    pub fn update_entity(&self, row: &EntityRow, expected: EntityVersion) -> StorageResult<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE entities
                 SET fqn = ?1, name = ?2, version = ?3, deleted = ?4, updated_at = ?5, json = ?6
                 WHERE id = ?7 AND version = ?8",
                params![
                    row.fqn,
                    row.name,
                    row.version.value(),
                    row.deleted,
                    row.updated_at,
                    row.body,
                    row.id.to_string(),
                    expected.value(),
                ],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    StorageError::AlreadyExists(format!("{} {}", row.entity_type, row.fqn))
                } else {
                    e.into()
                }
            })?;
        if changed == 0 {
            return match self.get_entity(row.id)? {
                Some(_) => Err(StorageError::VersionConflict {
                    id: row.id,
                    expected,
                }),
                None => Err(StorageError::NotFound(row.id.to_string())),
            };
        }
        Ok(())
    }

    /// Removes an entity row. Returns false if there was none.
    pub fn delete_entity(&self, id: EntityId) -> StorageResult<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM entities WHERE id = ?1", params![id.to_string()])?;
        Ok(removed > 0)
    }

    /// Builds a canonical reference to a stored entity.
    pub fn entity_reference(&self, id: EntityId) -> StorageResult<Option<EntityReference>> {
        let Some(row) = self.get_entity(id)? else {
            return Ok(None);
        };
        let display_name = serde_json::from_slice::<serde_json::Value>(&row.body)?
            .get("displayName")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        Ok(Some(EntityReference {
            id: row.id,
            entity_type: row.entity_type,
            name: Some(row.name),
            fully_qualified_name: Some(row.fqn),
            display_name,
            deleted: Some(row.deleted),
            href: None,
        }))
    }
}
