//! Directed, typed edges between entities.
//!
//! An edge `(from_id, to_id, relation)` is unique; writing it twice is a
//! no-op. Owner and container are stored only here, never in the body of
//! the entity they point at.

use crate::db::StoreTx;
use crate::entity_store::parse_id;
use crate::error::{StorageError, StorageResult};
use catalog_model::{EntityReference, Relationship};
use catalog_types::EntityId;
use rusqlite::params;

/// One stored edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub from_id: EntityId,
    pub from_type: String,
    pub to_id: EntityId,
    pub to_type: String,
    pub relation: Relationship,
}

impl StoreTx<'_> {
    /// Writes an edge. Existing identical edges are left untouched.
    pub fn add_edge(
        &self,
        from_id: EntityId,
        from_type: &str,
        to_id: EntityId,
        to_type: &str,
        relation: Relationship,
    ) -> StorageResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO entity_relationship (from_id, from_type, to_id, to_type, relation)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                from_id.to_string(),
                from_type,
                to_id.to_string(),
                to_type,
                relation.as_str()
            ],
        )?;
        Ok(())
    }

    /// The entity containing `entity_id`, if any.
    pub fn find_container(&self, entity_id: EntityId) -> StorageResult<Option<EntityReference>> {
        self.find_single_source(entity_id, Relationship::Contains)
    }

    /// The owner of `entity_id`, if any.
    pub fn find_owner(&self, entity_id: EntityId) -> StorageResult<Option<EntityReference>> {
        self.find_single_source(entity_id, Relationship::Owns)
    }

    /// Resolves the one entity pointing at `entity_id` through `relation`.
    ///
    /// More than one source is a [`StorageError::Consistency`] error; a
    /// source whose row is missing is a [`StorageError::DanglingReference`].
    fn find_single_source(
        &self,
        entity_id: EntityId,
        relation: Relationship,
    ) -> StorageResult<Option<EntityReference>> {
        let sources = self.edges_to(entity_id, relation)?;
        let edge = match sources.as_slice() {
            [] => return Ok(None),
            [edge] => edge,
            _ => {
                return Err(StorageError::Consistency(format!(
                    "{entity_id} has {} incoming {relation} edges",
                    sources.len()
                )));
            }
        };
        self.entity_reference(edge.from_id)?
            .map(Some)
            .ok_or_else(|| StorageError::DanglingReference {
                from: edge.from_id,
                to: entity_id,
                relation: relation.to_string(),
            })
    }

    /// Edges of one relation pointing at `to_id`.
    pub fn edges_to(&self, to_id: EntityId, relation: Relationship) -> StorageResult<Vec<Edge>> {
        self.query_edges(
            "SELECT from_id, from_type, to_id, to_type, relation FROM entity_relationship
             WHERE to_id = ?1 AND relation = ?2 ORDER BY from_id",
            to_id,
            relation,
        )
    }

    /// Outgoing edges of one relation, i.e. the children of `from_id`.
    pub fn find_children(&self, from_id: EntityId, relation: Relationship) -> StorageResult<Vec<Edge>> {
        self.query_edges(
            "SELECT from_id, from_type, to_id, to_type, relation FROM entity_relationship
             WHERE from_id = ?1 AND relation = ?2 ORDER BY to_id",
            from_id,
            relation,
        )
    }

    fn query_edges(&self, sql: &str, id: EntityId, relation: Relationship) -> StorageResult<Vec<Edge>> {
        let mut stmt = self.conn.prepare(sql)?;
        let raws = stmt
            .query_map(params![id.to_string(), relation.as_str()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        raws.into_iter()
            .map(|(from_id, from_type, to_id, to_type, relation)| {
                Ok(Edge {
                    from_id: parse_id(&from_id)?,
                    from_type,
                    to_id: parse_id(&to_id)?,
                    to_type,
                    relation: relation
                        .parse()
                        .map_err(|e| StorageError::InvalidData(format!("{e}")))?,
                })
            })
            .collect()
    }

    /// Removes every `relation` edge pointing at `to_id`.
    pub fn delete_edges_to(&self, to_id: EntityId, relation: Relationship) -> StorageResult<usize> {
        Ok(self.conn.execute(
            "DELETE FROM entity_relationship WHERE to_id = ?1 AND relation = ?2",
            params![to_id.to_string(), relation.as_str()],
        )?)
    }

    /// Removes every `relation` edge leaving `from_id`.
    pub fn delete_edges_from(&self, from_id: EntityId, relation: Relationship) -> StorageResult<usize> {
        Ok(self.conn.execute(
            "DELETE FROM entity_relationship WHERE from_id = ?1 AND relation = ?2",
            params![from_id.to_string(), relation.as_str()],
        )?)
    }

    /// Removes every edge touching `entity_id` in either direction.
    pub fn delete_edges_for(&self, entity_id: EntityId) -> StorageResult<usize> {
        let id = entity_id.to_string();
        Ok(self.conn.execute(
            "DELETE FROM entity_relationship WHERE from_id = ?1 OR to_id = ?1",
            params![id],
        )?)
    }
}
