//! Tag usage rows, keyed by the tagged entity.

use crate::db::StoreTx;
use crate::error::StorageResult;
use catalog_model::TagLabel;
use catalog_types::EntityId;
use rusqlite::params;

impl StoreTx<'_> {
    /// Applies a tag to an entity, replacing an existing label with the same FQN.
    pub fn apply_tag(&self, target_id: EntityId, label: &TagLabel) -> StorageResult<()> {
        let json = serde_json::to_string(label)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO tag_usage (target_id, tag_fqn, label) VALUES (?1, ?2, ?3)",
            params![target_id.to_string(), label.tag_fqn, json],
        )?;
        Ok(())
    }

    /// Tags applied to an entity, ordered by tag FQN.
    pub fn tags_of(&self, target_id: EntityId) -> StorageResult<Vec<TagLabel>> {
        let mut stmt = self
            .conn
            .prepare("SELECT label FROM tag_usage WHERE target_id = ?1 ORDER BY tag_fqn")?;
        let labels = stmt
            .query_map(params![target_id.to_string()], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        labels
            .iter()
            .map(|json| serde_json::from_str::<TagLabel>(json).map_err(Into::into))
            .collect()
    }

    /// Removes every tag applied to an entity.
    pub fn delete_tags(&self, target_id: EntityId) -> StorageResult<usize> {
        Ok(self.conn.execute(
            "DELETE FROM tag_usage WHERE target_id = ?1",
            params![target_id.to_string()],
        )?)
    }
}
