//! Connection ownership and the transactional boundary.

use crate::error::{StorageError, StorageResult};
use rusqlite::{Connection, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// SQLite-backed catalog store.
///
/// All tables live in one database file so that an entity body, its edges,
/// its tags and its history entry commit together.
#[derive(Clone)]
pub struct CatalogDb {
    conn: Arc<Mutex<Connection>>,
}

/// Handle for statements issued inside one [`CatalogDb::transaction`] or
/// [`CatalogDb::read`] scope.
pub struct StoreTx<'a> {
    pub(crate) conn: &'a Connection,
}

impl CatalogDb {
    /// Opens (or creates) a catalog database at the given path.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "opened catalog database");
        Self::with_connection(conn)
    }

    /// Opens an in-memory catalog database (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StorageResult<Self> {
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS entities (
                id TEXT PRIMARY KEY,
                entity_type TEXT NOT NULL,
                fqn TEXT NOT NULL,
                name TEXT NOT NULL,
                version REAL NOT NULL,
                deleted INTEGER NOT NULL DEFAULT 0,
                updated_at INTEGER NOT NULL,
                json BLOB NOT NULL,
                UNIQUE(entity_type, fqn)
            );

            CREATE TABLE IF NOT EXISTS entity_relationship (
                from_id TEXT NOT NULL,
                from_type TEXT NOT NULL,
                to_id TEXT NOT NULL,
                to_type TEXT NOT NULL,
                relation TEXT NOT NULL,
                PRIMARY KEY (from_id, to_id, relation)
            );

            CREATE INDEX IF NOT EXISTS idx_relationship_to
                ON entity_relationship (to_id, relation);

            CREATE TABLE IF NOT EXISTS entity_versions (
                entity_id TEXT NOT NULL,
                entity_type TEXT NOT NULL,
                version REAL NOT NULL,
                json BLOB NOT NULL,
                PRIMARY KEY (entity_id, version)
            );

            CREATE TABLE IF NOT EXISTS tag_usage (
                target_id TEXT NOT NULL,
                tag_fqn TEXT NOT NULL,
                label TEXT NOT NULL,
                PRIMARY KEY (target_id, tag_fqn)
            );
            ",
        )?;
        Ok(())
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    /// Runs `f` inside an `IMMEDIATE` transaction.
    ///
    /// The transaction commits when `f` returns `Ok` and rolls back when it
    /// returns `Err`, so every statement issued through the [`StoreTx`] takes
    /// effect together or not at all.
    pub fn transaction<T, E>(&self, f: impl FnOnce(&StoreTx<'_>) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StorageError>,
    {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(StorageError::from)?;
        let result = f(&StoreTx { conn: &tx });
        match result {
            Ok(value) => {
                tx.commit().map_err(StorageError::from)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }

    /// Runs `f` against the connection without opening a transaction.
    pub fn read<T, E>(&self, f: impl FnOnce(&StoreTx<'_>) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StorageError>,
    {
        let conn = self.lock()?;
        f(&StoreTx { conn: &conn })
    }
}
