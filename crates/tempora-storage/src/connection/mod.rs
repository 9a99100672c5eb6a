//! The shared SQLite connection behind every `SqliteStore` of a bundle.

pub mod pragmas;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::debug;

use tempora_core::errors::StoreError;

use self::pragmas::apply_pragmas;
use crate::sqlite_err;

/// One serialized connection. Stores share it through an `Arc`.
pub struct Database {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl Database {
    /// Open (or create) the database at `path` and apply pragmas.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Open {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        apply_pragmas(&conn)?;
        debug!(path = %path.display(), "store database opened");
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Open {
            path: ":memory:".to_string(),
            message: e.to_string(),
        })?;
        apply_pragmas(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Run `f` with the connection held.
    pub fn with_conn<F, T>(&self, store: &str, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let guard = self.conn.lock().map_err(|_| StoreError::Poisoned {
            store: store.to_string(),
        })?;
        f(&guard)
    }

    /// Truncating WAL checkpoint.
    pub fn checkpoint(&self) -> Result<(), StoreError> {
        self.with_conn("checkpoint", |conn| {
            conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
                .map_err(|e| sqlite_err("checkpoint", e))
        })
    }

    /// `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("path", &self.path).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pragmas::verify_wal_mode;

    #[test]
    fn file_database_runs_in_wal_mode() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("wal.db")).unwrap();
        let wal = db.with_conn("test", verify_wal_mode).unwrap();
        assert!(wal);
        db.checkpoint().unwrap();
    }

    #[test]
    fn in_memory_database_has_no_path() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.path().is_none());
        assert!(!db.with_conn("test", verify_wal_mode).unwrap());
    }
}
