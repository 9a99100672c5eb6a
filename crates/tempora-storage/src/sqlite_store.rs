//! A `KeyValueStore` backed by one SQLite table holding JSON values.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use tempora_core::errors::StoreError;
use tempora_core::traits::KeyValueStore;

use crate::connection::Database;
use crate::sqlite_err;

pub struct SqliteStore<V> {
    name: String,
    table: String,
    db: Arc<Database>,
    closed: AtomicBool,
    _value: PhantomData<fn() -> V>,
}

/// `kv_` plus the store name with every character outside `[A-Za-z0-9_]` replaced.
fn table_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    format!("kv_{sanitized}")
}

impl<V> SqliteStore<V>
where
    V: Serialize + DeserializeOwned,
{
    /// Open the store `name` in `db`, creating its table if needed.
    pub fn open(db: Arc<Database>, name: impl Into<String>) -> Result<Self, StoreError> {
        let name = name.into();
        let table = table_name(&name);
        db.with_conn(&name, |conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    key TEXT PRIMARY KEY NOT NULL,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );"
            ))
            .map_err(|e| sqlite_err(&name, e))
        })?;
        debug!(store = %name, table = %table, "sqlite store opened");
        Ok(Self {
            name,
            table,
            db,
            closed: AtomicBool::new(false),
            _value: PhantomData,
        })
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed {
                store: self.name.clone(),
            });
        }
        Ok(())
    }

    fn decode(&self, json: &str) -> Result<V, StoreError> {
        serde_json::from_str(json).map_err(|e| StoreError::Serialization {
            store: self.name.clone(),
            message: e.to_string(),
        })
    }

    /// Number of stored keys.
    pub fn len(&self) -> Result<usize, StoreError> {
        self.ensure_open()?;
        self.db.with_conn(&self.name, |conn| {
            let count: i64 = conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", self.table), [], |row| {
                    row.get(0)
                })
                .map_err(|e| sqlite_err(&self.name, e))?;
            Ok(count as usize)
        })
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl<V> KeyValueStore<V> for SqliteStore<V>
where
    V: Serialize + DeserializeOwned,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Result<Option<V>, StoreError> {
        self.ensure_open()?;
        let json: Option<String> = self.db.with_conn(&self.name, |conn| {
            conn.query_row(
                &format!("SELECT value FROM {} WHERE key = ?1", self.table),
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| sqlite_err(&self.name, e))
        })?;
        json.map(|j| self.decode(&j)).transpose()
    }

    fn put(&self, key: &str, value: &V) -> Result<(), StoreError> {
        self.ensure_open()?;
        let json = serde_json::to_string(value).map_err(|e| StoreError::Serialization {
            store: self.name.clone(),
            message: e.to_string(),
        })?;
        self.db.with_conn(&self.name, |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO {} (key, value, updated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                                    updated_at = excluded.updated_at",
                    self.table
                ),
                params![key, json, Utc::now().to_rfc3339()],
            )
            .map_err(|e| sqlite_err(&self.name, e))?;
            Ok(())
        })
    }

    fn contains_key(&self, key: &str) -> Result<bool, StoreError> {
        self.ensure_open()?;
        self.db.with_conn(&self.name, |conn| {
            conn.query_row(
                &format!("SELECT 1 FROM {} WHERE key = ?1", self.table),
                params![key],
                |_| Ok(()),
            )
            .optional()
            .map(|found| found.is_some())
            .map_err(|e| sqlite_err(&self.name, e))
        })
    }

    fn key_set(&self) -> Result<Vec<String>, StoreError> {
        self.ensure_open()?;
        self.db.with_conn(&self.name, |conn| {
            let mut stmt = conn
                .prepare(&format!("SELECT key FROM {} ORDER BY key", self.table))
                .map_err(|e| sqlite_err(&self.name, e))?;
            let rows = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(|e| sqlite_err(&self.name, e))?;
            let keys = rows
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| sqlite_err(&self.name, e))?;
            Ok(keys)
        })
    }

    fn remove(&self, key: &str) -> Result<Option<V>, StoreError> {
        self.ensure_open()?;
        let json: Option<String> = self.db.with_conn(&self.name, |conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| sqlite_err(&self.name, e))?;
            let json: Option<String> = tx
                .query_row(
                    &format!("SELECT value FROM {} WHERE key = ?1", self.table),
                    params![key],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| sqlite_err(&self.name, e))?;
            tx.execute(
                &format!("DELETE FROM {} WHERE key = ?1", self.table),
                params![key],
            )
            .map_err(|e| sqlite_err(&self.name, e))?;
            tx.commit().map_err(|e| sqlite_err(&self.name, e))?;
            Ok(json)
        })?;
        json.map(|j| self.decode(&j)).transpose()
    }

    fn shutdown(&self) -> Result<(), StoreError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(StoreError::Closed {
                store: self.name.clone(),
            });
        }
        if self.db.path().is_some() {
            self.db.checkpoint()?;
        }
        debug!(store = %self.name, "sqlite store shut down");
        Ok(())
    }
}

impl<V> std::fmt::Debug for SqliteStore<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("name", &self.name)
            .field("table", &self.table)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_names_are_sanitized() {
        assert_eq!(table_name("sessions"), "kv_sessions");
        assert_eq!(table_name("raw-props v2"), "kv_raw_props_v2");
    }
}
