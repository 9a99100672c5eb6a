//! PRAGMA configuration applied to every store database.
//!
//! WAL mode, NORMAL sync, 64MB cache, 5s busy_timeout.

use rusqlite::Connection;

use tempora_core::errors::StoreError;

use crate::sqlite_err;

pub fn apply_pragmas(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA cache_size = -64000;
        PRAGMA busy_timeout = 5000;
        PRAGMA temp_store = MEMORY;
        ",
    )
    .map_err(|e| sqlite_err("pragmas", e))
}

/// Whether WAL mode is active. In-memory databases report `memory`.
pub fn verify_wal_mode(conn: &Connection) -> Result<bool, StoreError> {
    let mode: String = conn
        .pragma_query_value(None, "journal_mode", |row| row.get(0))
        .map_err(|e| sqlite_err("pragmas", e))?;
    Ok(mode.eq_ignore_ascii_case("wal"))
}
