use cortex_core::CortexResult;
use rusqlite::Connection;

use crate::map_sqlite;

/// Opens a connection with the pragmas the adapter relies on: foreign keys
/// for referential checks the write path doesn't enforce itself, and WAL so
/// concurrent completions against overlapping memories (§5) don't serialize
/// on file locks more than necessary.
pub fn open_connection(database_url: &str) -> CortexResult<Connection> {
    let conn = if database_url == ":memory:" {
        Connection::open_in_memory()
    } else {
        Connection::open(database_url)
    }
    .map_err(map_sqlite)?;

    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA journal_mode = WAL;
         PRAGMA busy_timeout = 5000;",
    )
    .map_err(map_sqlite)?;

    Ok(conn)
}
