use std::sync::Mutex;

use cortex_core::CortexResult;
use rusqlite::{Connection, Transaction};

use crate::map_sqlite;
use crate::migrations;
use crate::pool::open_connection;

/// The data store adapter (§4.A): typed, transactional persistence over a
/// single SQLite connection. Bounded connection pooling (§5) is a
/// deployment concern above this crate; the adapter itself tolerates being
/// backed by one connection, consistent with its partitioning hints being
/// declarative and ignorable (§4.A).
pub struct StorageEngine {
    conn: Mutex<Connection>,
}

impl StorageEngine {
    pub fn open(database_url: &str) -> CortexResult<Self> {
        let conn = open_connection(database_url)?;
        migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> CortexResult<Self> {
        Self::open(":memory:")
    }

    /// Read-only access to the connection, for query-only callers.
    pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> CortexResult<T>) -> CortexResult<T> {
        let conn = self.conn.lock().map_err(|_| {
            crate::to_storage_err("storage connection mutex poisoned".to_string())
        })?;
        f(&conn)
    }

    /// `begin()`/`commit()`/`rollback()` collapsed into one scoped call
    /// (§4.A): the closure runs inside a transaction that commits on `Ok`
    /// and whose `Drop` rolls back on any exit path that isn't a commit,
    /// including early returns via `?` inside the closure.
    pub fn transaction<T>(&self, f: impl FnOnce(&Transaction) -> CortexResult<T>) -> CortexResult<T> {
        let mut conn = self.conn.lock().map_err(|_| {
            crate::to_storage_err("storage connection mutex poisoned".to_string())
        })?;
        let txn = conn.transaction().map_err(map_sqlite)?;
        let result = f(&txn)?;
        txn.commit().map_err(map_sqlite)?;
        Ok(result)
    }
}
