mod v001_flat_model;
mod v002_provenance_graph;

use cortex_core::CortexResult;
use rusqlite::Connection;

use crate::map_sqlite;

pub const LATEST_VERSION: u32 = 2;

type MigrationFn = fn(&Connection) -> CortexResult<()>;

const MIGRATIONS: [(u32, &str, MigrationFn); 2] = [
    (1, "flat_model", v001_flat_model::migrate),
    (2, "provenance_graph", v002_provenance_graph::migrate),
];

fn schema_table_exists(conn: &Connection) -> CortexResult<bool> {
    let exists: bool = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )
        .map_err(map_sqlite)?;
    Ok(exists)
}

fn current_version(conn: &Connection) -> CortexResult<u32> {
    if !schema_table_exists(conn)? {
        return Ok(0);
    }
    conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |row| row.get(0))
        .map_err(map_sqlite)
}

pub fn run_migrations(conn: &Connection) -> CortexResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .map_err(map_sqlite)?;

    let current = current_version(conn)?;
    tracing::debug!(current, latest = LATEST_VERSION, "checking migrations");

    for (version, name, migrate) in MIGRATIONS.iter() {
        if *version <= current {
            continue;
        }
        tracing::info!(version, name, "applying migration");
        conn.execute_batch("BEGIN IMMEDIATE").map_err(map_sqlite)?;
        match migrate(conn) {
            Ok(()) => {
                conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])
                    .map_err(map_sqlite)?;
                conn.execute_batch("COMMIT").map_err(map_sqlite)?;
            }
            Err(e) => {
                conn.execute_batch("ROLLBACK").ok();
                tracing::warn!(version, error = %e, "migration failed");
                return Err(e);
            }
        }
    }

    Ok(())
}
