use cortex_core::CortexResult;
use rusqlite::Connection;

use crate::map_sqlite;

/// Graph model (§3.2) plus compliance certificates. Partitioning hints from
/// §6 (16 hash partitions on `shard_id`, monthly range partitions on
/// `attribution_edges.created_at`) are declarative only: SQLite has no
/// native partitioning, so `shard_id` and `created_at` are plain indexed
/// columns instead, per the adapter's tolerance for an implementation that
/// ignores the hints (§4.A).
pub fn migrate(conn: &Connection) -> CortexResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE interaction_nodes (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            query TEXT NOT NULL,
            response TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            agent_id TEXT NOT NULL,
            transaction_cost REAL NOT NULL DEFAULT 0.0,
            metadata TEXT NOT NULL DEFAULT '{}'
        );
        CREATE INDEX idx_interaction_nodes_user_id ON interaction_nodes(user_id);

        CREATE TABLE memory_nodes (
            id TEXT NOT NULL,
            content TEXT NOT NULL,
            memory_type TEXT NOT NULL DEFAULT 'raw',
            status TEXT NOT NULL DEFAULT 'active',
            shard_id INTEGER NOT NULL,
            slice_id INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            created_by_user_id TEXT NOT NULL,
            token_count INTEGER NOT NULL DEFAULT 0,
            criticality TEXT NOT NULL DEFAULT 'normal',
            metadata TEXT NOT NULL DEFAULT '{}',
            deletion_scheduled_at TEXT,
            PRIMARY KEY (id, shard_id)
        );
        CREATE INDEX idx_memory_nodes_shard_id ON memory_nodes(shard_id);
        CREATE INDEX idx_memory_nodes_created_by_user_id ON memory_nodes(created_by_user_id);

        CREATE TABLE summary_nodes (
            id TEXT PRIMARY KEY,
            content TEXT NOT NULL,
            source_memory_count INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            method TEXT NOT NULL DEFAULT 'llm_consolidation',
            metadata TEXT NOT NULL DEFAULT '{}'
        );

        CREATE TABLE embedding_nodes (
            id TEXT PRIMARY KEY,
            vector_ref TEXT NOT NULL,
            model_version TEXT NOT NULL,
            dimensions INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            metadata TEXT NOT NULL DEFAULT '{}'
        );

        CREATE TABLE response_nodes (
            id TEXT PRIMARY KEY,
            interaction_id TEXT NOT NULL REFERENCES interaction_nodes(id),
            statements TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL
        );

        CREATE TABLE creation_edges (
            id TEXT PRIMARY KEY,
            source_id TEXT NOT NULL REFERENCES interaction_nodes(id),
            target_id TEXT NOT NULL,
            created_at TEXT NOT NULL,
            metadata TEXT NOT NULL DEFAULT '{}'
        );
        CREATE INDEX idx_creation_edges_source_id ON creation_edges(source_id);
        CREATE INDEX idx_creation_edges_target_id ON creation_edges(target_id);

        -- Append-only and versioned (§3.2 invariants): rows are never
        -- mutated except flipping is_current TRUE -> FALSE exactly once.
        CREATE TABLE attribution_edges (
            id TEXT NOT NULL,
            created_at TEXT NOT NULL,
            source_id TEXT NOT NULL,
            target_id TEXT NOT NULL,
            score REAL NOT NULL,
            score_type TEXT NOT NULL DEFAULT 'eas',
            version INTEGER NOT NULL,
            is_current INTEGER NOT NULL DEFAULT 1,
            metadata TEXT NOT NULL DEFAULT '{}',
            PRIMARY KEY (id, created_at)
        );
        CREATE INDEX idx_attribution_edges_target_current
            ON attribution_edges(target_id) WHERE is_current = 1;
        CREATE INDEX idx_attribution_edges_source_current
            ON attribution_edges(source_id) WHERE is_current = 1;
        CREATE INDEX idx_attribution_edges_pair
            ON attribution_edges(source_id, target_id);

        -- Polymorphic, no FK constraint: validated by the write path (§9).
        CREATE TABLE derivation_edges (
            id TEXT PRIMARY KEY,
            source_id TEXT NOT NULL,
            source_type TEXT NOT NULL,
            target_id TEXT NOT NULL,
            target_type TEXT NOT NULL,
            derivation_type TEXT NOT NULL,
            created_at TEXT NOT NULL,
            metadata TEXT NOT NULL DEFAULT '{}'
        );
        CREATE INDEX idx_derivation_edges_source_id ON derivation_edges(source_id);
        CREATE INDEX idx_derivation_edges_target_id ON derivation_edges(target_id);

        CREATE TABLE statement_attribution_edges (
            id TEXT PRIMARY KEY,
            memory_id TEXT NOT NULL,
            response_id TEXT NOT NULL REFERENCES response_nodes(id),
            statement_index INTEGER NOT NULL,
            score REAL NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE INDEX idx_statement_attribution_edges_memory_id ON statement_attribution_edges(memory_id);
        CREATE INDEX idx_statement_attribution_edges_response_id ON statement_attribution_edges(response_id);

        CREATE TABLE compliance_certificates (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            request_type TEXT NOT NULL,
            footprint_snapshot TEXT NOT NULL,
            nodes_deleted INTEGER NOT NULL DEFAULT 0,
            edges_affected INTEGER NOT NULL DEFAULT 0,
            deletion_timestamp TEXT NOT NULL,
            grace_period_end TEXT,
            hard_deleted_at TEXT,
            verified INTEGER NOT NULL DEFAULT 0,
            verified_at TEXT,
            certificate_hash TEXT NOT NULL,
            metadata TEXT NOT NULL DEFAULT '{}'
        );
        CREATE INDEX idx_compliance_certificates_user_id ON compliance_certificates(user_id);
        ",
    )
    .map_err(map_sqlite)
}
