use cortex_core::CortexResult;
use rusqlite::Connection;

use crate::map_sqlite;

/// Flat transactional model (§3.1) plus the peripheral records of §6.
pub fn migrate(conn: &Connection) -> CortexResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE memories (
            id TEXT PRIMARY KEY,
            content TEXT NOT NULL,
            embedding TEXT,
            tokens INTEGER NOT NULL DEFAULT 0,
            agent_id TEXT NOT NULL DEFAULT 'default',
            tier TEXT NOT NULL DEFAULT 'warm',
            criticality REAL NOT NULL DEFAULT 0.5,
            metadata TEXT NOT NULL DEFAULT '{}',
            retrieval_count INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            last_accessed TEXT,
            deleted_at TEXT
        );
        CREATE INDEX idx_memories_agent_id ON memories(agent_id);
        CREATE INDEX idx_memories_deleted_at ON memories(deleted_at);

        CREATE TABLE transactions (
            id TEXT PRIMARY KEY,
            query_text TEXT NOT NULL,
            query_embedding TEXT,
            response_text TEXT,
            response_embedding TEXT,
            retrieved_memory_ids TEXT NOT NULL DEFAULT '[]',
            agent_id TEXT NOT NULL DEFAULT 'default',
            input_tokens INTEGER NOT NULL DEFAULT 0,
            output_tokens INTEGER NOT NULL DEFAULT 0,
            model TEXT NOT NULL DEFAULT 'unknown',
            status TEXT NOT NULL DEFAULT 'completed',
            created_at TEXT NOT NULL
        );
        CREATE INDEX idx_transactions_agent_id ON transactions(agent_id);
        CREATE INDEX idx_transactions_status ON transactions(status);

        CREATE TABLE attribution_scores (
            id TEXT PRIMARY KEY,
            memory_id TEXT NOT NULL,
            transaction_id TEXT NOT NULL,
            score REAL NOT NULL,
            raw_score REAL NOT NULL,
            method TEXT NOT NULL DEFAULT 'eas',
            confidence REAL NOT NULL DEFAULT 1.0,
            compute_time_ms REAL NOT NULL DEFAULT 0.0
        );
        CREATE INDEX idx_attribution_scores_memory_id ON attribution_scores(memory_id);
        CREATE INDEX idx_attribution_scores_transaction_id ON attribution_scores(transaction_id);

        CREATE TABLE memory_profiles (
            memory_id TEXT PRIMARY KEY,
            mean_attribution REAL NOT NULL DEFAULT 0.0,
            m2 REAL NOT NULL DEFAULT 0.0,
            retrieval_count INTEGER NOT NULL DEFAULT 0,
            total_attribution REAL NOT NULL DEFAULT 0.0,
            trend TEXT NOT NULL DEFAULT 'stable',
            updated_at TEXT NOT NULL
        );

        -- (EAS, exact) calibration pairs (§6, original_source db/tables.py).
        -- Never read by the core; recorded only.
        CREATE TABLE calibration_pairs (
            id TEXT PRIMARY KEY,
            memory_id TEXT NOT NULL,
            transaction_id TEXT NOT NULL,
            eas_score REAL NOT NULL,
            exact_score REAL NOT NULL,
            method TEXT NOT NULL DEFAULT 'contextcite',
            created_at TEXT NOT NULL
        );
        CREATE INDEX idx_calibration_pairs_memory_id ON calibration_pairs(memory_id);

        CREATE TABLE agent_cost_configs (
            agent_id TEXT PRIMARY KEY,
            input_token_cost REAL NOT NULL,
            output_token_cost REAL NOT NULL,
            provider TEXT,
            model_id TEXT,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE contradictions (
            id TEXT PRIMARY KEY,
            memory_id_1 TEXT NOT NULL,
            memory_id_2 TEXT NOT NULL,
            contradiction_type TEXT NOT NULL DEFAULT 'logical',
            confidence REAL NOT NULL DEFAULT 0.0,
            detected_at TEXT NOT NULL,
            resolved INTEGER NOT NULL DEFAULT 0
        );
        CREATE INDEX idx_contradictions_memory_id_1 ON contradictions(memory_id_1);
        CREATE INDEX idx_contradictions_memory_id_2 ON contradictions(memory_id_2);

        CREATE TABLE health_snapshots (
            id TEXT PRIMARY KEY,
            agent_id TEXT NOT NULL,
            contradiction_rate REAL NOT NULL DEFAULT 0.0,
            retrieval_efficiency REAL NOT NULL DEFAULT 0.0,
            semantic_drift REAL NOT NULL DEFAULT 0.0,
            memory_quality REAL NOT NULL DEFAULT 0.0,
            timestamp TEXT NOT NULL
        );
        CREATE INDEX idx_health_snapshots_agent_id ON health_snapshots(agent_id);
        ",
    )
    .map_err(map_sqlite)
}
