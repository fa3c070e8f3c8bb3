use chrono::{DateTime, Utc};
use cortex_core::models::{
    EmbeddingNode, InteractionNode, MemoryCriticality, MemoryNode, MemoryStatus, MemoryType,
    ResponseNode, Statement, SummaryNode,
};
use cortex_core::CortexResult;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::map_sqlite;

fn parse_dt(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

// ── InteractionNode ────────────────────────────────────────────────────

fn row_to_interaction(row: &Row<'_>) -> rusqlite::Result<InteractionNode> {
    let id: String = row.get("id")?;
    let timestamp: String = row.get("timestamp")?;
    let metadata: String = row.get("metadata")?;
    Ok(InteractionNode {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        user_id: row.get("user_id")?,
        query: row.get("query")?,
        response: row.get("response")?,
        timestamp: parse_dt(&timestamp),
        agent_id: row.get("agent_id")?,
        transaction_cost: row.get("transaction_cost")?,
        metadata: serde_json::from_str(&metadata).unwrap_or_default(),
    })
}

pub fn insert_interaction(conn: &Connection, node: &InteractionNode) -> CortexResult<()> {
    let metadata_json = serde_json::to_string(&node.metadata)?;
    conn.execute(
        "INSERT INTO interaction_nodes (id, user_id, query, response, timestamp, agent_id, transaction_cost, metadata)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            node.id.to_string(),
            node.user_id,
            node.query,
            node.response,
            node.timestamp.to_rfc3339(),
            node.agent_id,
            node.transaction_cost,
            metadata_json,
        ],
    )
    .map_err(map_sqlite)?;
    Ok(())
}

pub fn get_interaction(conn: &Connection, id: Uuid) -> CortexResult<Option<InteractionNode>> {
    conn.query_row(
        "SELECT * FROM interaction_nodes WHERE id = ?1",
        params![id.to_string()],
        row_to_interaction,
    )
    .optional()
    .map_err(map_sqlite)
}

pub fn interactions_for_user(conn: &Connection, user_id: &str) -> CortexResult<Vec<Uuid>> {
    let mut stmt = conn
        .prepare("SELECT id FROM interaction_nodes WHERE user_id = ?1")
        .map_err(map_sqlite)?;
    let rows = stmt
        .query_map(params![user_id], |row| row.get::<_, String>(0))
        .map_err(map_sqlite)?;
    let mut out = Vec::new();
    for row in rows {
        let s = row.map_err(map_sqlite)?;
        out.push(Uuid::parse_str(&s).map_err(|e| crate::to_storage_err(e.to_string()))?);
    }
    Ok(out)
}

// ── MemoryNode ──────────────────────────────────────────────────────────

fn memory_type_str(t: MemoryType) -> &'static str {
    match t {
        MemoryType::Raw => "raw",
        MemoryType::Consolidated => "consolidated",
        MemoryType::Critical => "critical",
    }
}

fn parse_memory_type(s: &str) -> MemoryType {
    match s {
        "consolidated" => MemoryType::Consolidated,
        "critical" => MemoryType::Critical,
        _ => MemoryType::Raw,
    }
}

fn memory_status_str(s: MemoryStatus) -> &'static str {
    match s {
        MemoryStatus::Active => "active",
        MemoryStatus::Archived => "archived",
        MemoryStatus::PendingDeletion => "pending_deletion",
        MemoryStatus::Deleted => "deleted",
    }
}

fn parse_memory_status(s: &str) -> MemoryStatus {
    match s {
        "archived" => MemoryStatus::Archived,
        "pending_deletion" => MemoryStatus::PendingDeletion,
        "deleted" => MemoryStatus::Deleted,
        _ => MemoryStatus::Active,
    }
}

fn criticality_str(c: MemoryCriticality) -> &'static str {
    match c {
        MemoryCriticality::Normal => "normal",
        MemoryCriticality::SafetyCritical => "safety_critical",
        MemoryCriticality::Protected => "protected",
    }
}

fn parse_criticality(s: &str) -> MemoryCriticality {
    match s {
        "safety_critical" => MemoryCriticality::SafetyCritical,
        "protected" => MemoryCriticality::Protected,
        _ => MemoryCriticality::Normal,
    }
}

fn row_to_memory_node(row: &Row<'_>) -> rusqlite::Result<MemoryNode> {
    let id: String = row.get("id")?;
    let memory_type: String = row.get("memory_type")?;
    let status: String = row.get("status")?;
    let created_at: String = row.get("created_at")?;
    let criticality: String = row.get("criticality")?;
    let metadata: String = row.get("metadata")?;
    let deletion_scheduled_at: Option<String> = row.get("deletion_scheduled_at")?;

    Ok(MemoryNode {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        content: row.get("content")?,
        memory_type: parse_memory_type(&memory_type),
        status: parse_memory_status(&status),
        shard_id: row.get("shard_id")?,
        slice_id: row.get("slice_id")?,
        created_at: parse_dt(&created_at),
        created_by_user_id: row.get("created_by_user_id")?,
        token_count: row.get("token_count")?,
        criticality: parse_criticality(&criticality),
        metadata: serde_json::from_str(&metadata).unwrap_or_default(),
        deletion_scheduled_at: deletion_scheduled_at.map(|s| parse_dt(&s)),
    })
}

pub fn insert_memory_node(conn: &Connection, node: &MemoryNode) -> CortexResult<()> {
    let metadata_json = serde_json::to_string(&node.metadata)?;
    conn.execute(
        "INSERT INTO memory_nodes (id, content, memory_type, status, shard_id, slice_id, created_at,
            created_by_user_id, token_count, criticality, metadata, deletion_scheduled_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            node.id.to_string(),
            node.content,
            memory_type_str(node.memory_type),
            memory_status_str(node.status),
            node.shard_id,
            node.slice_id,
            node.created_at.to_rfc3339(),
            node.created_by_user_id,
            node.token_count,
            criticality_str(node.criticality),
            metadata_json,
            node.deletion_scheduled_at.map(|d| d.to_rfc3339()),
        ],
    )
    .map_err(map_sqlite)?;
    Ok(())
}

pub fn get_memory_node(conn: &Connection, id: Uuid) -> CortexResult<Option<MemoryNode>> {
    conn.query_row(
        "SELECT * FROM memory_nodes WHERE id = ?1",
        params![id.to_string()],
        row_to_memory_node,
    )
    .optional()
    .map_err(map_sqlite)
}

/// Next SISA slice id for a user: monotonically increasing, -1 if none
/// exist yet (§4.D.2).
pub fn next_slice_id(conn: &Connection, user_id: &str) -> CortexResult<i64> {
    conn.query_row(
        "SELECT COALESCE(MAX(slice_id), -1) + 1 FROM memory_nodes WHERE created_by_user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )
    .map_err(map_sqlite)
}

// ── SummaryNode ─────────────────────────────────────────────────────────

fn row_to_summary(row: &Row<'_>) -> rusqlite::Result<SummaryNode> {
    let id: String = row.get("id")?;
    let created_at: String = row.get("created_at")?;
    let metadata: String = row.get("metadata")?;
    Ok(SummaryNode {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        content: row.get("content")?,
        source_memory_count: row.get("source_memory_count")?,
        created_at: parse_dt(&created_at),
        method: row.get("method")?,
        metadata: serde_json::from_str(&metadata).unwrap_or_default(),
    })
}

pub fn insert_summary(conn: &Connection, node: &SummaryNode) -> CortexResult<()> {
    let metadata_json = serde_json::to_string(&node.metadata)?;
    conn.execute(
        "INSERT INTO summary_nodes (id, content, source_memory_count, created_at, method, metadata)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            node.id.to_string(),
            node.content,
            node.source_memory_count,
            node.created_at.to_rfc3339(),
            node.method,
            metadata_json,
        ],
    )
    .map_err(map_sqlite)?;
    Ok(())
}

pub fn get_summary(conn: &Connection, id: Uuid) -> CortexResult<Option<SummaryNode>> {
    conn.query_row("SELECT * FROM summary_nodes WHERE id = ?1", params![id.to_string()], row_to_summary)
        .optional()
        .map_err(map_sqlite)
}

// ── EmbeddingNode ───────────────────────────────────────────────────────

fn row_to_embedding(row: &Row<'_>) -> rusqlite::Result<EmbeddingNode> {
    let id: String = row.get("id")?;
    let created_at: String = row.get("created_at")?;
    let metadata: String = row.get("metadata")?;
    Ok(EmbeddingNode {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        vector_ref: row.get("vector_ref")?,
        model_version: row.get("model_version")?,
        dimensions: row.get("dimensions")?,
        created_at: parse_dt(&created_at),
        metadata: serde_json::from_str(&metadata).unwrap_or_default(),
    })
}

pub fn insert_embedding(conn: &Connection, node: &EmbeddingNode) -> CortexResult<()> {
    let metadata_json = serde_json::to_string(&node.metadata)?;
    conn.execute(
        "INSERT INTO embedding_nodes (id, vector_ref, model_version, dimensions, created_at, metadata)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            node.id.to_string(),
            node.vector_ref,
            node.model_version,
            node.dimensions,
            node.created_at.to_rfc3339(),
            metadata_json,
        ],
    )
    .map_err(map_sqlite)?;
    Ok(())
}

pub fn get_embedding(conn: &Connection, id: Uuid) -> CortexResult<Option<EmbeddingNode>> {
    conn.query_row(
        "SELECT * FROM embedding_nodes WHERE id = ?1",
        params![id.to_string()],
        row_to_embedding,
    )
    .optional()
    .map_err(map_sqlite)
}

// ── ResponseNode ────────────────────────────────────────────────────────

fn row_to_response(row: &Row<'_>) -> rusqlite::Result<ResponseNode> {
    let id: String = row.get("id")?;
    let interaction_id: String = row.get("interaction_id")?;
    let statements: String = row.get("statements")?;
    let created_at: String = row.get("created_at")?;
    let statements: Vec<Statement> = serde_json::from_str(&statements).unwrap_or_default();
    Ok(ResponseNode {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        interaction_id: Uuid::parse_str(&interaction_id).unwrap_or_default(),
        statements,
        created_at: parse_dt(&created_at),
    })
}

pub fn insert_response(conn: &Connection, node: &ResponseNode) -> CortexResult<()> {
    let statements_json = serde_json::to_string(&node.statements)?;
    conn.execute(
        "INSERT INTO response_nodes (id, interaction_id, statements, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            node.id.to_string(),
            node.interaction_id.to_string(),
            statements_json,
            node.created_at.to_rfc3339(),
        ],
    )
    .map_err(map_sqlite)?;
    Ok(())
}

pub fn get_response(conn: &Connection, id: Uuid) -> CortexResult<Option<ResponseNode>> {
    conn.query_row("SELECT * FROM response_nodes WHERE id = ?1", params![id.to_string()], row_to_response)
        .optional()
        .map_err(map_sqlite)
}
