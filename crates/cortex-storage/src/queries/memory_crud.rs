use chrono::{DateTime, Utc};
use cortex_core::models::{Memory, Tier};
use cortex_core::CortexResult;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::map_sqlite;

fn tier_str(tier: Tier) -> &'static str {
    match tier {
        Tier::Hot => "hot",
        Tier::Warm => "warm",
        Tier::Cold => "cold",
    }
}

fn parse_tier(s: &str) -> Tier {
    match s {
        "hot" => Tier::Hot,
        "cold" => Tier::Cold,
        _ => Tier::Warm,
    }
}

fn parse_dt(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn row_to_memory(row: &Row<'_>) -> rusqlite::Result<Memory> {
    let id: String = row.get("id")?;
    let embedding: Option<String> = row.get("embedding")?;
    let metadata: String = row.get("metadata")?;
    let created_at: String = row.get("created_at")?;
    let last_accessed: Option<String> = row.get("last_accessed")?;
    let deleted_at: Option<String> = row.get("deleted_at")?;
    let tier: String = row.get("tier")?;

    Ok(Memory {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        content: row.get("content")?,
        embedding: embedding.and_then(|s| serde_json::from_str(&s).ok()),
        tokens: row.get("tokens")?,
        agent_id: row.get("agent_id")?,
        tier: parse_tier(&tier),
        criticality: row.get("criticality")?,
        metadata: serde_json::from_str(&metadata).unwrap_or_default(),
        retrieval_count: row.get("retrieval_count")?,
        created_at: parse_dt(&created_at),
        last_accessed: last_accessed.map(|s| parse_dt(&s)),
        deleted_at: deleted_at.map(|s| parse_dt(&s)),
    })
}

pub fn insert_memory(conn: &Connection, memory: &Memory) -> CortexResult<()> {
    let embedding_json = memory
        .embedding
        .as_ref()
        .map(|e| serde_json::to_string(e))
        .transpose()?;
    let metadata_json = serde_json::to_string(&memory.metadata)?;

    conn.execute(
        "INSERT INTO memories (id, content, embedding, tokens, agent_id, tier, criticality,
            metadata, retrieval_count, created_at, last_accessed, deleted_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            memory.id.to_string(),
            memory.content,
            embedding_json,
            memory.tokens,
            memory.agent_id,
            tier_str(memory.tier),
            memory.criticality,
            metadata_json,
            memory.retrieval_count,
            memory.created_at.to_rfc3339(),
            memory.last_accessed.map(|d| d.to_rfc3339()),
            memory.deleted_at.map(|d| d.to_rfc3339()),
        ],
    )
    .map_err(map_sqlite)?;
    Ok(())
}

pub fn get_memory(conn: &Connection, id: Uuid) -> CortexResult<Option<Memory>> {
    conn.query_row("SELECT * FROM memories WHERE id = ?1", params![id.to_string()], row_to_memory)
        .optional()
        .map_err(map_sqlite)
}

/// Fetches memories by id, `ORDER BY id ASC` (§4.C.4 step 1 — positional
/// determinism between the two-phase and single-shot paths). When
/// `snapshot` is false, soft-deleted rows are excluded; when true, the
/// initiate-time set is honored regardless of deletions in the interim.
pub fn fetch_memories_for_eas(conn: &Connection, ids: &[Uuid], snapshot: bool) -> CortexResult<Vec<Memory>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
    let sql = if snapshot {
        format!("SELECT * FROM memories WHERE id IN ({placeholders}) ORDER BY id ASC")
    } else {
        format!("SELECT * FROM memories WHERE id IN ({placeholders}) AND deleted_at IS NULL ORDER BY id ASC")
    };

    let mut stmt = conn.prepare(&sql).map_err(map_sqlite)?;
    let id_strings: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    let rows = stmt
        .query_map(rusqlite::params_from_iter(id_strings.iter()), row_to_memory)
        .map_err(map_sqlite)?;

    let mut memories = Vec::new();
    for row in rows {
        memories.push(row.map_err(map_sqlite)?);
    }
    Ok(memories)
}

pub fn soft_delete_memory(conn: &Connection, id: Uuid) -> CortexResult<bool> {
    let affected = conn
        .execute(
            "UPDATE memories SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
            params![Utc::now().to_rfc3339(), id.to_string()],
        )
        .map_err(map_sqlite)?;
    Ok(affected > 0)
}

/// Bumps `retrieval_count` and `last_accessed` (§4.C.4 step 7).
pub fn touch_memory(conn: &Connection, id: Uuid, at: DateTime<Utc>) -> CortexResult<()> {
    conn.execute(
        "UPDATE memories SET retrieval_count = retrieval_count + 1, last_accessed = ?1 WHERE id = ?2",
        params![at.to_rfc3339(), id.to_string()],
    )
    .map_err(map_sqlite)?;
    Ok(())
}

pub fn list_memories(
    conn: &Connection,
    agent_id: Option<&str>,
    tier: Option<Tier>,
    offset: i64,
    limit: i64,
) -> CortexResult<Vec<Memory>> {
    let mut sql = "SELECT * FROM memories WHERE deleted_at IS NULL".to_string();
    let mut bind_agent: Option<String> = None;
    let mut bind_tier: Option<&'static str> = None;

    if let Some(a) = agent_id {
        sql.push_str(" AND agent_id = ?");
        bind_agent = Some(a.to_string());
    }
    if let Some(t) = tier {
        sql.push_str(" AND tier = ?");
        bind_tier = Some(tier_str(t));
    }
    sql.push_str(" ORDER BY created_at DESC LIMIT ? OFFSET ?");

    let mut stmt = conn.prepare(&sql).map_err(map_sqlite)?;
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
    if let Some(a) = bind_agent {
        params.push(Box::new(a));
    }
    if let Some(t) = bind_tier {
        params.push(Box::new(t));
    }
    params.push(Box::new(limit));
    params.push(Box::new(offset));

    let rows = stmt
        .query_map(rusqlite::params_from_iter(params.iter()), row_to_memory)
        .map_err(map_sqlite)?;

    let mut memories = Vec::new();
    for row in rows {
        memories.push(row.map_err(map_sqlite)?);
    }
    Ok(memories)
}
