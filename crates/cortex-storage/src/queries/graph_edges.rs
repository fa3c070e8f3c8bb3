use chrono::{DateTime, Utc};
use cortex_core::models::{
    AttributionEdge, CreationEdge, DerivationEdge, DerivationType, NodeType, ScoreType,
    StatementAttributionEdge,
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

// ── CreationEdge ────────────────────────────────────────────────────────

pub fn insert_creation_edge(conn: &Connection, edge: &CreationEdge) -> CortexResult<()> {
    let metadata_json = serde_json::to_string(&edge.metadata)?;
    conn.execute(
        "INSERT INTO creation_edges (id, source_id, target_id, created_at, metadata) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            edge.id.to_string(),
            edge.source_id.to_string(),
            edge.target_id.to_string(),
            edge.created_at.to_rfc3339(),
            metadata_json,
        ],
    )
    .map_err(map_sqlite)?;
    Ok(())
}

// ── AttributionEdge ─────────────────────────────────────────────────────

fn score_type_str(t: ScoreType) -> &'static str {
    match t {
        ScoreType::Eas => "eas",
        ScoreType::Contextcite => "contextcite",
        ScoreType::Calibrated => "calibrated",
    }
}

fn parse_score_type(s: &str) -> ScoreType {
    match s {
        "contextcite" => ScoreType::Contextcite,
        "calibrated" => ScoreType::Calibrated,
        _ => ScoreType::Eas,
    }
}

fn row_to_attribution_edge(row: &Row<'_>) -> rusqlite::Result<AttributionEdge> {
    let id: String = row.get("id")?;
    let created_at: String = row.get("created_at")?;
    let source_id: String = row.get("source_id")?;
    let target_id: String = row.get("target_id")?;
    let score_type: String = row.get("score_type")?;
    let is_current: i64 = row.get("is_current")?;
    let metadata: String = row.get("metadata")?;
    Ok(AttributionEdge {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        created_at: parse_dt(&created_at),
        source_id: Uuid::parse_str(&source_id).unwrap_or_default(),
        target_id: Uuid::parse_str(&target_id).unwrap_or_default(),
        score: row.get("score")?,
        score_type: parse_score_type(&score_type),
        version: row.get("version")?,
        is_current: is_current != 0,
        metadata: serde_json::from_str(&metadata).unwrap_or_default(),
    })
}

pub fn insert_attribution_edge(conn: &Connection, edge: &AttributionEdge) -> CortexResult<()> {
    let metadata_json = serde_json::to_string(&edge.metadata)?;
    conn.execute(
        "INSERT INTO attribution_edges (id, created_at, source_id, target_id, score, score_type, version, is_current, metadata)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            edge.id.to_string(),
            edge.created_at.to_rfc3339(),
            edge.source_id.to_string(),
            edge.target_id.to_string(),
            edge.score,
            score_type_str(edge.score_type),
            edge.version,
            edge.is_current as i64,
            metadata_json,
        ],
    )
    .map_err(map_sqlite)?;
    Ok(())
}

/// Current version number for `(source_id, target_id)`, if any (§4.D.5 step 1).
pub fn current_version(conn: &Connection, source_id: Uuid, target_id: Uuid) -> CortexResult<Option<i64>> {
    conn.query_row(
        "SELECT version FROM attribution_edges WHERE source_id = ?1 AND target_id = ?2 AND is_current = 1",
        params![source_id.to_string(), target_id.to_string()],
        |row| row.get(0),
    )
    .optional()
    .map_err(map_sqlite)
}

/// Flips `is_current` to false on the current row for `(source_id, target_id)`,
/// if one exists (§4.D.5 step 2).
pub fn supersede_current(conn: &Connection, source_id: Uuid, target_id: Uuid) -> CortexResult<()> {
    conn.execute(
        "UPDATE attribution_edges SET is_current = 0 WHERE source_id = ?1 AND target_id = ?2 AND is_current = 1",
        params![source_id.to_string(), target_id.to_string()],
    )
    .map_err(map_sqlite)?;
    Ok(())
}

pub fn attribution_edge_history(
    conn: &Connection,
    source_id: Uuid,
    target_id: Uuid,
) -> CortexResult<Vec<AttributionEdge>> {
    let mut stmt = conn
        .prepare(
            "SELECT * FROM attribution_edges WHERE source_id = ?1 AND target_id = ?2 ORDER BY version ASC",
        )
        .map_err(map_sqlite)?;
    let rows = stmt
        .query_map(params![source_id.to_string(), target_id.to_string()], row_to_attribution_edge)
        .map_err(map_sqlite)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(map_sqlite)?);
    }
    Ok(out)
}

// ── DerivationEdge ──────────────────────────────────────────────────────

fn node_type_str(t: NodeType) -> &'static str {
    match t {
        NodeType::Memory => "memory",
        NodeType::Summary => "summary",
        NodeType::Embedding => "embedding",
    }
}

fn derivation_type_str(t: DerivationType) -> &'static str {
    match t {
        DerivationType::Consolidation => "consolidation",
        DerivationType::Embedding => "embedding",
        DerivationType::ReEmbedding => "re_embedding",
        DerivationType::Summary => "summary",
    }
}

pub fn insert_derivation_edge(conn: &Connection, edge: &DerivationEdge) -> CortexResult<()> {
    let metadata_json = serde_json::to_string(&edge.metadata)?;
    conn.execute(
        "INSERT INTO derivation_edges (id, source_id, source_type, target_id, target_type, derivation_type, created_at, metadata)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            edge.id.to_string(),
            edge.source.id().to_string(),
            node_type_str(edge.source.node_type()),
            edge.target.id().to_string(),
            node_type_str(edge.target.node_type()),
            derivation_type_str(edge.derivation_type),
            edge.created_at.to_rfc3339(),
            metadata_json,
        ],
    )
    .map_err(map_sqlite)?;
    Ok(())
}

// ── StatementAttributionEdge ────────────────────────────────────────────

pub fn insert_statement_attribution_edge(conn: &Connection, edge: &StatementAttributionEdge) -> CortexResult<()> {
    conn.execute(
        "INSERT INTO statement_attribution_edges (id, memory_id, response_id, statement_index, score, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            edge.id.to_string(),
            edge.memory_id.to_string(),
            edge.response_id.to_string(),
            edge.statement_index,
            edge.score,
            edge.created_at.to_rfc3339(),
        ],
    )
    .map_err(map_sqlite)?;
    Ok(())
}
