use chrono::{DateTime, Utc};
use cortex_core::models::{AgentCostConfig, CalibrationPair, Contradiction, HealthSnapshot};
use cortex_core::CortexResult;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::map_sqlite;

fn parse_dt(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

pub fn insert_calibration_pair(conn: &Connection, pair: &CalibrationPair) -> CortexResult<()> {
    conn.execute(
        "INSERT INTO calibration_pairs (id, memory_id, transaction_id, eas_score, exact_score, method, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            pair.id.to_string(),
            pair.memory_id.to_string(),
            pair.transaction_id.to_string(),
            pair.eas_score,
            pair.exact_score,
            pair.method,
            pair.created_at.to_rfc3339(),
        ],
    )
    .map_err(map_sqlite)?;
    Ok(())
}

/// Cost config lookup with fallback to the global default (§4.C.2 step 5).
pub fn get_agent_cost_config(conn: &Connection, agent_id: &str) -> CortexResult<Option<AgentCostConfig>> {
    conn.query_row(
        "SELECT * FROM agent_cost_configs WHERE agent_id = ?1",
        params![agent_id],
        |row| {
            let updated_at: String = row.get("updated_at")?;
            Ok(AgentCostConfig {
                agent_id: row.get("agent_id")?,
                input_token_cost: row.get("input_token_cost")?,
                output_token_cost: row.get("output_token_cost")?,
                provider: row.get("provider")?,
                model_id: row.get("model_id")?,
                updated_at: parse_dt(&updated_at),
            })
        },
    )
    .optional()
    .map_err(map_sqlite)
}

pub fn upsert_agent_cost_config(conn: &Connection, config: &AgentCostConfig) -> CortexResult<()> {
    conn.execute(
        "INSERT INTO agent_cost_configs (agent_id, input_token_cost, output_token_cost, provider, model_id, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(agent_id) DO UPDATE SET
            input_token_cost = excluded.input_token_cost,
            output_token_cost = excluded.output_token_cost,
            provider = excluded.provider,
            model_id = excluded.model_id,
            updated_at = excluded.updated_at",
        params![
            config.agent_id,
            config.input_token_cost,
            config.output_token_cost,
            config.provider,
            config.model_id,
            config.updated_at.to_rfc3339(),
        ],
    )
    .map_err(map_sqlite)?;
    Ok(())
}

pub fn insert_contradiction(conn: &Connection, c: &Contradiction) -> CortexResult<()> {
    conn.execute(
        "INSERT INTO contradictions (id, memory_id_1, memory_id_2, contradiction_type, confidence, detected_at, resolved)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            c.id.to_string(),
            c.memory_id_1.to_string(),
            c.memory_id_2.to_string(),
            c.contradiction_type,
            c.confidence,
            c.detected_at.to_rfc3339(),
            c.resolved as i64,
        ],
    )
    .map_err(map_sqlite)?;
    Ok(())
}

pub fn list_contradictions(conn: &Connection, resolved: Option<bool>, limit: i64) -> CortexResult<Vec<Contradiction>> {
    let sql = match resolved {
        Some(_) => "SELECT * FROM contradictions WHERE resolved = ?1 ORDER BY detected_at DESC LIMIT ?2",
        None => "SELECT * FROM contradictions ORDER BY detected_at DESC LIMIT ?2",
    };
    let mut stmt = conn.prepare(sql).map_err(map_sqlite)?;
    let row_fn = |row: &rusqlite::Row<'_>| {
        let id: String = row.get("id")?;
        let memory_id_1: String = row.get("memory_id_1")?;
        let memory_id_2: String = row.get("memory_id_2")?;
        let detected_at: String = row.get("detected_at")?;
        let resolved: i64 = row.get("resolved")?;
        Ok(Contradiction {
            id: Uuid::parse_str(&id).unwrap_or_default(),
            memory_id_1: Uuid::parse_str(&memory_id_1).unwrap_or_default(),
            memory_id_2: Uuid::parse_str(&memory_id_2).unwrap_or_default(),
            contradiction_type: row.get("contradiction_type")?,
            confidence: row.get("confidence")?,
            detected_at: parse_dt(&detected_at),
            resolved: resolved != 0,
        })
    };

    let rows = match resolved {
        Some(r) => stmt.query_map(params![r as i64, limit], row_fn).map_err(map_sqlite)?,
        None => stmt.query_map(params![limit], row_fn).map_err(map_sqlite)?,
    };
    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(map_sqlite)?);
    }
    Ok(out)
}

pub fn insert_health_snapshot(conn: &Connection, h: &HealthSnapshot) -> CortexResult<()> {
    conn.execute(
        "INSERT INTO health_snapshots (id, agent_id, contradiction_rate, retrieval_efficiency, semantic_drift, memory_quality, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            h.id.to_string(),
            h.agent_id,
            h.contradiction_rate,
            h.retrieval_efficiency,
            h.semantic_drift,
            h.memory_quality,
            h.timestamp.to_rfc3339(),
        ],
    )
    .map_err(map_sqlite)?;
    Ok(())
}

pub fn list_health_snapshots(conn: &Connection, agent_id: &str, limit: i64) -> CortexResult<Vec<HealthSnapshot>> {
    let mut stmt = conn
        .prepare("SELECT * FROM health_snapshots WHERE agent_id = ?1 ORDER BY timestamp DESC LIMIT ?2")
        .map_err(map_sqlite)?;
    let rows = stmt
        .query_map(params![agent_id, limit], |row| {
            let id: String = row.get("id")?;
            let timestamp: String = row.get("timestamp")?;
            Ok(HealthSnapshot {
                id: Uuid::parse_str(&id).unwrap_or_default(),
                agent_id: row.get("agent_id")?,
                contradiction_rate: row.get("contradiction_rate")?,
                retrieval_efficiency: row.get("retrieval_efficiency")?,
                semantic_drift: row.get("semantic_drift")?,
                memory_quality: row.get("memory_quality")?,
                timestamp: parse_dt(&timestamp),
            })
        })
        .map_err(map_sqlite)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(map_sqlite)?);
    }
    Ok(out)
}
