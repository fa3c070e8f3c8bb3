use chrono::{DateTime, Utc};
use cortex_core::models::{AttributionScore, MemoryProfile, Trend};
use cortex_core::CortexResult;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::map_sqlite;

fn parse_dt(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_trend(s: &str) -> Trend {
    match s {
        "up" => Trend::Up,
        "down" => Trend::Down,
        _ => Trend::Stable,
    }
}

fn row_to_score(row: &Row<'_>) -> rusqlite::Result<AttributionScore> {
    let id: String = row.get("id")?;
    let memory_id: String = row.get("memory_id")?;
    let transaction_id: String = row.get("transaction_id")?;
    Ok(AttributionScore {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        memory_id: Uuid::parse_str(&memory_id).unwrap_or_default(),
        transaction_id: Uuid::parse_str(&transaction_id).unwrap_or_default(),
        score: row.get("score")?,
        raw_score: row.get("raw_score")?,
        method: row.get("method")?,
        confidence: row.get("confidence")?,
        compute_time_ms: row.get("compute_time_ms")?,
    })
}

pub fn insert_attribution_score(conn: &Connection, score: &AttributionScore) -> CortexResult<()> {
    conn.execute(
        "INSERT INTO attribution_scores (id, memory_id, transaction_id, score, raw_score, method, confidence, compute_time_ms)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            score.id.to_string(),
            score.memory_id.to_string(),
            score.transaction_id.to_string(),
            score.score,
            score.raw_score,
            score.method,
            score.confidence,
            score.compute_time_ms,
        ],
    )
    .map_err(map_sqlite)?;
    Ok(())
}

pub fn scores_for_transaction(conn: &Connection, transaction_id: Uuid) -> CortexResult<Vec<AttributionScore>> {
    let mut stmt = conn
        .prepare("SELECT * FROM attribution_scores WHERE transaction_id = ?1")
        .map_err(map_sqlite)?;
    let rows = stmt
        .query_map(params![transaction_id.to_string()], row_to_score)
        .map_err(map_sqlite)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(map_sqlite)?);
    }
    Ok(out)
}

pub fn scores_for_memory(conn: &Connection, memory_id: Uuid) -> CortexResult<Vec<AttributionScore>> {
    let mut stmt = conn
        .prepare("SELECT * FROM attribution_scores WHERE memory_id = ?1")
        .map_err(map_sqlite)?;
    let rows = stmt
        .query_map(params![memory_id.to_string()], row_to_score)
        .map_err(map_sqlite)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(map_sqlite)?);
    }
    Ok(out)
}

pub fn get_profile(conn: &Connection, memory_id: Uuid) -> CortexResult<Option<MemoryProfile>> {
    conn.query_row(
        "SELECT * FROM memory_profiles WHERE memory_id = ?1",
        params![memory_id.to_string()],
        |row| {
            let memory_id: String = row.get("memory_id")?;
            let updated_at: String = row.get("updated_at")?;
            let trend: String = row.get("trend")?;
            Ok(MemoryProfile {
                memory_id: Uuid::parse_str(&memory_id).unwrap_or_default(),
                mean_attribution: row.get("mean_attribution")?,
                m2: row.get("m2")?,
                retrieval_count: row.get("retrieval_count")?,
                total_attribution: row.get("total_attribution")?,
                trend: parse_trend(&trend),
                updated_at: parse_dt(&updated_at),
            })
        },
    )
    .optional()
    .map_err(map_sqlite)
}

/// Atomic Welford upsert (§4.C.4 step 6, §9): a single statement computes
/// `mean'`, `m2'`, and `trend'` from the row's prior values, so concurrent
/// completions against the same memory serialize correctly at the row
/// level (§5). `excluded.mean_attribution` carries the new observation `x`
/// into the `DO UPDATE` expressions; unqualified column names in those
/// expressions read the pre-update row, never the value another assignment
/// in this same statement just computed.
pub fn upsert_memory_profile(conn: &Connection, memory_id: Uuid, x: f64, now: DateTime<Utc>) -> CortexResult<()> {
    conn.execute(
        "INSERT INTO memory_profiles (memory_id, mean_attribution, m2, retrieval_count, total_attribution, trend, updated_at)
         VALUES (?1, ?2, 0.0, 1, ?2, 'stable', ?3)
         ON CONFLICT(memory_id) DO UPDATE SET
            mean_attribution = mean_attribution + (excluded.mean_attribution - mean_attribution) / (retrieval_count + 1),
            m2 = m2 + (excluded.mean_attribution - mean_attribution)
                    * (excluded.mean_attribution - (mean_attribution + (excluded.mean_attribution - mean_attribution) / (retrieval_count + 1))),
            total_attribution = total_attribution + excluded.mean_attribution,
            trend = CASE
                        WHEN excluded.mean_attribution > 1.1 * mean_attribution THEN 'up'
                        WHEN excluded.mean_attribution < 0.9 * mean_attribution THEN 'down'
                        ELSE 'stable'
                    END,
            retrieval_count = retrieval_count + 1,
            updated_at = excluded.updated_at",
        params![memory_id.to_string(), x, now.to_rfc3339()],
    )
    .map_err(map_sqlite)?;
    Ok(())
}
