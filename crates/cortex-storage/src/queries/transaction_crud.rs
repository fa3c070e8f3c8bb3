use chrono::{DateTime, Utc};
use cortex_core::models::{Transaction, TransactionStatus};
use cortex_core::CortexResult;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::map_sqlite;

fn status_str(status: TransactionStatus) -> &'static str {
    match status {
        TransactionStatus::Pending => "pending",
        TransactionStatus::Completed => "completed",
    }
}

fn parse_status(s: &str) -> TransactionStatus {
    if s == "pending" {
        TransactionStatus::Pending
    } else {
        TransactionStatus::Completed
    }
}

fn parse_dt(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn row_to_transaction(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    let id: String = row.get("id")?;
    let query_embedding: Option<String> = row.get("query_embedding")?;
    let response_embedding: Option<String> = row.get("response_embedding")?;
    let retrieved_memory_ids: String = row.get("retrieved_memory_ids")?;
    let created_at: String = row.get("created_at")?;
    let status: String = row.get("status")?;

    let ids: Vec<String> = serde_json::from_str(&retrieved_memory_ids).unwrap_or_default();

    Ok(Transaction {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        query_text: row.get("query_text")?,
        query_embedding: query_embedding.and_then(|s| serde_json::from_str(&s).ok()),
        response_text: row.get("response_text")?,
        response_embedding: response_embedding.and_then(|s| serde_json::from_str(&s).ok()),
        retrieved_memory_ids: ids.iter().filter_map(|s| Uuid::parse_str(s).ok()).collect(),
        agent_id: row.get("agent_id")?,
        input_tokens: row.get("input_tokens")?,
        output_tokens: row.get("output_tokens")?,
        model: row.get("model")?,
        status: parse_status(&status),
        created_at: parse_dt(&created_at),
    })
}

pub fn insert_transaction(conn: &Connection, txn: &Transaction) -> CortexResult<()> {
    let query_embedding_json = txn.query_embedding.as_ref().map(serde_json::to_string).transpose()?;
    let response_embedding_json = txn.response_embedding.as_ref().map(serde_json::to_string).transpose()?;
    let retrieved_ids: Vec<String> = txn.retrieved_memory_ids.iter().map(|id| id.to_string()).collect();
    let retrieved_json = serde_json::to_string(&retrieved_ids)?;

    conn.execute(
        "INSERT INTO transactions (id, query_text, query_embedding, response_text, response_embedding,
            retrieved_memory_ids, agent_id, input_tokens, output_tokens, model, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            txn.id.to_string(),
            txn.query_text,
            query_embedding_json,
            txn.response_text,
            response_embedding_json,
            retrieved_json,
            txn.agent_id,
            txn.input_tokens,
            txn.output_tokens,
            txn.model,
            status_str(txn.status),
            txn.created_at.to_rfc3339(),
        ],
    )
    .map_err(map_sqlite)?;
    Ok(())
}

pub fn get_transaction(conn: &Connection, id: Uuid) -> CortexResult<Option<Transaction>> {
    conn.query_row("SELECT * FROM transactions WHERE id = ?1", params![id.to_string()], row_to_transaction)
        .optional()
        .map_err(map_sqlite)
}

/// Applies the `complete` transition (§4.C.2 steps 1-3): sets response
/// fields, token counts, and flips status to completed. Returns false if
/// the row was not found or was not pending (caller maps to NotFound /
/// Conflict).
pub fn complete_transaction(
    conn: &Connection,
    id: Uuid,
    response_text: &str,
    response_embedding: Option<&[f64]>,
    input_tokens: i64,
    output_tokens: i64,
) -> CortexResult<bool> {
    let response_embedding_json = response_embedding.map(serde_json::to_string).transpose()?;

    let affected = conn
        .execute(
            "UPDATE transactions SET response_text = ?1, response_embedding = ?2,
                input_tokens = ?3, output_tokens = ?4, status = 'completed'
             WHERE id = ?5 AND status = 'pending'",
            params![
                response_text,
                response_embedding_json,
                input_tokens,
                output_tokens,
                id.to_string(),
            ],
        )
        .map_err(map_sqlite)?;
    Ok(affected > 0)
}

pub fn list_transactions(
    conn: &Connection,
    agent_id: Option<&str>,
    status: Option<TransactionStatus>,
    offset: i64,
    limit: i64,
) -> CortexResult<Vec<Transaction>> {
    let mut sql = "SELECT * FROM transactions WHERE 1=1".to_string();
    let mut bind_agent: Option<String> = None;
    let mut bind_status: Option<&'static str> = None;

    if let Some(a) = agent_id {
        sql.push_str(" AND agent_id = ?");
        bind_agent = Some(a.to_string());
    }
    if let Some(s) = status {
        sql.push_str(" AND status = ?");
        bind_status = Some(status_str(s));
    }
    sql.push_str(" ORDER BY created_at DESC LIMIT ? OFFSET ?");

    let mut stmt = conn.prepare(&sql).map_err(map_sqlite)?;
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
    if let Some(a) = bind_agent {
        params.push(Box::new(a));
    }
    if let Some(s) = bind_status {
        params.push(Box::new(s));
    }
    params.push(Box::new(limit));
    params.push(Box::new(offset));

    let rows = stmt
        .query_map(rusqlite::params_from_iter(params.iter()), row_to_transaction)
        .map_err(map_sqlite)?;

    let mut txns = Vec::new();
    for row in rows {
        txns.push(row.map_err(map_sqlite)?);
    }
    Ok(txns)
}
