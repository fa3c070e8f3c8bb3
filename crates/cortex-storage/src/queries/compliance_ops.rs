use chrono::{DateTime, Utc};
use cortex_core::models::{ComplianceCertificate, RequestType};
use cortex_core::CortexResult;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::map_sqlite;

fn parse_dt(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn request_type_str(t: RequestType) -> &'static str {
    match t {
        RequestType::GdprDeletion => "gdpr_deletion",
        RequestType::AuditRequest => "audit_request",
        RequestType::DataExport => "data_export",
    }
}

fn parse_request_type(s: &str) -> RequestType {
    match s {
        "audit_request" => RequestType::AuditRequest,
        "data_export" => RequestType::DataExport,
        _ => RequestType::GdprDeletion,
    }
}

fn row_to_certificate(row: &Row<'_>) -> rusqlite::Result<ComplianceCertificate> {
    let id: String = row.get("id")?;
    let request_type: String = row.get("request_type")?;
    let footprint_snapshot: String = row.get("footprint_snapshot")?;
    let deletion_timestamp: String = row.get("deletion_timestamp")?;
    let grace_period_end: Option<String> = row.get("grace_period_end")?;
    let hard_deleted_at: Option<String> = row.get("hard_deleted_at")?;
    let verified: i64 = row.get("verified")?;
    let verified_at: Option<String> = row.get("verified_at")?;
    let metadata: String = row.get("metadata")?;

    Ok(ComplianceCertificate {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        user_id: row.get("user_id")?,
        request_type: parse_request_type(&request_type),
        footprint_snapshot: serde_json::from_str(&footprint_snapshot).unwrap_or(serde_json::Value::Null),
        nodes_deleted: row.get("nodes_deleted")?,
        edges_affected: row.get("edges_affected")?,
        deletion_timestamp: parse_dt(&deletion_timestamp),
        grace_period_end: grace_period_end.map(|s| parse_dt(&s)),
        hard_deleted_at: hard_deleted_at.map(|s| parse_dt(&s)),
        verified: verified != 0,
        verified_at: verified_at.map(|s| parse_dt(&s)),
        certificate_hash: row.get("certificate_hash")?,
        metadata: serde_json::from_str(&metadata).unwrap_or_default(),
    })
}

pub fn insert_certificate(conn: &Connection, cert: &ComplianceCertificate) -> CortexResult<()> {
    let footprint_json = serde_json::to_string(&cert.footprint_snapshot)?;
    let metadata_json = serde_json::to_string(&cert.metadata)?;
    conn.execute(
        "INSERT INTO compliance_certificates (id, user_id, request_type, footprint_snapshot, nodes_deleted,
            edges_affected, deletion_timestamp, grace_period_end, hard_deleted_at, verified, verified_at,
            certificate_hash, metadata)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            cert.id.to_string(),
            cert.user_id,
            request_type_str(cert.request_type),
            footprint_json,
            cert.nodes_deleted,
            cert.edges_affected,
            cert.deletion_timestamp.to_rfc3339(),
            cert.grace_period_end.map(|d| d.to_rfc3339()),
            cert.hard_deleted_at.map(|d| d.to_rfc3339()),
            cert.verified as i64,
            cert.verified_at.map(|d| d.to_rfc3339()),
            cert.certificate_hash,
            metadata_json,
        ],
    )
    .map_err(map_sqlite)?;
    Ok(())
}

pub fn get_certificate(conn: &Connection, id: Uuid) -> CortexResult<Option<ComplianceCertificate>> {
    conn.query_row(
        "SELECT * FROM compliance_certificates WHERE id = ?1",
        params![id.to_string()],
        row_to_certificate,
    )
    .optional()
    .map_err(map_sqlite)
}
