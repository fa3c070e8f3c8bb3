use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    GdprDeletion,
    AuditRequest,
    DataExport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceCertificate {
    pub id: Uuid,
    pub user_id: String,
    pub request_type: RequestType,
    pub footprint_snapshot: serde_json::Value,
    pub nodes_deleted: i64,
    pub edges_affected: i64,
    pub deletion_timestamp: DateTime<Utc>,
    pub grace_period_end: Option<DateTime<Utc>>,
    pub hard_deleted_at: Option<DateTime<Utc>>,
    pub verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
    pub certificate_hash: String,
    pub metadata: HashMap<String, serde_json::Value>,
}
