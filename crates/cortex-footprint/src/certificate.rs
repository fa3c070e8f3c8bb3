//! Compliance certificate issuance. Not named as an operation by spec.md's
//! §4.E (which only defines the read-path queries), but
//! `tests/test_provenance.py::TestComplianceCertificate` in the original
//! persists exactly this record once a footprint is computed for a
//! deletion/audit/export request; grounded there.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use cortex_core::ids;
use cortex_core::models::{ComplianceCertificate, RequestType};
use cortex_core::CortexResult;
use cortex_storage::queries::compliance_ops;
use rusqlite::Connection;

use crate::footprint::UserFootprint;

/// Builds a `ComplianceCertificate` from an already-computed footprint. Pure:
/// does not touch the store, does not perform the deletion itself — callers
/// persist the result via `cortex-storage::queries::compliance_ops` after
/// deciding what `edges_affected` means for this request (e.g. a GDPR
/// deletion counts the attribution edges it is about to tombstone; an audit
/// or export request issues the certificate with `edges_affected = 0`).
pub fn issue_certificate(
    footprint: &UserFootprint,
    request_type: RequestType,
    edges_affected: i64,
    grace_period: Option<Duration>,
) -> ComplianceCertificate {
    let now = Utc::now();
    let certificate_hash = footprint.certificate_hash();

    ComplianceCertificate {
        id: ids::new_id(),
        user_id: footprint.user_id.clone(),
        request_type,
        footprint_snapshot: footprint.serialize(),
        nodes_deleted: footprint.all_node_ids().len() as i64,
        edges_affected,
        deletion_timestamp: now,
        grace_period_end: grace_period.map(|g| now + g),
        hard_deleted_at: None,
        verified: false,
        verified_at: None,
        certificate_hash,
        metadata: HashMap::new(),
    }
}

/// Builds the certificate and persists it in the same call, the way a
/// GDPR-deletion/audit/export request handler actually uses this: it has no
/// other reason to hold a bare, unpersisted certificate. Runs inside the
/// caller's transaction, per `cortex-storage`'s scoped-commit convention.
pub fn issue_and_persist_certificate(
    conn: &Connection,
    footprint: &UserFootprint,
    request_type: RequestType,
    edges_affected: i64,
    grace_period: Option<Duration>,
) -> CortexResult<ComplianceCertificate> {
    let cert = issue_certificate(footprint, request_type, edges_affected, grace_period);
    compliance_ops::insert_certificate(conn, &cert)?;
    Ok(cert)
}
