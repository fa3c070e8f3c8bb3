//! Read path of the footprint engine (§4.E): F(u) and I(u) over the
//! provenance graph, plus the canonical serialization used for compliance
//! certificate hashing.

use cortex_core::CortexResult;
use cortex_storage::queries::{footprint_ops, graph_nodes};
use rusqlite::Connection;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// F(u): every node reachable from a user's interactions via the
/// derivation closure, bucketed by node type (§4.E.1).
#[derive(Debug, Clone)]
pub struct UserFootprint {
    pub user_id: String,
    pub memory_node_ids: Vec<Uuid>,
    pub summary_node_ids: Vec<Uuid>,
    pub embedding_node_ids: Vec<Uuid>,
    pub interaction_node_ids: Vec<Uuid>,
}

impl UserFootprint {
    pub fn all_node_ids(&self) -> Vec<Uuid> {
        self.memory_node_ids
            .iter()
            .chain(self.summary_node_ids.iter())
            .chain(self.embedding_node_ids.iter())
            .chain(self.interaction_node_ids.iter())
            .copied()
            .collect()
    }

    /// Canonical JSON form (§4.E.3). `serde_json`'s default map
    /// representation (no `preserve_order` feature) is a `BTreeMap`, so
    /// keys come out lexicographically sorted for free.
    pub fn serialize(&self) -> Value {
        json!({
            "user_id": self.user_id,
            "memory_node_ids": ids_as_strings(&self.memory_node_ids),
            "summary_node_ids": ids_as_strings(&self.summary_node_ids),
            "embedding_node_ids": ids_as_strings(&self.embedding_node_ids),
            "interaction_node_ids": ids_as_strings(&self.interaction_node_ids),
        })
    }

    /// SHA-256 hex digest of the canonical serialization (§4.E.3). Two
    /// footprints for the same user with the same multiset of ids hash
    /// identically regardless of collection order, since `serialize`
    /// routes through a sorted JSON map.
    pub fn certificate_hash(&self) -> String {
        let bytes = serde_json::to_vec(&self.serialize()).expect("footprint serializes to valid JSON");
        let digest = Sha256::digest(&bytes);
        format!("{digest:x}")
    }
}

fn ids_as_strings(ids: &[Uuid]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

pub fn compute_user_footprint(conn: &Connection, user_id: &str) -> CortexResult<UserFootprint> {
    let closure = footprint_ops::derivation_closure(conn, user_id)?;
    let interaction_node_ids = graph_nodes::interactions_for_user(conn, user_id)?;
    Ok(UserFootprint {
        user_id: user_id.to_string(),
        memory_node_ids: closure.memory_node_ids,
        summary_node_ids: closure.summary_node_ids,
        embedding_node_ids: closure.embedding_node_ids,
        interaction_node_ids,
    })
}

/// I(u) (§4.E.2).
pub fn compute_influence_footprint(conn: &Connection, user_id: &str) -> CortexResult<Vec<Uuid>> {
    footprint_ops::influence_footprint(conn, user_id)
}
