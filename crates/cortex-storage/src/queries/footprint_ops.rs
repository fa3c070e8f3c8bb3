use cortex_core::CortexResult;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::map_sqlite;

const FOOTPRINT_CTE: &str = "
    WITH RECURSIVE user_footprint(node_id, node_type) AS (
        SELECT ce.target_id, 'memory'
        FROM creation_edges ce
        JOIN interaction_nodes i ON ce.source_id = i.id
        WHERE i.user_id = ?1

        UNION

        SELECT de.target_id, de.target_type
        FROM derivation_edges de
        JOIN user_footprint uf ON de.source_id = uf.node_id
    )
";

#[derive(Debug, Default)]
pub struct FootprintRows {
    pub memory_node_ids: Vec<Uuid>,
    pub summary_node_ids: Vec<Uuid>,
    pub embedding_node_ids: Vec<Uuid>,
}

/// The derivation closure of §4.E.1: memories created from the user's
/// interactions, then everything reachable from those via derivation edges.
pub fn derivation_closure(conn: &Connection, user_id: &str) -> CortexResult<FootprintRows> {
    let sql = format!("{FOOTPRINT_CTE} SELECT node_id, node_type FROM user_footprint");
    let mut stmt = conn.prepare(&sql).map_err(map_sqlite)?;
    let rows = stmt
        .query_map(params![user_id], |row| {
            let node_id: String = row.get(0)?;
            let node_type: String = row.get(1)?;
            Ok((node_id, node_type))
        })
        .map_err(map_sqlite)?;

    let mut out = FootprintRows::default();
    for row in rows {
        let (node_id, node_type) = row.map_err(map_sqlite)?;
        let id = Uuid::parse_str(&node_id).map_err(|e| crate::to_storage_err(e.to_string()))?;
        match node_type.as_str() {
            "memory" => out.memory_node_ids.push(id),
            "summary" => out.summary_node_ids.push(id),
            "embedding" => out.embedding_node_ids.push(id),
            _ => {}
        }
    }
    Ok(out)
}

/// I(u) (§4.E.2): interactions that are the target of a current, positive
/// attribution edge sourced from a memory in F(u).
pub fn influence_footprint(conn: &Connection, user_id: &str) -> CortexResult<Vec<Uuid>> {
    let sql = format!(
        "{FOOTPRINT_CTE}
         SELECT DISTINCT ae.target_id
         FROM attribution_edges ae
         JOIN user_footprint uf ON ae.source_id = uf.node_id
         WHERE uf.node_type = 'memory'
           AND ae.is_current = 1
           AND ae.score > 0"
    );
    let mut stmt = conn.prepare(&sql).map_err(map_sqlite)?;
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
