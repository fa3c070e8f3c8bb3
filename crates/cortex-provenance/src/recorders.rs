//! Write-path recorders for the provenance graph (§4.D). Every method takes
//! an open `rusqlite::Connection` (usually a `Transaction` via deref
//! coercion) and leaves the transaction boundary to the caller, mirroring
//! `StorageEngine::transaction`'s scoped-commit pattern.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use cortex_core::ids;
use cortex_core::models::{
    AttributionEdge, CreationEdge, DerivationEdge, DerivationType, EmbeddingNode, InteractionNode,
    MemoryCriticality, MemoryNode, MemoryStatus, MemoryType, NodeRef, ResponseNode, ScoreType,
    Statement, StatementAttributionEdge, SummaryNode,
};
use cortex_core::CortexResult;
use cortex_storage::queries::{graph_edges, graph_nodes};
use rusqlite::Connection;
use uuid::Uuid;

/// A single entry in a ContextCite statement-attribution batch.
pub struct StatementScore {
    pub memory_id: Uuid,
    pub statement_index: i64,
    pub score: f64,
}

/// Stateless facade over the provenance write path (§4.D). Exists as a type
/// so call sites read `ProvenanceGraph::record_transaction(...)` the same
/// way they'd read a method on a real collaborator, even though there is no
/// per-instance state to hold.
pub struct ProvenanceGraph;

impl ProvenanceGraph {
    /// Records a completed transaction plus one current-version `AttributionEdge`
    /// per `(memory_id, score)` pair (§4.D.1).
    #[allow(clippy::too_many_arguments)]
    pub fn record_transaction(
        conn: &Connection,
        user_id: &str,
        query: &str,
        response: &str,
        agent_id: &str,
        transaction_cost: f64,
        memory_ids: &[Uuid],
        attribution_scores: &[f64],
        score_type: ScoreType,
        timestamp: Option<DateTime<Utc>>,
        metadata: HashMap<String, serde_json::Value>,
    ) -> CortexResult<InteractionNode> {
        let now = timestamp.unwrap_or_else(Utc::now);

        let interaction = InteractionNode {
            id: ids::new_id(),
            user_id: user_id.to_string(),
            query: query.to_string(),
            response: response.to_string(),
            timestamp: now,
            agent_id: agent_id.to_string(),
            transaction_cost,
            metadata,
        };
        graph_nodes::insert_interaction(conn, &interaction)?;

        for (&memory_id, &score) in memory_ids.iter().zip(attribution_scores.iter()) {
            let edge = AttributionEdge {
                id: ids::new_id(),
                created_at: now,
                source_id: memory_id,
                target_id: interaction.id,
                score,
                score_type,
                version: 1,
                is_current: true,
                metadata: HashMap::new(),
            };
            graph_edges::insert_attribution_edge(conn, &edge)?;
        }

        tracing::debug!(interaction_id = %interaction.id, edges = memory_ids.len(), "transaction recorded");
        Ok(interaction)
    }

    /// Records a new memory derived from an interaction: `MemoryNode` +
    /// `CreationEdge` + `EmbeddingNode` + `DerivationEdge(embedding)` (§4.D.2).
    #[allow(clippy::too_many_arguments)]
    pub fn record_memory_creation(
        conn: &Connection,
        interaction_id: Uuid,
        content: &str,
        user_id: &str,
        memory_type: MemoryType,
        vector_ref: &str,
        embedding_model: &str,
        embedding_dim: i64,
        token_count: i64,
        criticality: MemoryCriticality,
        metadata: HashMap<String, serde_json::Value>,
    ) -> CortexResult<(MemoryNode, EmbeddingNode)> {
        let now = Utc::now();
        let shard_id = ids::shard_id_for_user(user_id);
        let slice_id = graph_nodes::next_slice_id(conn, user_id)?;

        let mem_node = MemoryNode {
            id: ids::new_id(),
            content: content.to_string(),
            memory_type,
            status: MemoryStatus::Active,
            shard_id,
            slice_id,
            created_at: now,
            created_by_user_id: user_id.to_string(),
            token_count,
            criticality,
            metadata,
            deletion_scheduled_at: None,
        };
        graph_nodes::insert_memory_node(conn, &mem_node)?;

        let creation_edge = CreationEdge {
            id: ids::new_id(),
            source_id: interaction_id,
            target_id: mem_node.id,
            created_at: now,
            metadata: HashMap::new(),
        };
        graph_edges::insert_creation_edge(conn, &creation_edge)?;

        let emb_node = EmbeddingNode {
            id: ids::new_id(),
            vector_ref: vector_ref.to_string(),
            model_version: embedding_model.to_string(),
            dimensions: embedding_dim,
            created_at: now,
            metadata: HashMap::new(),
        };
        graph_nodes::insert_embedding(conn, &emb_node)?;

        let deriv_edge = DerivationEdge {
            id: ids::new_id(),
            source: NodeRef::Memory(mem_node.id),
            target: NodeRef::Embedding(emb_node.id),
            derivation_type: DerivationType::Embedding,
            created_at: now,
            metadata: HashMap::new(),
        };
        graph_edges::insert_derivation_edge(conn, &deriv_edge)?;

        tracing::debug!(memory_id = %mem_node.id, shard_id, slice_id, "memory creation recorded");
        Ok((mem_node, emb_node))
    }

    /// Records consolidation of several memories into a summary: `SummaryNode`
    /// + one `DerivationEdge(consolidation)` per source memory (§4.D.3).
    pub fn record_consolidation(
        conn: &Connection,
        source_memory_ids: &[Uuid],
        summary_content: &str,
        method: &str,
        metadata: HashMap<String, serde_json::Value>,
    ) -> CortexResult<SummaryNode> {
        let now = Utc::now();

        let summary = SummaryNode {
            id: ids::new_id(),
            content: summary_content.to_string(),
            source_memory_count: source_memory_ids.len() as i64,
            created_at: now,
            method: method.to_string(),
            metadata,
        };
        graph_nodes::insert_summary(conn, &summary)?;

        for &mem_id in source_memory_ids {
            let edge = DerivationEdge {
                id: ids::new_id(),
                source: NodeRef::Memory(mem_id),
                target: NodeRef::Summary(summary.id),
                derivation_type: DerivationType::Consolidation,
                created_at: now,
                metadata: HashMap::new(),
            };
            graph_edges::insert_derivation_edge(conn, &edge)?;
        }

        tracing::debug!(summary_id = %summary.id, sources = source_memory_ids.len(), "consolidation recorded");
        Ok(summary)
    }

    /// Records statement-level attribution for a response: `ResponseNode` +
    /// one `StatementAttributionEdge` per scored statement (§4.D.4).
    pub fn record_contextcite(
        conn: &Connection,
        interaction_id: Uuid,
        statements: Vec<Statement>,
        memory_scores: &[StatementScore],
    ) -> CortexResult<ResponseNode> {
        let now = Utc::now();

        let response_node = ResponseNode {
            id: ids::new_id(),
            interaction_id,
            statements,
            created_at: now,
        };
        graph_nodes::insert_response(conn, &response_node)?;

        for entry in memory_scores {
            let edge = StatementAttributionEdge {
                id: ids::new_id(),
                memory_id: entry.memory_id,
                response_id: response_node.id,
                statement_index: entry.statement_index,
                score: entry.score,
                created_at: now,
            };
            graph_edges::insert_statement_attribution_edge(conn, &edge)?;
        }

        tracing::debug!(response_id = %response_node.id, statements = memory_scores.len(), "contextcite recorded");
        Ok(response_node)
    }

    /// Creates a new version of an attribution edge: supersede the current
    /// row, then insert `version = current + 1` (§4.D.5). Both steps run
    /// inside the caller's transaction so the flip and the insert are
    /// atomic with respect to concurrent readers (§5).
    pub fn update_attribution(
        conn: &Connection,
        source_id: Uuid,
        target_id: Uuid,
        new_score: f64,
        new_score_type: ScoreType,
        metadata: HashMap<String, serde_json::Value>,
    ) -> CortexResult<AttributionEdge> {
        let now = Utc::now();
        let current = graph_edges::current_version(conn, source_id, target_id)?;
        let next_version = current.unwrap_or(0) + 1;

        graph_edges::supersede_current(conn, source_id, target_id)?;

        let new_edge = AttributionEdge {
            id: ids::new_id(),
            created_at: now,
            source_id,
            target_id,
            score: new_score,
            score_type: new_score_type,
            version: next_version,
            is_current: true,
            metadata,
        };
        graph_edges::insert_attribution_edge(conn, &new_edge)?;

        tracing::info!(%source_id, %target_id, version = next_version, "attribution edge versioned");
        Ok(new_edge)
    }
}
