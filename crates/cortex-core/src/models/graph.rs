use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Memory,
    Summary,
    Embedding,
}

/// A polymorphic reference into the graph (§9 design note). The discriminator
/// is carried explicitly wherever this is persisted, never inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRef {
    Memory(Uuid),
    Summary(Uuid),
    Embedding(Uuid),
}

impl NodeRef {
    pub fn id(&self) -> Uuid {
        match self {
            NodeRef::Memory(id) | NodeRef::Summary(id) | NodeRef::Embedding(id) => *id,
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            NodeRef::Memory(_) => NodeType::Memory,
            NodeRef::Summary(_) => NodeType::Summary,
            NodeRef::Embedding(_) => NodeType::Embedding,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    Raw,
    Consolidated,
    Critical,
}

impl Default for MemoryType {
    fn default() -> Self {
        MemoryType::Raw
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryStatus {
    Active,
    Archived,
    PendingDeletion,
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryCriticality {
    Normal,
    SafetyCritical,
    Protected,
}

impl Default for MemoryCriticality {
    fn default() -> Self {
        MemoryCriticality::Normal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreType {
    Eas,
    Contextcite,
    Calibrated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivationType {
    Consolidation,
    Embedding,
    ReEmbedding,
    Summary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionNode {
    pub id: Uuid,
    pub user_id: String,
    pub query: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
    pub agent_id: String,
    pub transaction_cost: f64,
    pub metadata: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryNode {
    pub id: Uuid,
    pub content: String,
    pub memory_type: MemoryType,
    pub status: MemoryStatus,
    pub shard_id: i32,
    pub slice_id: i64,
    pub created_at: DateTime<Utc>,
    pub created_by_user_id: String,
    pub token_count: i64,
    pub criticality: MemoryCriticality,
    pub metadata: HashMap<String, serde_json::Value>,
    pub deletion_scheduled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryNode {
    pub id: Uuid,
    pub content: String,
    pub source_memory_count: i64,
    pub created_at: DateTime<Utc>,
    pub method: String,
    pub metadata: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingNode {
    pub id: Uuid,
    pub vector_ref: String,
    pub model_version: String,
    pub dimensions: i64,
    pub created_at: DateTime<Utc>,
    pub metadata: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    pub text: String,
    pub index: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseNode {
    pub id: Uuid,
    pub interaction_id: Uuid,
    pub statements: Vec<Statement>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreationEdge {
    pub id: Uuid,
    pub source_id: Uuid,
    pub target_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub metadata: HashMap<String, serde_json::Value>,
}

/// MemoryNode -> InteractionNode. Append-only, versioned (§3.2 invariants).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionEdge {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub source_id: Uuid,
    pub target_id: Uuid,
    pub score: f64,
    pub score_type: ScoreType,
    pub version: i64,
    pub is_current: bool,
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Polymorphic edge; no referential integrity, validated by the write path.
/// `source`/`target` are tagged variants (§9 design note); the relational
/// store carries the discriminator as an explicit column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivationEdge {
    pub id: Uuid,
    pub source: NodeRef,
    pub target: NodeRef,
    pub derivation_type: DerivationType,
    pub created_at: DateTime<Utc>,
    pub metadata: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementAttributionEdge {
    pub id: Uuid,
    pub memory_id: Uuid,
    pub response_id: Uuid,
    pub statement_index: i64,
    pub score: f64,
    pub created_at: DateTime<Utc>,
}
