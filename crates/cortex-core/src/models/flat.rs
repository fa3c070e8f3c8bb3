use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Hot,
    Warm,
    Cold,
}

impl Default for Tier {
    fn default() -> Self {
        Tier::Warm
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

/// A unit of agent memory (§3.1). Soft-deleted via `deleted_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub id: uuid::Uuid,
    pub content: String,
    pub embedding: Option<Vec<f64>>,
    pub tokens: i64,
    pub agent_id: String,
    pub tier: Tier,
    pub criticality: f64,
    pub metadata: HashMap<String, serde_json::Value>,
    pub retrieval_count: i64,
    pub created_at: DateTime<Utc>,
    pub last_accessed: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A query/response round-trip through the attribution pipeline (§3.1, §4.C).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: uuid::Uuid,
    pub query_text: String,
    pub query_embedding: Option<Vec<f64>>,
    pub response_text: Option<String>,
    pub response_embedding: Option<Vec<f64>>,
    pub retrieved_memory_ids: Vec<uuid::Uuid>,
    pub agent_id: String,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub model: String,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionScore {
    pub id: uuid::Uuid,
    pub memory_id: uuid::Uuid,
    pub transaction_id: uuid::Uuid,
    pub score: f64,
    pub raw_score: f64,
    pub method: String,
    pub confidence: f64,
    pub compute_time_ms: f64,
}

/// Running Welford statistics for a memory's attribution history (§3.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryProfile {
    pub memory_id: uuid::Uuid,
    pub mean_attribution: f64,
    pub m2: f64,
    pub retrieval_count: i64,
    pub total_attribution: f64,
    pub trend: Trend,
    pub updated_at: DateTime<Utc>,
}

impl MemoryProfile {
    /// `variance = m2 / max(n-1, 1)` (§3.1 invariant).
    pub fn variance(&self) -> f64 {
        self.m2 / (self.retrieval_count - 1).max(1) as f64
    }
}
