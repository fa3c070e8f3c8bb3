use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An (EAS, exact-score) pair recorded for future ContextCite calibration.
/// Never consumed by the core — the calibration loop itself is out of scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationPair {
    pub id: Uuid,
    pub memory_id: Uuid,
    pub transaction_id: Uuid,
    pub eas_score: f64,
    pub exact_score: f64,
    pub method: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCostConfig {
    pub agent_id: String,
    pub input_token_cost: f64,
    pub output_token_cost: f64,
    pub provider: Option<String>,
    pub model_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contradiction {
    pub id: Uuid,
    pub memory_id_1: Uuid,
    pub memory_id_2: Uuid,
    pub contradiction_type: String,
    pub confidence: f64,
    pub detected_at: DateTime<Utc>,
    pub resolved: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub id: Uuid,
    pub agent_id: String,
    pub contradiction_rate: f64,
    pub retrieval_efficiency: f64,
    pub semantic_drift: f64,
    pub memory_quality: f64,
    pub timestamp: DateTime<Utc>,
}
