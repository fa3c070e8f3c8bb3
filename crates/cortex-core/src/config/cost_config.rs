use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    pub default_input_token_cost: f64,
    pub default_output_token_cost: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            // USD per token, conservative default in absence of an AgentCostConfig row.
            default_input_token_cost: 0.000_001,
            default_output_token_cost: 0.000_002,
        }
    }
}
