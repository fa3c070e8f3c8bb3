use cortex_core::config::CostConfig;
use cortex_core::CortexResult;
use cortex_storage::queries::peripheral_ops;
use cortex_storage::StorageEngine;

use crate::types::Cost;

/// Looks up the per-agent cost config, falling back to the global default
/// (§4.C.2 step 5).
pub fn compute_cost(
    storage: &StorageEngine,
    agent_id: &str,
    default_cost: &CostConfig,
    input_tokens: i64,
    output_tokens: i64,
) -> CortexResult<Cost> {
    let config = storage.with_conn(|conn| peripheral_ops::get_agent_cost_config(conn, agent_id))?;

    let (input_rate, output_rate) = match config {
        Some(c) => (c.input_token_cost, c.output_token_cost),
        None => (default_cost.default_input_token_cost, default_cost.default_output_token_cost),
    };

    let input = input_tokens as f64 * input_rate;
    let output = output_tokens as f64 * output_rate;
    Ok(Cost {
        input,
        output,
        total: input + output,
    })
}
