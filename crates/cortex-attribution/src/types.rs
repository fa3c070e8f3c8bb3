use cortex_core::models::{AttributionScore, Transaction};

/// `cost = {input, output, total}` (§4.C.2 step 5).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cost {
    pub input: f64,
    pub output: f64,
    pub total: f64,
}

#[derive(Debug, Clone)]
pub struct TransactionWithScores {
    pub transaction: Transaction,
    pub scores: Vec<AttributionScore>,
    pub cost: Cost,
}
