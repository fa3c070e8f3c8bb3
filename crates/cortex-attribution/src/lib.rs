pub mod cost;
pub mod pipeline;
pub mod types;

pub use pipeline::AttributionPipeline;
pub use types::{Cost, TransactionWithScores};
