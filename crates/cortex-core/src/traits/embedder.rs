use crate::errors::CortexResult;

/// Sentence-embedding collaborator (§6): `embed(texts) -> vectors`.
/// Deterministic per model version; outputs are assumed L2-normalized but
/// the EAS kernel re-normalizes defensively regardless.
#[allow(async_fn_in_trait)]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> CortexResult<Vec<Vec<f64>>>;
}
