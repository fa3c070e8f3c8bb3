use chrono::Utc;
use cortex_core::config::CostConfig;
use cortex_core::models::{AttributionScore, Memory, Transaction, TransactionStatus};
use cortex_core::tokens::whitespace_tokens;
use cortex_core::traits::Embedder;
use cortex_core::{ids, CortexError, CortexResult};
use cortex_storage::queries::{attribution_ops, memory_crud, transaction_crud};
use cortex_storage::StorageEngine;
use uuid::Uuid;

use crate::cost::compute_cost;
use crate::types::TransactionWithScores;

/// Orchestrates the two-phase transaction protocol (§4.C). Generic over the
/// embedding collaborator so tests can supply a deterministic double.
pub struct AttributionPipeline<E: Embedder> {
    storage: std::sync::Arc<StorageEngine>,
    embedder: E,
    cost_config: CostConfig,
}

impl<E: Embedder> AttributionPipeline<E> {
    pub fn new(storage: std::sync::Arc<StorageEngine>, embedder: E, cost_config: CostConfig) -> Self {
        Self {
            storage,
            embedder,
            cost_config,
        }
    }

    /// §4.C.1.
    pub async fn initiate(
        &self,
        query_text: String,
        retrieved_memory_ids: Vec<Uuid>,
        agent_id: String,
        model: String,
        query_embedding: Option<Vec<f64>>,
    ) -> CortexResult<Uuid> {
        let query_embedding = match query_embedding {
            Some(e) => e,
            None => self
                .embedder
                .embed(&[query_text.clone()])
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| CortexError::EmbedError("embedder returned no vectors".into()))?,
        };

        let transaction = Transaction {
            id: ids::new_id(),
            query_text,
            query_embedding: Some(query_embedding),
            response_text: None,
            response_embedding: None,
            retrieved_memory_ids,
            agent_id,
            input_tokens: 0,
            output_tokens: 0,
            model,
            status: TransactionStatus::Pending,
            created_at: Utc::now(),
        };

        let id = transaction.id;
        self.storage
            .transaction(|txn| transaction_crud::insert_transaction(txn, &transaction))?;
        tracing::info!(transaction_id = %id, "transaction initiated");
        Ok(id)
    }

    /// §4.C.2.
    pub async fn complete(
        &self,
        transaction_id: Uuid,
        response_text: String,
        response_embedding: Option<Vec<f64>>,
        input_tokens: Option<i64>,
        output_tokens: Option<i64>,
    ) -> CortexResult<TransactionWithScores> {
        let existing = self
            .storage
            .with_conn(|conn| transaction_crud::get_transaction(conn, transaction_id))?
            .ok_or_else(|| CortexError::NotFound {
                entity: "transaction",
                id: transaction_id.to_string(),
            })?;

        if existing.status != TransactionStatus::Pending {
            tracing::warn!(%transaction_id, status = ?existing.status, "complete called on non-pending transaction");
            return Err(CortexError::Conflict(format!(
                "transaction {transaction_id} is not pending"
            )));
        }

        let response_embedding = match response_embedding {
            Some(e) => e,
            None => self
                .embedder
                .embed(&[response_text.clone()])
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| CortexError::EmbedError("embedder returned no vectors".into()))?,
        };

        let input_tokens = input_tokens.unwrap_or_else(|| whitespace_tokens(&existing.query_text));
        let output_tokens = output_tokens.unwrap_or_else(|| whitespace_tokens(&response_text));

        let query_embedding = existing.query_embedding.clone().ok_or_else(|| {
            let err = CortexError::InvariantViolation("pending transaction missing query_embedding".into());
            tracing::error!(%transaction_id, %err, "invariant violation");
            err
        })?;

        let scores = self.storage.transaction(|txn| {
            let applied = transaction_crud::complete_transaction(
                txn,
                transaction_id,
                &response_text,
                Some(&response_embedding),
                input_tokens,
                output_tokens,
            )?;
            if !applied {
                return Err(CortexError::Conflict(format!(
                    "transaction {transaction_id} is not pending"
                )));
            }
            run_eas_and_store(
                txn,
                transaction_id,
                &query_embedding,
                &response_embedding,
                &existing.retrieved_memory_ids,
                true,
            )
        })?;

        let cost = compute_cost(&self.storage, &existing.agent_id, &self.cost_config, input_tokens, output_tokens)?;
        let transaction = self
            .storage
            .with_conn(|conn| transaction_crud::get_transaction(conn, transaction_id))?
            .ok_or_else(|| {
                let err = CortexError::InvariantViolation("transaction vanished after completion".into());
                tracing::error!(%transaction_id, %err, "invariant violation");
                err
            })?;

        tracing::info!(%transaction_id, scored = scores.len(), "transaction completed");
        Ok(TransactionWithScores { transaction, scores, cost })
    }

    /// §4.C.3: initiate-then-complete collapsed into a single insert, with
    /// `snapshot = false` since there is no interim window for deletions.
    pub async fn create(
        &self,
        query_text: String,
        response_text: String,
        retrieved_memory_ids: Vec<Uuid>,
        agent_id: String,
        model: String,
        query_embedding: Option<Vec<f64>>,
        response_embedding: Option<Vec<f64>>,
        input_tokens: Option<i64>,
        output_tokens: Option<i64>,
    ) -> CortexResult<TransactionWithScores> {
        let query_embedding = match query_embedding {
            Some(e) => e,
            None => self
                .embedder
                .embed(&[query_text.clone()])
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| CortexError::EmbedError("embedder returned no vectors".into()))?,
        };
        let response_embedding = match response_embedding {
            Some(e) => e,
            None => self
                .embedder
                .embed(&[response_text.clone()])
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| CortexError::EmbedError("embedder returned no vectors".into()))?,
        };

        let input_tokens = input_tokens.unwrap_or_else(|| whitespace_tokens(&query_text));
        let output_tokens = output_tokens.unwrap_or_else(|| whitespace_tokens(&response_text));

        let transaction = Transaction {
            id: ids::new_id(),
            query_text,
            query_embedding: Some(query_embedding.clone()),
            response_text: Some(response_text),
            response_embedding: Some(response_embedding.clone()),
            retrieved_memory_ids: retrieved_memory_ids.clone(),
            agent_id: agent_id.clone(),
            input_tokens,
            output_tokens,
            model,
            status: TransactionStatus::Completed,
            created_at: Utc::now(),
        };
        let transaction_id = transaction.id;

        let scores = self.storage.transaction(|txn| {
            transaction_crud::insert_transaction(txn, &transaction)?;
            run_eas_and_store(
                txn,
                transaction_id,
                &query_embedding,
                &response_embedding,
                &retrieved_memory_ids,
                false,
            )
        })?;

        let cost = compute_cost(&self.storage, &agent_id, &self.cost_config, input_tokens, output_tokens)?;

        tracing::info!(%transaction_id, scored = scores.len(), "transaction created");
        Ok(TransactionWithScores { transaction, scores, cost })
    }
}

/// §4.C.4, the single most-subtle routine: fetch in deterministic order,
/// compute EAS, persist scores, and atomically update running profiles.
fn run_eas_and_store(
    conn: &rusqlite::Connection,
    transaction_id: Uuid,
    query_embedding: &[f64],
    response_embedding: &[f64],
    memory_ids: &[Uuid],
    snapshot: bool,
) -> CortexResult<Vec<AttributionScore>> {
    let memories = memory_crud::fetch_memories_for_eas(conn, memory_ids, snapshot)?;

    let scored: Vec<&Memory> = memories.iter().filter(|m| m.embedding.is_some()).collect();
    let matrix: Vec<Vec<f64>> = scored.iter().map(|m| m.embedding.clone().unwrap()).collect();

    tracing::debug!(%transaction_id, candidates = memory_ids.len(), scorable = scored.len(), "scoring attribution");
    let eas = cortex_eas::compute_eas(&matrix, query_embedding, response_embedding);

    let now = Utc::now();
    let mut results = Vec::with_capacity(scored.len());
    for ((memory, &score), &raw) in scored.iter().zip(eas.scores.iter()).zip(eas.raw_scores.iter()) {
        let attribution_score = AttributionScore {
            id: ids::new_id(),
            memory_id: memory.id,
            transaction_id,
            score,
            raw_score: raw,
            method: "eas".to_string(),
            confidence: 1.0,
            compute_time_ms: eas.compute_ms,
        };
        attribution_ops::insert_attribution_score(conn, &attribution_score)?;
        attribution_ops::upsert_memory_profile(conn, memory.id, score, now)?;
        memory_crud::touch_memory(conn, memory.id, now)?;
        results.push(attribution_score);
    }

    Ok(results)
}
