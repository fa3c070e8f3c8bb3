use std::sync::Arc;

use cortex_attribution::AttributionPipeline;
use cortex_core::config::CostConfig;
use cortex_core::models::{Memory, Tier};
use cortex_core::traits::Embedder;
use cortex_core::{ids, CortexResult};
use cortex_storage::queries::memory_crud;
use cortex_storage::StorageEngine;
use uuid::Uuid;

/// Deterministic stub embedder: same text always yields the same vector, and
/// distinct texts yield distinguishable vectors, without pulling in a real
/// model for pipeline tests.
struct StubEmbedder;

fn deterministic_vector(text: &str, dims: usize) -> Vec<f64> {
    let hash = text
        .as_bytes()
        .iter()
        .fold(0u64, |acc, &b| acc.wrapping_mul(31).wrapping_add(b as u64));
    (0..dims)
        .map(|i| ((hash.wrapping_add(i as u64) % 1000) as f64) / 1000.0)
        .collect()
}

impl Embedder for StubEmbedder {
    async fn embed(&self, texts: &[String]) -> CortexResult<Vec<Vec<f64>>> {
        Ok(texts.iter().map(|t| deterministic_vector(t, 8)).collect())
    }
}

fn seed_memory(storage: &StorageEngine, content: &str) -> Uuid {
    let memory = Memory {
        id: ids::new_id(),
        content: content.to_string(),
        embedding: Some(deterministic_vector(content, 8)),
        tokens: 4,
        agent_id: "agent-1".to_string(),
        tier: Tier::Hot,
        criticality: 0.5,
        metadata: std::collections::HashMap::new(),
        retrieval_count: 0,
        created_at: chrono::Utc::now(),
        last_accessed: None,
        deleted_at: None,
    };
    let id = memory.id;
    storage.transaction(|txn| memory_crud::insert_memory(txn, &memory)).unwrap();
    id
}

fn pipeline() -> (Arc<StorageEngine>, AttributionPipeline<StubEmbedder>) {
    let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
    let pipeline = AttributionPipeline::new(storage.clone(), StubEmbedder, CostConfig::default());
    (storage, pipeline)
}

#[tokio::test]
async fn two_phase_and_single_shot_produce_identical_scores() {
    let (storage, two_phase) = pipeline();
    let (_, single_shot) = (storage.clone(), AttributionPipeline::new(storage.clone(), StubEmbedder, CostConfig::default()));

    let m1 = seed_memory(&storage, "the quick brown fox");
    let m2 = seed_memory(&storage, "jumps over the lazy dog");

    let query = "what does the fox do".to_string();
    let response = "the fox jumps".to_string();
    let ids = vec![m1, m2];

    let txn_id = two_phase
        .initiate(query.clone(), ids.clone(), "agent-1".to_string(), "model-a".to_string(), None)
        .await
        .unwrap();
    let completed = two_phase
        .complete(txn_id, response.clone(), None, None, None)
        .await
        .unwrap();

    let created = single_shot
        .create(
            query,
            response,
            ids,
            "agent-1".to_string(),
            "model-a".to_string(),
            None,
            None,
            None,
            None,
        )
        .await
        .unwrap();

    assert_eq!(completed.scores.len(), created.scores.len());
    for (a, b) in completed.scores.iter().zip(created.scores.iter()) {
        assert_eq!(a.memory_id, b.memory_id);
        assert!((a.score - b.score).abs() < 1e-12);
        assert!((a.raw_score - b.raw_score).abs() < 1e-12);
    }
}

#[tokio::test]
async fn snapshot_scoring_survives_deletion_between_initiate_and_complete() {
    let (storage, pipe) = pipeline();
    let m1 = seed_memory(&storage, "alpha memory");
    let m2 = seed_memory(&storage, "beta memory");

    let txn_id = pipe
        .initiate(
            "a query".to_string(),
            vec![m1, m2],
            "agent-1".to_string(),
            "model-a".to_string(),
            None,
        )
        .await
        .unwrap();

    storage
        .transaction(|txn| memory_crud::soft_delete_memory(txn, m2))
        .unwrap();

    let result = pipe
        .complete(txn_id, "a response".to_string(), None, None, None)
        .await
        .unwrap();

    let scored_ids: Vec<Uuid> = result.scores.iter().map(|s| s.memory_id).collect();
    assert!(scored_ids.contains(&m1));
    assert!(scored_ids.contains(&m2));
}

#[tokio::test]
async fn completing_a_non_pending_transaction_is_a_conflict() {
    let (storage, pipe) = pipeline();
    let m1 = seed_memory(&storage, "only memory");

    let txn_id = pipe
        .initiate("q".to_string(), vec![m1], "agent-1".to_string(), "model-a".to_string(), None)
        .await
        .unwrap();
    pipe.complete(txn_id, "r".to_string(), None, None, None).await.unwrap();

    let err = pipe
        .complete(txn_id, "r2".to_string(), None, None, None)
        .await
        .unwrap_err();
    assert_eq!(err.http_status(), 409);
}

#[tokio::test]
async fn completing_unknown_transaction_is_not_found() {
    let (_, pipe) = pipeline();
    let err = pipe
        .complete(Uuid::nil(), "r".to_string(), None, None, None)
        .await
        .unwrap_err();
    assert_eq!(err.http_status(), 404);
}
