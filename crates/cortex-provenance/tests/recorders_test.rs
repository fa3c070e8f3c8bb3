use std::collections::HashMap;

use cortex_core::models::{MemoryCriticality, MemoryType, ScoreType, Statement};
use cortex_provenance::recorders::StatementScore;
use cortex_provenance::ProvenanceGraph;
use cortex_storage::queries::graph_edges;
use cortex_storage::StorageEngine;

#[test]
fn record_transaction_creates_interaction_and_current_attribution_edges() {
    let storage = StorageEngine::open_in_memory().unwrap();
    let memory_ids = vec![uuid::Uuid::now_v7(), uuid::Uuid::now_v7()];
    let scores = vec![0.3, 0.7];

    let interaction = storage
        .transaction(|txn| {
            ProvenanceGraph::record_transaction(
                txn,
                "user-1",
                "what happened",
                "this happened",
                "agent-1",
                0.01,
                &memory_ids,
                &scores,
                ScoreType::Eas,
                None,
                HashMap::new(),
            )
        })
        .unwrap();

    for (&memory_id, &score) in memory_ids.iter().zip(scores.iter()) {
        let version = storage
            .with_conn(|conn| graph_edges::current_version(conn, memory_id, interaction.id))
            .unwrap();
        assert_eq!(version, Some(1));
        let history = storage
            .with_conn(|conn| graph_edges::attribution_edge_history(conn, memory_id, interaction.id))
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].score, score);
    }
}

#[test]
fn record_memory_creation_links_interaction_memory_and_embedding() {
    let storage = StorageEngine::open_in_memory().unwrap();
    let interaction = storage
        .transaction(|txn| {
            ProvenanceGraph::record_transaction(
                txn,
                "user-2",
                "q",
                "r",
                "agent-1",
                0.0,
                &[],
                &[],
                ScoreType::Eas,
                None,
                HashMap::new(),
            )
        })
        .unwrap();

    let (mem_node, emb_node) = storage
        .transaction(|txn| {
            ProvenanceGraph::record_memory_creation(
                txn,
                interaction.id,
                "a new memory",
                "user-2",
                MemoryType::Raw,
                "vec://abc",
                "all-MiniLM-L6-v2",
                384,
                5,
                MemoryCriticality::Normal,
                HashMap::new(),
            )
        })
        .unwrap();

    let fetched = storage.with_conn(|conn| cortex_storage::queries::graph_nodes::get_memory_node(conn, mem_node.id)).unwrap();
    assert!(fetched.is_some());
    let fetched_emb = storage.with_conn(|conn| cortex_storage::queries::graph_nodes::get_embedding(conn, emb_node.id)).unwrap();
    assert!(fetched_emb.is_some());
    assert_eq!(mem_node.shard_id, cortex_core::ids::shard_id_for_user("user-2"));
}

#[test]
fn update_attribution_supersedes_old_version_and_keeps_exactly_one_current() {
    let storage = StorageEngine::open_in_memory().unwrap();
    let memory_id = uuid::Uuid::now_v7();
    let interaction = storage
        .transaction(|txn| {
            ProvenanceGraph::record_transaction(
                txn,
                "user-3",
                "q",
                "r",
                "agent-1",
                0.0,
                &[memory_id],
                &[0.5],
                ScoreType::Eas,
                None,
                HashMap::new(),
            )
        })
        .unwrap();

    storage
        .transaction(|txn| {
            ProvenanceGraph::update_attribution(
                txn,
                memory_id,
                interaction.id,
                0.9,
                ScoreType::Calibrated,
                HashMap::new(),
            )
        })
        .unwrap();

    let history = storage
        .with_conn(|conn| graph_edges::attribution_edge_history(conn, memory_id, interaction.id))
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history.iter().filter(|e| e.is_current).count(), 1);
    let current = history.iter().find(|e| e.is_current).unwrap();
    assert_eq!(current.version, 2);
    assert_eq!(current.score, 0.9);
}

#[test]
fn record_contextcite_creates_one_edge_per_scored_statement() {
    let storage = StorageEngine::open_in_memory().unwrap();
    let interaction = storage
        .transaction(|txn| {
            ProvenanceGraph::record_transaction(
                txn,
                "user-4",
                "q",
                "r",
                "agent-1",
                0.0,
                &[],
                &[],
                ScoreType::Eas,
                None,
                HashMap::new(),
            )
        })
        .unwrap();
    let memory_id = uuid::Uuid::now_v7();

    let response = storage
        .transaction(|txn| {
            ProvenanceGraph::record_contextcite(
                txn,
                interaction.id,
                vec![Statement { text: "claim one".into(), index: 0 }],
                &[StatementScore { memory_id, statement_index: 0, score: 0.8 }],
            )
        })
        .unwrap();

    let fetched = storage
        .with_conn(|conn| cortex_storage::queries::graph_nodes::get_response(conn, response.id))
        .unwrap()
        .unwrap();
    assert_eq!(fetched.statements.len(), 1);
}
