use chrono::Utc;
use cortex_core::models::*;
use cortex_storage::queries::{attribution_ops, graph_edges, graph_nodes, memory_crud};
use cortex_storage::StorageEngine;
use std::collections::HashMap;
use uuid::Uuid;

fn make_memory(id: Uuid) -> Memory {
    Memory {
        id,
        content: "hello".to_string(),
        embedding: Some(vec![1.0, 0.0, 0.0]),
        tokens: 3,
        agent_id: "agent-1".to_string(),
        tier: Tier::Warm,
        criticality: 0.5,
        metadata: HashMap::new(),
        retrieval_count: 0,
        created_at: Utc::now(),
        last_accessed: None,
        deleted_at: None,
    }
}

#[test]
fn migrations_create_schema_and_are_idempotent() {
    let engine = StorageEngine::open_in_memory().unwrap();
    // Re-opening the same in-memory handle isn't possible, but running the
    // migration set again on an already-migrated connection must be a no-op.
    engine.with_conn(|conn| {
        cortex_storage::migrations::run_migrations(conn)?;
        Ok(())
    }).unwrap();
}

#[test]
fn memory_insert_and_fetch_round_trip() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let id = Uuid::now_v7();
    let memory = make_memory(id);

    engine.with_conn(|conn| memory_crud::insert_memory(conn, &memory)).unwrap();
    let fetched = engine.with_conn(|conn| memory_crud::get_memory(conn, id)).unwrap();

    let fetched = fetched.expect("memory should round-trip");
    assert_eq!(fetched.content, "hello");
    assert_eq!(fetched.embedding, Some(vec![1.0, 0.0, 0.0]));
}

#[test]
fn snapshot_fetch_ignores_soft_deletion_non_snapshot_excludes_it() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let id = Uuid::now_v7();
    let memory = make_memory(id);
    engine.with_conn(|conn| memory_crud::insert_memory(conn, &memory)).unwrap();
    engine.with_conn(|conn| memory_crud::soft_delete_memory(conn, id)).unwrap();

    let snapshot_true = engine
        .with_conn(|conn| memory_crud::fetch_memories_for_eas(conn, &[id], true))
        .unwrap();
    assert_eq!(snapshot_true.len(), 1, "snapshot honors initiate-time set (§4.C.4 step 2)");

    let snapshot_false = engine
        .with_conn(|conn| memory_crud::fetch_memories_for_eas(conn, &[id], false))
        .unwrap();
    assert_eq!(snapshot_false.len(), 0, "single-shot filters deleted_at");
}

#[test]
fn welford_upsert_matches_two_pass_variance() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let memory_id = Uuid::now_v7();
    let observations = [0.7, 0.3, 0.9, 0.5];

    for &x in &observations {
        engine
            .with_conn(|conn| attribution_ops::upsert_memory_profile(conn, memory_id, x, Utc::now()))
            .unwrap();
    }

    let profile = engine
        .with_conn(|conn| attribution_ops::get_profile(conn, memory_id))
        .unwrap()
        .unwrap();

    let n = observations.len() as f64;
    let mean = observations.iter().sum::<f64>() / n;
    let m2: f64 = observations.iter().map(|x| (x - mean).powi(2)).sum();
    let variance = m2 / (n - 1.0);

    assert!((profile.mean_attribution - mean).abs() < 1e-9);
    assert_eq!(profile.retrieval_count, observations.len() as i64);
    assert!((profile.variance() - variance).abs() < 1e-6, "invariant 5");
}

#[test]
fn attribution_edge_versioning_keeps_exactly_one_current_row() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let source_id = Uuid::now_v7();
    let target_id = Uuid::now_v7();

    let scores = [0.7, 0.65, 0.58];
    for (i, &score) in scores.iter().enumerate() {
        engine
            .transaction(|txn| {
                let current = graph_edges::current_version(txn, source_id, target_id)?;
                if current.is_some() {
                    graph_edges::supersede_current(txn, source_id, target_id)?;
                }
                let edge = AttributionEdge {
                    id: Uuid::now_v7(),
                    created_at: Utc::now(),
                    source_id,
                    target_id,
                    score,
                    score_type: if i == 0 { ScoreType::Eas } else { ScoreType::Calibrated },
                    version: current.unwrap_or(0) + 1,
                    is_current: true,
                    metadata: HashMap::new(),
                };
                graph_edges::insert_attribution_edge(txn, &edge)
            })
            .unwrap();
    }

    let history = engine
        .with_conn(|conn| graph_edges::attribution_edge_history(conn, source_id, target_id))
        .unwrap();

    assert_eq!(history.len(), 3, "S5: three rows total");
    let current_rows: Vec<_> = history.iter().filter(|e| e.is_current).collect();
    assert_eq!(current_rows.len(), 1, "invariant 4: exactly one is_current row");
    assert_eq!(current_rows[0].version, 3);
    assert_eq!(current_rows[0].score, 0.58);

    let versions: Vec<i64> = history.iter().map(|e| e.version).collect();
    assert_eq!(versions, vec![1, 2, 3], "versions dense and contiguous from 1");
}

#[test]
fn footprint_isolation_between_disjoint_users() {
    let engine = StorageEngine::open_in_memory().unwrap();

    let alice_interaction = InteractionNode {
        id: Uuid::now_v7(),
        user_id: "alice".to_string(),
        query: "q".to_string(),
        response: "r".to_string(),
        timestamp: Utc::now(),
        agent_id: "agent-1".to_string(),
        transaction_cost: 0.0,
        metadata: HashMap::new(),
    };
    let bob_interaction = InteractionNode {
        id: Uuid::now_v7(),
        user_id: "bob".to_string(),
        query: "q2".to_string(),
        response: "r2".to_string(),
        timestamp: Utc::now(),
        agent_id: "agent-1".to_string(),
        transaction_cost: 0.0,
        metadata: HashMap::new(),
    };
    engine.with_conn(|conn| graph_nodes::insert_interaction(conn, &alice_interaction)).unwrap();
    engine.with_conn(|conn| graph_nodes::insert_interaction(conn, &bob_interaction)).unwrap();

    let alice_memory_id = Uuid::now_v7();
    let alice_memory = MemoryNode {
        id: alice_memory_id,
        content: "alice memory".to_string(),
        memory_type: MemoryType::Raw,
        status: MemoryStatus::Active,
        shard_id: 0,
        slice_id: 0,
        created_at: Utc::now(),
        created_by_user_id: "alice".to_string(),
        token_count: 2,
        criticality: MemoryCriticality::Normal,
        metadata: HashMap::new(),
        deletion_scheduled_at: None,
    };
    engine.with_conn(|conn| graph_nodes::insert_memory_node(conn, &alice_memory)).unwrap();
    engine
        .with_conn(|conn| {
            graph_edges::insert_creation_edge(
                conn,
                &CreationEdge {
                    id: Uuid::now_v7(),
                    source_id: alice_interaction.id,
                    target_id: alice_memory_id,
                    created_at: Utc::now(),
                    metadata: HashMap::new(),
                },
            )
        })
        .unwrap();

    // Bob's interaction retrieves Alice's memory with a positive score (S6).
    engine
        .with_conn(|conn| {
            graph_edges::insert_attribution_edge(
                conn,
                &AttributionEdge {
                    id: Uuid::now_v7(),
                    created_at: Utc::now(),
                    source_id: alice_memory_id,
                    target_id: bob_interaction.id,
                    score: 0.92,
                    score_type: ScoreType::Eas,
                    version: 1,
                    is_current: true,
                    metadata: HashMap::new(),
                },
            )
        })
        .unwrap();

    let alice_footprint = engine
        .with_conn(|conn| cortex_storage::queries::footprint_ops::derivation_closure(conn, "alice"))
        .unwrap();
    let bob_footprint = engine
        .with_conn(|conn| cortex_storage::queries::footprint_ops::derivation_closure(conn, "bob"))
        .unwrap();

    assert!(alice_footprint.memory_node_ids.contains(&alice_memory_id));
    assert!(!bob_footprint.memory_node_ids.contains(&alice_memory_id));

    let alice_influence = engine
        .with_conn(|conn| cortex_storage::queries::footprint_ops::influence_footprint(conn, "alice"))
        .unwrap();
    assert!(alice_influence.contains(&bob_interaction.id), "S6: Bob's interaction in I(alice)");
    assert!(
        !alice_influence.contains(&alice_interaction.id),
        "Alice's own interaction is not in I(alice)"
    );
}

#[test]
fn zero_score_attribution_is_not_influence() {
    let engine = StorageEngine::open_in_memory().unwrap();

    let alice_interaction_id = Uuid::now_v7();
    let bob_interaction_id = Uuid::now_v7();
    engine
        .with_conn(|conn| {
            graph_nodes::insert_interaction(
                conn,
                &InteractionNode {
                    id: alice_interaction_id,
                    user_id: "alice".to_string(),
                    query: "q".to_string(),
                    response: "r".to_string(),
                    timestamp: Utc::now(),
                    agent_id: "agent-1".to_string(),
                    transaction_cost: 0.0,
                    metadata: HashMap::new(),
                },
            )
        })
        .unwrap();

    let memory_id = Uuid::now_v7();
    engine
        .with_conn(|conn| {
            graph_nodes::insert_memory_node(
                conn,
                &MemoryNode {
                    id: memory_id,
                    content: "m".to_string(),
                    memory_type: MemoryType::Raw,
                    status: MemoryStatus::Active,
                    shard_id: 0,
                    slice_id: 0,
                    created_at: Utc::now(),
                    created_by_user_id: "alice".to_string(),
                    token_count: 1,
                    criticality: MemoryCriticality::Normal,
                    metadata: HashMap::new(),
                    deletion_scheduled_at: None,
                },
            )
        })
        .unwrap();
    engine
        .with_conn(|conn| {
            graph_edges::insert_creation_edge(
                conn,
                &CreationEdge {
                    id: Uuid::now_v7(),
                    source_id: alice_interaction_id,
                    target_id: memory_id,
                    created_at: Utc::now(),
                    metadata: HashMap::new(),
                },
            )
        })
        .unwrap();
    engine
        .with_conn(|conn| {
            graph_edges::insert_attribution_edge(
                conn,
                &AttributionEdge {
                    id: Uuid::now_v7(),
                    created_at: Utc::now(),
                    source_id: memory_id,
                    target_id: bob_interaction_id,
                    score: 0.0,
                    score_type: ScoreType::Eas,
                    version: 1,
                    is_current: true,
                    metadata: HashMap::new(),
                },
            )
        })
        .unwrap();

    let influence = engine
        .with_conn(|conn| cortex_storage::queries::footprint_ops::influence_footprint(conn, "alice"))
        .unwrap();
    assert!(!influence.contains(&bob_interaction_id), "S7: zero score is not influence");
}
