use chrono::Utc;
use cortex_core::models::{AgentCostConfig, CalibrationPair, Contradiction, HealthSnapshot};
use cortex_storage::queries::peripheral_ops;
use cortex_storage::StorageEngine;
use uuid::Uuid;

#[test]
fn calibration_pair_insert_persists_a_row() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let pair = CalibrationPair {
        id: Uuid::now_v7(),
        memory_id: Uuid::now_v7(),
        transaction_id: Uuid::now_v7(),
        eas_score: 0.42,
        exact_score: 0.5,
        method: "contextcite".to_string(),
        created_at: Utc::now(),
    };

    engine
        .transaction(|txn| peripheral_ops::insert_calibration_pair(txn, &pair))
        .unwrap();

    let count: i64 = engine
        .with_conn(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM calibration_pairs WHERE id = ?1",
                [pair.id.to_string()],
                |row| row.get(0),
            )
            .map_err(|e| cortex_core::CortexError::StoreError(e.to_string()))
        })
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn agent_cost_config_upsert_round_trips_and_overwrites() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let config = AgentCostConfig {
        agent_id: "agent-1".to_string(),
        input_token_cost: 0.001,
        output_token_cost: 0.002,
        provider: Some("anthropic".to_string()),
        model_id: Some("model-a".to_string()),
        updated_at: Utc::now(),
    };
    engine
        .transaction(|txn| peripheral_ops::upsert_agent_cost_config(txn, &config))
        .unwrap();

    let loaded = engine
        .with_conn(|conn| peripheral_ops::get_agent_cost_config(conn, "agent-1"))
        .unwrap()
        .expect("config round-trips");
    assert_eq!(loaded.input_token_cost, 0.001);
    assert_eq!(loaded.provider.as_deref(), Some("anthropic"));

    let updated = AgentCostConfig {
        input_token_cost: 0.003,
        ..config
    };
    engine
        .transaction(|txn| peripheral_ops::upsert_agent_cost_config(txn, &updated))
        .unwrap();
    let reloaded = engine
        .with_conn(|conn| peripheral_ops::get_agent_cost_config(conn, "agent-1"))
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.input_token_cost, 0.003);
}

#[test]
fn missing_agent_cost_config_returns_none() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let loaded = engine
        .with_conn(|conn| peripheral_ops::get_agent_cost_config(conn, "nobody"))
        .unwrap();
    assert!(loaded.is_none());
}

#[test]
fn contradictions_insert_and_list_filters_by_resolved() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let open = Contradiction {
        id: Uuid::now_v7(),
        memory_id_1: Uuid::now_v7(),
        memory_id_2: Uuid::now_v7(),
        contradiction_type: "factual".to_string(),
        confidence: 0.8,
        detected_at: Utc::now(),
        resolved: false,
    };
    let resolved = Contradiction {
        id: Uuid::now_v7(),
        resolved: true,
        ..open.clone()
    };

    engine.transaction(|txn| peripheral_ops::insert_contradiction(txn, &open)).unwrap();
    engine.transaction(|txn| peripheral_ops::insert_contradiction(txn, &resolved)).unwrap();

    let all = engine.with_conn(|conn| peripheral_ops::list_contradictions(conn, None, 10)).unwrap();
    assert_eq!(all.len(), 2);

    let unresolved = engine.with_conn(|conn| peripheral_ops::list_contradictions(conn, Some(false), 10)).unwrap();
    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0].id, open.id);
}

#[test]
fn health_snapshots_insert_and_list_scoped_to_agent() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let snapshot = HealthSnapshot {
        id: Uuid::now_v7(),
        agent_id: "agent-1".to_string(),
        contradiction_rate: 0.1,
        retrieval_efficiency: 0.9,
        semantic_drift: 0.05,
        memory_quality: 0.95,
        timestamp: Utc::now(),
    };
    let other_agent = HealthSnapshot {
        id: Uuid::now_v7(),
        agent_id: "agent-2".to_string(),
        ..snapshot.clone()
    };

    engine.transaction(|txn| peripheral_ops::insert_health_snapshot(txn, &snapshot)).unwrap();
    engine.transaction(|txn| peripheral_ops::insert_health_snapshot(txn, &other_agent)).unwrap();

    let agent_1_snapshots = engine
        .with_conn(|conn| peripheral_ops::list_health_snapshots(conn, "agent-1", 10))
        .unwrap();
    assert_eq!(agent_1_snapshots.len(), 1);
    assert_eq!(agent_1_snapshots[0].id, snapshot.id);
}
