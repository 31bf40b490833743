//! Integration tests for the complete Netopo pipeline
//!
//! These tests verify end-to-end functionality across crates:
//! - Editor session → graph body → persistence API → file store
//! - Stored graph → reopened session → partial update
//!
//! Run with: cargo test --test integration_tests

use netopo_core::{
    AntennaSettings, Command, EditorSession, Event, Mode, NodeKind,
};
use netopo_store::{open_store, GraphService, StoreBackend, StoreConfig};
use serde_json::json;
use tempfile::tempdir;

fn added_node(events: &[Event]) -> String {
    events
        .iter()
        .find_map(|e| match e {
            Event::NodeAdded(id) => Some(id.clone()),
            _ => None,
        })
        .expect("NodeAdded event")
}

// ============================================================================
// Session → service
// ============================================================================

#[tokio::test]
async fn test_session_snapshot_round_trips_through_file_store() {
    let dir = tempdir().unwrap();
    let config = StoreConfig {
        backend: StoreBackend::File,
        data_dir: dir.path().to_path_buf(),
    };
    let service = GraphService::new(open_store(&config).await.unwrap());

    let mut session = EditorSession::new(Mode::RV);
    let router = added_node(
        &session
            .apply(Command::AddNode { kind: NodeKind::Router, x: 0.0, y: 0.0 })
            .unwrap(),
    );
    let antenna = added_node(
        &session
            .apply(Command::AddNode { kind: NodeKind::Antenna, x: 50.0, y: 0.0 })
            .unwrap(),
    );
    session
        .apply(Command::AddEdge { source: router.clone(), target: antenna.clone() })
        .unwrap();
    session
        .apply(Command::SetEdgeParameters {
            id: "edge-1".to_string(),
            capacity: Some(2.0),
            distance: Some(3.0),
            base_consumption: None,
        })
        .unwrap();
    session
        .apply(Command::SetAntennaSettings(AntennaSettings {
            consumption_enabled: true,
            consumption_radius_enabled: true,
            consumption_base: 2.0,
        }))
        .unwrap();
    session
        .apply(Command::SetAntennaRadius { id: antenna.clone(), radius: 10.0 })
        .unwrap();

    let created = service
        .create(session.to_body("campus").unwrap())
        .await
        .unwrap();

    // edge: 100 × 2 × 3, antenna: 2 × 10
    assert_eq!(created.metrics.total_capacity, 2.0);
    assert_eq!(created.metrics.total_consumption, 620.0);
    assert_eq!(created.metrics, session.metrics());

    // Reopen from disk and keep editing.
    let reopened_service = GraphService::new(open_store(&config).await.unwrap());
    let stored = reopened_service.get(&created.id).await.unwrap();
    assert_eq!(stored, created);

    let mut session = EditorSession::from_graph(&stored);
    assert_eq!(session.halo(&antenna).map(|h| h.diameter), Some(20.0));
    session.apply(Command::RemoveNode { id: antenna }).unwrap();

    let updated = reopened_service
        .update(&created.id, session.to_body("campus v2").unwrap())
        .await
        .unwrap();
    assert_eq!(updated.document.name, "campus v2");
    assert!(updated.document.edges.is_empty());
    assert_eq!(updated.metrics.total_capacity, 0.0);
    assert_eq!(updated.metrics.total_consumption, 0.0);
}

// ============================================================================
// Listing + validation across the boundary
// ============================================================================

#[tokio::test]
async fn test_rejected_graph_never_lists() {
    let config = StoreConfig {
        backend: StoreBackend::Memory,
        ..StoreConfig::default()
    };
    let service = GraphService::new(open_store(&config).await.unwrap());

    service
        .create(json!({ "name": "ok", "mode": "SC" }))
        .await
        .unwrap();
    assert!(service
        .create(json!({ "name": "bad", "mode": "Invalid" }))
        .await
        .is_err());

    let graphs = service.list(None).await.unwrap();
    assert_eq!(graphs.len(), 1);
    assert_eq!(graphs[0].document.name, "ok");
    assert!(service.list(Some("RV")).await.unwrap().is_empty());
    assert_eq!(service.list(Some("SC")).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_cloud_session_keeps_servers_and_tasks() {
    let service = GraphService::new(
        open_store(&StoreConfig {
            backend: StoreBackend::Memory,
            ..StoreConfig::default()
        })
        .await
        .unwrap(),
    );

    let mut session = EditorSession::new(Mode::Cloud);
    session
        .apply(Command::AddNode { kind: NodeKind::Cloud, x: 0.0, y: 0.0 })
        .unwrap();
    let mut body = session.to_body("cloud lab").unwrap();
    body["nodes"][0]["servers"] = json!([{ "id": "srv-1", "name": "alpha", "capacity": 8, "consumption": 3 }]);

    let created = service.create(body).await.unwrap();
    let node = &created.document.nodes[0];
    assert_eq!(node.kind, NodeKind::Cloud);
    assert_eq!(node.servers.len(), 1);
    assert_eq!(node.servers[0].name, "alpha");
}
