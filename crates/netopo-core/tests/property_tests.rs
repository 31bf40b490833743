//! Property-based tests for the consumption model
//!
//! 1. Edge and antenna formulas hold for arbitrary non-negative inputs
//! 2. Metrics always equal the element sums
//! 3. A partial update recomputes from the merged document

use approx::assert_relative_eq;
use chrono::Utc;
use netopo_core::*;
use proptest::prelude::*;
use serde_json::json;

// ============================================================================
// Strategies
// ============================================================================

fn amount() -> impl Strategy<Value = f64> {
    0.0f64..1_000.0
}

fn edge_strategy() -> impl Strategy<Value = Edge> {
    (amount(), amount(), amount()).prop_map(|(capacity, distance, base)| {
        let mut e = Edge::new("edge", "a", "b");
        e.capacity = capacity;
        e.distance = distance;
        e.base_consumption = base;
        e.consumption = edge_consumption(base, capacity, distance);
        e
    })
}

fn node_strategy() -> impl Strategy<Value = Node> {
    (
        prop_oneof![
            Just(NodeKind::Antenna),
            Just(NodeKind::Router),
            Just(NodeKind::User),
        ],
        proptest::option::of(amount()),
    )
        .prop_map(|(kind, consumption)| {
            let mut n = Node::new("node", kind, 0.0, 0.0);
            n.consumption = consumption;
            n
        })
}

fn settings_strategy() -> impl Strategy<Value = AntennaSettings> {
    (any::<bool>(), any::<bool>(), amount()).prop_map(|(enabled, radius_enabled, base)| {
        AntennaSettings {
            consumption_enabled: enabled,
            consumption_radius_enabled: radius_enabled,
            consumption_base: base,
        }
    })
}

// ============================================================================
// Formulas
// ============================================================================

proptest! {
    #[test]
    fn edge_consumption_is_product(b in amount(), c in amount(), d in amount()) {
        prop_assert_eq!(edge_consumption(b, c, d), b * c * d);
    }

    #[test]
    fn disabled_antennas_cost_nothing(radius_enabled in any::<bool>(), base in amount(), r in amount()) {
        let settings = AntennaSettings {
            consumption_enabled: false,
            consumption_radius_enabled: radius_enabled,
            consumption_base: base,
        };
        prop_assert_eq!(antenna_consumption(&settings, r), 0.0);
    }

    #[test]
    fn enabled_antenna_formula(base in amount(), r in amount()) {
        let scaled = AntennaSettings { consumption_enabled: true, consumption_radius_enabled: true, consumption_base: base };
        let flat = AntennaSettings { consumption_radius_enabled: false, ..scaled };
        prop_assert_eq!(antenna_consumption(&scaled, r), base * r);
        prop_assert_eq!(antenna_consumption(&flat, r), base);
    }
}

// ============================================================================
// Metrics
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn metrics_equal_element_sums(
        nodes in proptest::collection::vec(node_strategy(), 0..12),
        edges in proptest::collection::vec(edge_strategy(), 0..12),
        settings in settings_strategy(),
    ) {
        let m = compute_metrics(&nodes, &edges, &settings);

        let capacity: f64 = edges.iter().map(|e| e.capacity).fold(0.0, |a, b| a + b);
        let mut consumption: f64 = edges.iter().map(|e| e.consumption).fold(0.0, |a, b| a + b);
        if settings.consumption_enabled {
            consumption += nodes
                .iter()
                .filter(|n| n.kind == NodeKind::Antenna)
                .filter_map(|n| n.consumption)
                .fold(0.0, |a, b| a + b);
        }

        prop_assert!((m.total_capacity - capacity).abs() <= 1e-6 * capacity.max(1.0));
        prop_assert!((m.total_consumption - consumption).abs() <= 1e-6 * consumption.max(1.0));
    }
}

// ============================================================================
// Partial updates
// ============================================================================

#[test]
fn partial_update_uses_merged_document() {
    let body = json!({
        "name": "campus",
        "mode": "RV",
        "antennaSettings": { "consumptionEnabled": true },
        "nodes": [
            { "id": "antenna-1", "type": "antenna", "x": 0, "y": 0, "radius": 10, "consumption": 25 }
        ],
        "edges": [
            { "id": "edge-1", "source": "a", "target": "b", "capacity": 1 },
            { "id": "edge-2", "source": "a", "target": "c", "capacity": 2 }
        ]
    });
    let graph = Graph::create("g", parse_graph(body).unwrap(), Utc::now());
    assert_relative_eq!(graph.metrics.total_capacity, 3.0);

    let patch = json!({
        "edges": [
            { "id": "edge-3", "source": "a", "target": "b", "capacity": 3 },
            { "id": "edge-4", "source": "a", "target": "c", "capacity": 4 }
        ]
    });
    let doc = apply_patch(&graph, &patch).unwrap();
    let updated = graph.revise(doc, Utc::now());

    assert_relative_eq!(updated.metrics.total_capacity, 7.0);
    // Antenna survives the edge-only patch and still counts.
    assert_relative_eq!(updated.metrics.total_consumption, 225.0);
}
