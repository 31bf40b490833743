//! Graph-level totals derived from per-element values.

use serde::{Deserialize, Serialize};

use crate::model::{AntennaSettings, Edge, Node};

/// Derived totals of a graph. Never authored directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMetrics {
    pub total_capacity: f64,
    pub total_consumption: f64,
}

/// Sum capacities and consumptions.
///
/// Antenna consumption only counts while `settings.consumption_enabled` is
/// set; an antenna with no stored consumption contributes nothing.
pub fn compute_metrics(nodes: &[Node], edges: &[Edge], settings: &AntennaSettings) -> GraphMetrics {
    let total_capacity = edges.iter().fold(0.0, |acc, e| acc + e.capacity);
    let edge_consumption = edges.iter().fold(0.0, |acc, e| acc + e.consumption);

    let antenna_consumption = if settings.consumption_enabled {
        nodes
            .iter()
            .filter(|n| n.is_antenna())
            .filter_map(|n| n.consumption)
            .fold(0.0, |acc, c| acc + c)
    } else {
        0.0
    };

    GraphMetrics {
        total_capacity,
        total_consumption: edge_consumption + antenna_consumption,
    }
}
