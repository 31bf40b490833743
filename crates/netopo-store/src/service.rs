//! The graph persistence API.
//!
//! Each operation validates its input, performs one read-modify-write
//! against the store and reports failures synchronously. Metrics are
//! recomputed from the full post-merge document before every write.

use chrono::Utc;
use netopo_core::{apply_patch, parse_graph, Graph, Mode, ValidationError};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::{GraphStore, StoreError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("graph `{0}` not found")]
    NotFound(String),
    #[error("storage failure: {0}")]
    Storage(#[source] StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(id),
            other => Self::Storage(other),
        }
    }
}

#[derive(Clone)]
pub struct GraphService {
    store: Arc<dyn GraphStore>,
}

impl GraphService {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Validate a full body and store it under a fresh id.
    pub async fn create(&self, body: Value) -> Result<Graph, ServiceError> {
        let document = parse_graph(body)?;
        let graph = Graph::create(Uuid::new_v4().to_string(), document, Utc::now());
        self.store.insert(graph.clone()).await?;
        tracing::info!(
            graph_id = %graph.id,
            mode = %graph.mode(),
            nodes = graph.document.nodes.len(),
            edges = graph.document.edges.len(),
            "graph created"
        );
        Ok(graph)
    }

    /// List graphs, optionally filtered by the external `gameType` value.
    ///
    /// A filter that names no known mode matches nothing.
    pub async fn list(&self, game_type: Option<&str>) -> Result<Vec<Graph>, ServiceError> {
        let mode = match game_type.map(str::trim).filter(|s| !s.is_empty()) {
            None => None,
            Some(raw) => match Mode::parse(raw) {
                Some(mode) => Some(mode),
                None => {
                    tracing::debug!(game_type = raw, "unknown gameType filter");
                    return Ok(Vec::new());
                }
            },
        };
        Ok(self.store.list(mode).await?)
    }

    pub async fn get(&self, id: &str) -> Result<Graph, ServiceError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))
    }

    /// Merge a full or partial body into the stored graph.
    pub async fn update(&self, id: &str, patch: Value) -> Result<Graph, ServiceError> {
        let current = self.get(id).await?;
        let document = apply_patch(&current, &patch)?;
        let updated = current.revise(document, Utc::now());
        self.store.replace(updated.clone()).await?;
        tracing::info!(
            graph_id = %updated.id,
            total_capacity = updated.metrics.total_capacity,
            total_consumption = updated.metrics.total_consumption,
            "graph updated"
        );
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        if !self.store.remove(id).await? {
            return Err(ServiceError::NotFound(id.to_string()));
        }
        tracing::info!(graph_id = id, "graph deleted");
        Ok(())
    }

    /// Change only `minimumConsumption`. The body must carry it as a number.
    pub async fn set_minimum_consumption(&self, id: &str, body: Value) -> Result<Graph, ServiceError> {
        let current = self.get(id).await?;
        let value = match body.get("minimumConsumption") {
            Some(Value::Number(n)) => n.as_f64(),
            Some(other) => {
                return Err(ValidationError::single(format!(
                    "minimumConsumption must be a number (got {other})"
                ))
                .into())
            }
            None => None,
        };
        let Some(value) = value.filter(|v| v.is_finite()) else {
            return Err(ValidationError::single("minimumConsumption is required").into());
        };

        let mut document = current.document.clone();
        document.minimum_consumption = Some(value);
        let updated = current.revise(document, Utc::now());
        self.store.replace(updated.clone()).await?;
        tracing::info!(graph_id = %updated.id, minimum_consumption = value, "minimum consumption set");
        Ok(updated)
    }
}
