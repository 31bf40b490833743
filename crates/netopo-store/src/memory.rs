//! Volatile store, used for tests and `--store memory`.

use async_trait::async_trait;
use netopo_core::{Graph, GraphId, Mode};
use parking_lot::RwLock;
use std::collections::BTreeMap;

use crate::{sort_for_listing, GraphStore, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    graphs: RwLock<BTreeMap<GraphId, Graph>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.graphs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.read().is_empty()
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    async fn insert(&self, graph: Graph) -> Result<(), StoreError> {
        self.graphs.write().insert(graph.id.clone(), graph);
        Ok(())
    }

    async fn list(&self, mode: Option<Mode>) -> Result<Vec<Graph>, StoreError> {
        let mut graphs: Vec<Graph> = self
            .graphs
            .read()
            .values()
            .filter(|g| mode.map_or(true, |m| g.mode() == m))
            .cloned()
            .collect();
        sort_for_listing(&mut graphs);
        Ok(graphs)
    }

    async fn get(&self, id: &str) -> Result<Option<Graph>, StoreError> {
        Ok(self.graphs.read().get(id).cloned())
    }

    async fn replace(&self, graph: Graph) -> Result<(), StoreError> {
        let mut graphs = self.graphs.write();
        match graphs.get_mut(&graph.id) {
            Some(slot) => {
                *slot = graph;
                Ok(())
            }
            None => Err(StoreError::NotFound(graph.id)),
        }
    }

    async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.graphs.write().remove(id).is_some())
    }
}
