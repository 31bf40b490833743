//! Netopo graph storage
//!
//! ```text
//! ┌──────────────┐     ┌───────────────┐     ┌──────────────────┐
//! │  HTTP / CLI  │────►│ GraphService  │────►│  dyn GraphStore  │
//! └──────────────┘     │ validate      │     ├──────────────────┤
//!                      │ merge         │     │ MemoryStore      │
//!                      │ metrics       │     │ FileStore (JSON) │
//!                      └───────────────┘     └──────────────────┘
//! ```
//!
//! The store is a plain document collection: it assigns nothing and checks
//! nothing. [`GraphService`] owns ids, timestamps, validation and metric
//! recomputation, and every operation is a single read-modify-write with
//! last-write-wins semantics.

pub mod file;
pub mod memory;
pub mod service;


use async_trait::async_trait;
use netopo_core::{Graph, GraphId, Mode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use service::{GraphService, ServiceError};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("graph `{0}` not found")]
    NotFound(GraphId),
    #[error("storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt graph document {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("graph document {path} holds `_id` {id}, which does not match its file name")]
    Misplaced { path: PathBuf, id: GraphId },
    #[error("cannot encode graph `{id}`: {source}")]
    Encode {
        id: GraphId,
        #[source]
        source: serde_json::Error,
    },
}

// ============================================================================
// Store interface
// ============================================================================

/// One logical collection of graph documents.
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn insert(&self, graph: Graph) -> Result<(), StoreError>;

    /// All graphs, or only those in `mode`.
    async fn list(&self, mode: Option<Mode>) -> Result<Vec<Graph>, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<Graph>, StoreError>;

    /// Replace an existing graph. Fails with `NotFound` if it is gone.
    async fn replace(&self, graph: Graph) -> Result<(), StoreError>;

    /// Returns whether a graph was removed.
    async fn remove(&self, id: &str) -> Result<bool, StoreError>;
}

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    File,
}

impl StoreBackend {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Some(Self::Memory),
            "file" | "json" => Some(Self::File),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Directory holding one JSON document per graph (file backend only).
    pub data_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::File,
            data_dir: PathBuf::from("./graphs"),
        }
    }
}

/// Open the configured store. A file store that cannot be read is an error;
/// callers are expected to stop rather than serve a broken store.
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn GraphStore>, StoreError> {
    match config.backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreBackend::File => Ok(Arc::new(FileStore::open(&config.data_dir).await?)),
    }
}

/// Newest first; ties broken by id so listings are stable.
pub(crate) fn sort_for_listing(graphs: &mut [Graph]) {
    graphs.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}
