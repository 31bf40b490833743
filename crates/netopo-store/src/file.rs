//! JSON document store on the local filesystem.
//!
//! Layout: `<dir>/<graph id>.json`, one pretty-printed document per graph.
//! All documents are read into an index at open; reads are served from the
//! index and writes go to disk first (temp file + rename) and to the index
//! second, so a failed write leaves both untouched. Writers are serialized
//! so the index always matches what is on disk.
//!
//! A document's file stem must equal its `_id`; a mismatch fails the open.

use async_trait::async_trait;
use netopo_core::{Graph, GraphId, Mode};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{sort_for_listing, GraphStore, StoreError};

const DOCUMENT_EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "tmp";

pub struct FileStore {
    dir: PathBuf,
    index: RwLock<BTreeMap<GraphId, Graph>>,
    /// Held across each disk write and the index update that follows it.
    writer: Mutex<()>,
}

impl FileStore {
    /// Open (creating if needed) a store directory and load every document.
    pub async fn open(dir: &Path) -> Result<Self, StoreError> {
        tokio::fs::create_dir_all(dir).await.map_err(|source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut index = BTreeMap::new();
        let mut entries = tokio::fs::read_dir(dir).await.map_err(|source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        loop {
            let entry = entries.next_entry().await.map_err(|source| StoreError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let Some(entry) = entry else {
                break;
            };
            let path = entry.path();
            match path.extension().and_then(|e| e.to_str()) {
                Some(DOCUMENT_EXTENSION) => {}
                Some(TEMP_EXTENSION) => {
                    tracing::warn!(path = %path.display(), "ignoring leftover temp file");
                    continue;
                }
                _ => continue,
            }

            let bytes = tokio::fs::read(&path).await.map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            let graph: Graph = serde_json::from_slice(&bytes).map_err(|source| {
                StoreError::Corrupt {
                    path: path.clone(),
                    source,
                }
            })?;
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            if stem != graph.id {
                return Err(StoreError::Misplaced {
                    path: path.clone(),
                    id: graph.id,
                });
            }
            index.insert(graph.id.clone(), graph);
        }

        tracing::info!(dir = %dir.display(), graphs = index.len(), "opened graph store");
        Ok(Self {
            dir: dir.to_path_buf(),
            index: RwLock::new(index),
            writer: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn document_path(&self, id: &str) -> Result<PathBuf, StoreError> {
        if !is_safe_id(id) {
            return Err(StoreError::Io {
                path: self.dir.join(id),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "graph id is not a valid file name",
                ),
            });
        }
        Ok(self.dir.join(format!("{id}.{DOCUMENT_EXTENSION}")))
    }

    async fn write_document(&self, graph: &Graph) -> Result<(), StoreError> {
        let path = self.document_path(&graph.id)?;
        let bytes = serde_json::to_vec_pretty(graph).map_err(|source| StoreError::Encode {
            id: graph.id.clone(),
            source,
        })?;

        let temp = self
            .dir
            .join(format!("{}.{}.{TEMP_EXTENSION}", graph.id, Uuid::new_v4().simple()));
        tokio::fs::write(&temp, &bytes).await.map_err(|source| StoreError::Io {
            path: temp.clone(),
            source,
        })?;
        if let Err(source) = tokio::fs::rename(&temp, &path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(StoreError::Io { path, source });
        }
        Ok(())
    }
}

fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[async_trait]
impl GraphStore for FileStore {
    async fn insert(&self, graph: Graph) -> Result<(), StoreError> {
        let _writer = self.writer.lock().await;
        self.write_document(&graph).await?;
        self.index.write().insert(graph.id.clone(), graph);
        Ok(())
    }

    async fn list(&self, mode: Option<Mode>) -> Result<Vec<Graph>, StoreError> {
        let mut graphs: Vec<Graph> = self
            .index
            .read()
            .values()
            .filter(|g| mode.map_or(true, |m| g.mode() == m))
            .cloned()
            .collect();
        sort_for_listing(&mut graphs);
        Ok(graphs)
    }

    async fn get(&self, id: &str) -> Result<Option<Graph>, StoreError> {
        Ok(self.index.read().get(id).cloned())
    }

    async fn replace(&self, graph: Graph) -> Result<(), StoreError> {
        let _writer = self.writer.lock().await;
        if !self.index.read().contains_key(&graph.id) {
            return Err(StoreError::NotFound(graph.id));
        }
        self.write_document(&graph).await?;
        self.index.write().insert(graph.id.clone(), graph);
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let _writer = self.writer.lock().await;
        if !self.index.read().contains_key(id) {
            return Ok(false);
        }
        let path = self.document_path(id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => return Err(StoreError::Io { path, source }),
        }
        Ok(self.index.write().remove(id).is_some())
    }
}
